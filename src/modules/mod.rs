pub mod user {
    pub mod schema;
    pub mod model;
    pub mod criteria;
    pub mod visibility;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod profile_field {
    pub mod schema;
    pub mod repository;
    pub mod repository_pg;
}

pub mod cohort {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}
