use actix_web::{
    self, App, HttpServer,
    middleware::{Logger, from_fn},
    web,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{RedisCache, connect_database},
    middlewares::{authentication, authorization},
    modules::{
        cohort::{repository_pg::CohortRepositoryPg, service::CohortService},
        profile_field::repository_pg::ProfileFieldRepositoryPg,
        user::{repository_pg::UserRepositoryPg, schema::UserRole, service::UserService},
    },
    notifications::LogNotifier,
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
mod notifications;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;

    let redis_cache =
        RedisCache::new().await.map_err(|_| std::io::Error::other("Redis connection error"))?;

    let user_repo = UserRepositoryPg::new(db_pool.clone());
    let profile_repo = ProfileFieldRepositoryPg::new(db_pool.clone());
    let cohort_repo = CohortRepositoryPg::new(db_pool.clone());

    let user_service = UserService::with_dependencies(
        Arc::new(user_repo),
        Arc::new(profile_repo),
        Arc::new(redis_cache),
        Arc::new(LogNotifier),
        Arc::new(ENV.site.clone()),
    );
    let cohort_service = CohortService::with_dependencies(Arc::new(cohort_repo));

    println!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(cohort_service.clone()))
            .service(health_check)
            .service(
                web::scope("/api").service(
                    web::scope("")
                        .wrap(from_fn(authorization(vec![UserRole::User, UserRole::Admin])))
                        .wrap(from_fn(authentication))
                        .configure(modules::user::route::configure)
                        .configure(modules::cohort::route::configure),
                ),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
