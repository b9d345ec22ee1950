use sqlx::prelude::FromRow;

#[allow(unused)]
#[derive(Debug, Clone, FromRow)]
pub struct CohortEntity {
    pub id: i64,
    pub name: String,
    pub idnumber: String,
    pub description: Option<String>,
    pub visible: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
