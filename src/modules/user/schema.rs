use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};

#[derive(Debug, PartialEq, Clone, Type, Serialize, Deserialize)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum UserRole {
    #[sqlx(rename = "ADMIN")]
    Admin,
    #[sqlx(rename = "USER")]
    User,
}

#[allow(unused)]
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub hash_password: String,
    pub auth: String,
    pub idnumber: String,
    pub firstname: String,
    pub lastname: String,
    pub lang: String,
    pub calendartype: String,
    pub theme: Option<String>,
    pub timezone: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    pub confirmed: bool,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
