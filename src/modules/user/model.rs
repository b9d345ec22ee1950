use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchCriterion {
    #[validate(length(min = 1, message = "Criterion key cannot be empty"))]
    pub key: String,
    #[validate(length(min = 1, message = "Criterion value cannot be empty"))]
    pub value: String,
}

#[derive(Deserialize, Validate)]
pub struct SearchUsersModel {
    #[validate(nested)]
    pub criteria: Vec<SearchCriterion>,
}

/// Non-fatal diagnostic returned alongside successful search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchWarning {
    pub item: String,
    pub warningcode: String,
    pub message: String,
}

impl SearchWarning {
    pub fn invalid_field(key: &str) -> Self {
        SearchWarning {
            item: key.to_string(),
            warningcode: "invalidfieldparameter".to_string(),
            message: format!(
                "The search key '{key}' is not supported, look at the web service documentation"
            ),
        }
    }
}

/// The actor-visible view of one account: a flat field map so callers see
/// exactly what the visibility policy let through, nothing more.
#[derive(Debug, Default, Serialize)]
pub struct UserDetails {
    #[serde(flatten)]
    fields: serde_json::Map<String, Value>,
}

impl UserDetails {
    pub fn insert(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    /// A field counts as visible only when present and non-empty.
    pub fn has(&self, key: &str) -> bool {
        match self.fields.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

#[derive(Serialize)]
pub struct SearchUsersResponse {
    pub users: Vec<UserDetails>,
    pub warnings: Vec<SearchWarning>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CustomFieldModel {
    #[validate(length(min = 1, message = "Custom field name cannot be empty"))]
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PreferenceModel {
    #[validate(length(min = 1, message = "Preference name cannot be empty"))]
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateUserModel {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
    /// Generate a password and queue it for delivery instead of taking one.
    pub createpassword: Option<bool>,
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub firstname: String,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub lastname: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub auth: Option<String>,
    pub idnumber: Option<String>,
    pub lang: Option<String>,
    pub calendartype: Option<String>,
    pub theme: Option<String>,
    pub timezone: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 2, max = 2, message = "Country must be a two-letter code"))]
    pub country: Option<String>,
    pub city: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    #[validate(nested)]
    pub customfields: Option<Vec<CustomFieldModel>>,
    #[validate(nested)]
    pub preferences: Option<Vec<PreferenceModel>>,
}

#[derive(Deserialize, Validate)]
pub struct CreateUsersModel {
    #[validate(length(min = 1, message = "At least one user is required"), nested)]
    pub users: Vec<CreateUserModel>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct UpdateUserModel {
    pub id: i64,
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub firstname: Option<String>,
    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub lastname: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub auth: Option<String>,
    pub idnumber: Option<String>,
    pub lang: Option<String>,
    pub calendartype: Option<String>,
    pub theme: Option<String>,
    pub timezone: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 2, max = 2, message = "Country must be a two-letter code"))]
    pub country: Option<String>,
    pub city: Option<String>,
    pub institution: Option<String>,
    pub department: Option<String>,
    pub phone1: Option<String>,
    pub phone2: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    #[validate(nested)]
    pub customfields: Option<Vec<CustomFieldModel>>,
    #[validate(nested)]
    pub preferences: Option<Vec<PreferenceModel>>,
}

#[derive(Deserialize, Validate)]
pub struct UpdateUsersModel {
    #[validate(length(min = 1, message = "At least one user is required"), nested)]
    pub users: Vec<UpdateUserModel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedUser {
    pub id: i64,
    pub username: String,
}

pub struct InsertUser {
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
}

pub struct CustomFieldWrite {
    pub field_id: i64,
    pub value: String,
}

pub struct PreferenceWrite {
    pub name: String,
    pub value: String,
}

/// One account creation, written in a single transaction with its profile
/// data and preferences.
pub struct NewUserRecord {
    pub user: InsertUser,
    pub custom_fields: Vec<CustomFieldWrite>,
    pub preferences: Vec<PreferenceWrite>,
}

pub struct UpdateUser {
    pub id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
    pub hash_password: Option<String>,
    pub auth: Option<String>,
    pub idnumber: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub lang: Option<String>,
    pub calendartype: Option<String>,
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
}

pub struct UpdateUserRecord {
    pub user: UpdateUser,
    pub custom_fields: Vec<CustomFieldWrite>,
    pub preferences: Vec<PreferenceWrite>,
}
