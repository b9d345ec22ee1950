use std::collections::HashSet;

use serde_json::{json, Value};

use crate::modules::profile_field::schema::ProfileDataRow;
use crate::modules::user::model::UserDetails;
use crate::modules::user::schema::{UserEntity, UserRole};

/// Fields every actor may see regardless of the hidden list.
const ALWAYS_VISIBLE: [&str; 4] = ["id", "username", "firstname", "lastname"];

/// Per-field access control for account detail views. Admin actors see the
/// full record; everyone else gets the record minus the site's hidden set.
#[derive(Debug, Clone)]
pub struct VisibilityPolicy {
    hidden: HashSet<String>,
}

impl VisibilityPolicy {
    pub fn new(hidden: HashSet<String>) -> Self {
        VisibilityPolicy { hidden }
    }

    fn visible(&self, role: &UserRole, key: &str) -> bool {
        matches!(role, UserRole::Admin)
            || ALWAYS_VISIBLE.contains(&key)
            || !self.hidden.contains(key)
    }

    /// Build the detail view of `user` as seen by an actor with `role`.
    /// Optional columns that are unset stay out of the view entirely.
    pub fn visible_details(
        &self,
        role: &UserRole,
        user: &UserEntity,
        custom: &[ProfileDataRow],
    ) -> UserDetails {
        let mut details = UserDetails::default();

        let mut put = |key: &str, value: Value| {
            if self.visible(role, key) {
                details.insert(key, value);
            }
        };

        put("id", json!(user.id));
        put("username", json!(user.username));
        put("idnumber", json!(user.idnumber));
        put("firstname", json!(user.firstname));
        put("lastname", json!(user.lastname));
        put("email", json!(user.email));
        put("auth", json!(user.auth));
        put("lang", json!(user.lang));
        put("calendartype", json!(user.calendartype));
        put("confirmed", json!(user.confirmed));

        let optional = [
            ("theme", &user.theme),
            ("timezone", &user.timezone),
            ("description", &user.description),
            ("city", &user.city),
            ("country", &user.country),
            ("institution", &user.institution),
            ("department", &user.department),
            ("phone1", &user.phone1),
            ("phone2", &user.phone2),
            ("address", &user.address),
            ("url", &user.url),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                put(key, json!(value));
            }
        }

        if !custom.is_empty() && self.visible(role, "customfields") {
            let customfields: Vec<Value> = custom
                .iter()
                .map(|row| json!({ "name": row.shortname, "value": row.value }))
                .collect();
            details.insert("customfields", Value::Array(customfields));
        }

        details
    }
}
