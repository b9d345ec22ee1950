#![allow(dead_code)]

pub mod fixtures {
    use std::collections::HashSet;

    use crate::constants::SiteConfig;
    use crate::modules::cohort::schema::CohortEntity;
    use crate::modules::user::schema::{UserEntity, UserRole};
    use crate::utils::Claims;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Site config used across tests: `email` and `auth` hidden from plain
    /// actors, small registries, no duplicate emails.
    pub fn site() -> SiteConfig {
        SiteConfig {
            auth_methods: set(&["manual", "ldap"]),
            languages: set(&["en", "fr"]),
            themes: set(&["standard"]),
            calendar_types: set(&["gregorian"]),
            hidden_user_fields: set(&["email", "auth"]),
            default_lang: "en".to_string(),
            default_calendar_type: "gregorian".to_string(),
            allow_accounts_same_email: false,
            profile_fields_cache_ttl: 300,
        }
    }

    pub fn claims(role: UserRole) -> Claims {
        Claims::new(1, &role, 3600)
    }

    pub fn user(id: i64, username: &str) -> UserEntity {
        let now = chrono::Utc::now();
        UserEntity {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            hash_password: "$argon2id$test".to_string(),
            auth: "manual".to_string(),
            idnumber: format!("EMP-{id}"),
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            lang: "en".to_string(),
            calendartype: "gregorian".to_string(),
            theme: None,
            timezone: None,
            description: None,
            city: None,
            country: None,
            institution: None,
            department: None,
            phone1: None,
            phone2: None,
            address: None,
            url: None,
            confirmed: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn cohort(id: i64, visible: bool) -> CohortEntity {
        let now = chrono::Utc::now();
        CohortEntity {
            id,
            name: format!("Cohort {id}"),
            idnumber: format!("C-{id}"),
            description: None,
            visible,
            created_at: now,
            updated_at: now,
        }
    }
}

pub mod mocks {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::api::error;
    use crate::configs::Cache;
    use crate::modules::cohort::{repository::CohortRepository, schema::CohortEntity};
    use crate::modules::profile_field::{
        repository::ProfileFieldRepository,
        schema::{ProfileDataRow, ProfileFieldEntity},
    };
    use crate::modules::user::{
        criteria::UserFilter,
        model::{CreatedUser, NewUserRecord, UpdateUserRecord},
        repository::UserRepository,
        schema::UserEntity,
    };
    use crate::notifications::Notifier;

    #[derive(Default)]
    pub struct MockUserRepository {
        pub users: Vec<UserEntity>,
        pub taken_usernames: Vec<String>,
        pub taken_emails: Vec<String>,
        pub created_preferences: Arc<Mutex<Vec<String>>>,
        pub created_custom_fields: Arc<Mutex<Vec<i64>>>,
        pub last_filter: Arc<Mutex<Option<UserFilter>>>,
    }

    #[async_trait::async_trait]
    impl UserRepository for MockUserRepository {
        async fn search(
            &self,
            filter: &UserFilter,
        ) -> Result<Vec<UserEntity>, error::SystemError> {
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            Ok(self.users.clone())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, error::SystemError> {
            Ok(self.users.iter().find(|user| user.id == id).cloned())
        }

        async fn username_taken(
            &self,
            username: &str,
            _exclude_id: Option<i64>,
        ) -> Result<bool, error::SystemError> {
            Ok(self.taken_usernames.iter().any(|taken| taken.eq_ignore_ascii_case(username)))
        }

        async fn email_taken(
            &self,
            email: &str,
            _exclude_id: Option<i64>,
        ) -> Result<bool, error::SystemError> {
            Ok(self.taken_emails.iter().any(|taken| taken.eq_ignore_ascii_case(email)))
        }

        async fn create_batch(
            &self,
            records: &[NewUserRecord],
        ) -> Result<Vec<CreatedUser>, error::SystemError> {
            for record in records {
                self.created_preferences
                    .lock()
                    .unwrap()
                    .extend(record.preferences.iter().map(|p| p.name.clone()));
                self.created_custom_fields
                    .lock()
                    .unwrap()
                    .extend(record.custom_fields.iter().map(|f| f.field_id));
            }
            Ok(records
                .iter()
                .enumerate()
                .map(|(index, record)| CreatedUser {
                    id: index as i64 + 1,
                    username: record.user.username.clone(),
                })
                .collect())
        }

        async fn update_batch(
            &self,
            _records: &[UpdateUserRecord],
        ) -> Result<(), error::SystemError> {
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockProfileFieldRepository {
        pub fields: Vec<ProfileFieldEntity>,
        pub data: HashMap<i64, Vec<ProfileDataRow>>,
        pub list_calls: Arc<Mutex<usize>>,
    }

    impl MockProfileFieldRepository {
        pub fn with_fields(fields: &[(&str, i64)]) -> Self {
            MockProfileFieldRepository {
                fields: fields
                    .iter()
                    .map(|(shortname, id)| ProfileFieldEntity {
                        id: *id,
                        shortname: shortname.to_string(),
                        name: shortname.to_string(),
                    })
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl ProfileFieldRepository for MockProfileFieldRepository {
        async fn list_fields(&self) -> Result<Vec<ProfileFieldEntity>, error::SystemError> {
            *self.list_calls.lock().unwrap() += 1;
            Ok(self.fields.clone())
        }

        async fn data_for_user(
            &self,
            user_id: i64,
        ) -> Result<Vec<ProfileDataRow>, error::SystemError> {
            Ok(self.data.get(&user_id).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    pub struct MockCache {
        store: Mutex<HashMap<String, String>>,
    }

    #[async_trait::async_trait]
    impl Cache for MockCache {
        async fn get(&self, key: &str) -> Result<Option<String>, error::SystemError> {
            Ok(self.store.lock().unwrap().get(key).cloned())
        }

        async fn set(
            &self,
            key: &str,
            value: &str,
            _expiration: u64,
        ) -> Result<(), error::SystemError> {
            self.store.lock().unwrap().insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), error::SystemError> {
            self.store.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MockNotifier {
        pub events: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn user_created(&self, user_id: i64, _username: &str) {
            self.events.lock().unwrap().push(format!("user_created:{user_id}"));
        }

        async fn user_updated(&self, user_id: i64) {
            self.events.lock().unwrap().push(format!("user_updated:{user_id}"));
        }

        async fn new_password(&self, user_id: i64, _email: &str, _password: &str) {
            self.events.lock().unwrap().push(format!("new_password:{user_id}"));
        }
    }

    pub struct MockCohortRepository {
        pub cohorts: Vec<CohortEntity>,
    }

    #[async_trait::async_trait]
    impl CohortRepository for MockCohortRepository {
        async fn find_all(&self) -> Result<Vec<CohortEntity>, error::SystemError> {
            Ok(self.cohorts.clone())
        }

        async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<CohortEntity>, error::SystemError> {
            Ok(self.cohorts.iter().filter(|cohort| ids.contains(&cohort.id)).cloned().collect())
        }
    }
}
