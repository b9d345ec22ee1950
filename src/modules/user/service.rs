use log::info;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::error;
use crate::configs::Cache;
use crate::constants::SiteConfig;
use crate::notifications::Notifier;
use crate::utils::{generate_password, hash_password, Claims};

use crate::modules::profile_field::repository::ProfileFieldRepository;
use crate::modules::user::criteria;
use crate::modules::user::model::{
    CreateUserModel, CreatedUser, CustomFieldModel, CustomFieldWrite, InsertUser, NewUserRecord,
    PreferenceModel, PreferenceWrite, SearchCriterion, SearchUsersResponse, UpdateUser,
    UpdateUserModel, UpdateUserRecord,
};
use crate::modules::user::repository::UserRepository;
use crate::modules::user::schema::UserRole;
use crate::modules::user::visibility::VisibilityPolicy;

const PROFILE_FIELDS_CACHE_KEY: &str = "profile_fields";
const GENERATED_PASSWORD_LENGTH: usize = 12;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    profile_repo: Arc<dyn ProfileFieldRepository + Send + Sync>,
    cache: Arc<dyn Cache>,
    notifier: Arc<dyn Notifier>,
    site: Arc<SiteConfig>,
    policy: VisibilityPolicy,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        profile_repo: Arc<dyn ProfileFieldRepository + Send + Sync>,
        cache: Arc<dyn Cache>,
        notifier: Arc<dyn Notifier>,
        site: Arc<SiteConfig>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        let policy = VisibilityPolicy::new(site.hidden_user_fields.clone());
        UserService { repo, profile_repo, cache, notifier, site, policy }
    }

    /// Registered profile-field short names, resolved to ids. Needed on
    /// every search, so the map is cached with a TTL.
    async fn profile_field_ids(&self) -> Result<HashMap<String, i64>, error::SystemError> {
        if let Some(raw) = self.cache.get(PROFILE_FIELDS_CACHE_KEY).await? {
            if let Ok(map) = serde_json::from_str::<HashMap<String, i64>>(&raw) {
                return Ok(map);
            }
        }
        let fields = self.profile_repo.list_fields().await?;
        let map: HashMap<String, i64> =
            fields.into_iter().map(|field| (field.shortname, field.id)).collect();
        self.cache
            .set(
                PROFILE_FIELDS_CACHE_KEY,
                &serde_json::to_string(&map)?,
                self.site.profile_fields_cache_ttl,
            )
            .await?;
        Ok(map)
    }

    pub async fn search_users(
        &self,
        actor: &Claims,
        criteria: Vec<SearchCriterion>,
    ) -> Result<SearchUsersResponse, error::SystemError> {
        let profile_fields = self.profile_field_ids().await?;
        let outcome = criteria::build_filter(&criteria, &profile_fields)?;

        let entities = self.repo.search(&outcome.filter).await?;

        let mut users = Vec::new();
        for entity in entities {
            let custom = self.profile_repo.data_for_user(entity.id).await?;
            let details = self.policy.visible_details(&actor.role, &entity, &custom);

            // A record only comes back if the actor can see every fixed
            // field that was searched; otherwise the search would leak
            // attributes past the field-level permissions.
            if outcome.searched_fixed.iter().all(|field| details.has(field.key())) {
                users.push(details);
            } else {
                log::debug!("user {} dropped from search results", entity.id);
            }
        }

        Ok(SearchUsersResponse { users, warnings: outcome.warnings })
    }

    pub async fn create_users(
        &self,
        actor: &Claims,
        users: Vec<CreateUserModel>,
    ) -> Result<Vec<CreatedUser>, error::SystemError> {
        self.require_admin(actor, "create users")?;
        let profile_fields = self.profile_field_ids().await?;

        let mut records = Vec::with_capacity(users.len());
        let mut generated_passwords = Vec::with_capacity(users.len());

        for user in &users {
            if self.repo.username_taken(&user.username, None).await? {
                return Err(error::SystemError::already_exists(format!(
                    "Username already exists: {}",
                    user.username
                )));
            }

            let auth = user.auth.clone().unwrap_or_else(|| "manual".to_string());
            let lang = user.lang.clone().unwrap_or_else(|| self.site.default_lang.clone());
            let calendartype = user
                .calendartype
                .clone()
                .unwrap_or_else(|| self.site.default_calendar_type.clone());
            self.check_registries(&auth, &lang, &calendartype, user.theme.as_deref())?;

            if !self.site.allow_accounts_same_email
                && self.repo.email_taken(&user.email, None).await?
            {
                return Err(error::SystemError::already_exists(format!(
                    "Email address already exists: {}",
                    user.email
                )));
            }

            let create_password = user.createpassword.unwrap_or(false);
            let (password_hash, plain) = match (&user.password, create_password) {
                (Some(password), _) => (hash_password(password)?, None),
                (None, true) => {
                    let password = generate_password(GENERATED_PASSWORD_LENGTH);
                    (hash_password(&password)?, Some(password))
                }
                (None, false) => {
                    return Err(error::SystemError::bad_request(
                        "Invalid password: you must provide a password, or set createpassword",
                    ));
                }
            };

            let mut preferences = preference_writes(&user.preferences);
            if create_password {
                preferences.push(PreferenceWrite {
                    name: "auth_forcepasswordchange".to_string(),
                    value: "1".to_string(),
                });
            }

            records.push(NewUserRecord {
                user: InsertUser {
                    username: user.username.clone(),
                    email: user.email.clone(),
                    hash_password: password_hash,
                    auth,
                    idnumber: user.idnumber.clone().unwrap_or_default(),
                    firstname: user.firstname.clone(),
                    lastname: user.lastname.clone(),
                    lang,
                    calendartype,
                    theme: user.theme.clone(),
                    timezone: user.timezone.clone(),
                    description: user.description.clone(),
                    city: user.city.clone(),
                    country: user.country.clone(),
                    institution: user.institution.clone(),
                    department: user.department.clone(),
                    phone1: user.phone1.clone(),
                    phone2: user.phone2.clone(),
                    address: user.address.clone(),
                    url: user.url.clone(),
                },
                custom_fields: resolve_custom_fields(&user.customfields, &profile_fields),
                preferences,
            });
            generated_passwords.push(plain);
        }

        let created = self.repo.create_batch(&records).await?;

        for (index, user) in created.iter().enumerate() {
            if let Some(password) = generated_passwords.get(index).and_then(|p| p.as_deref()) {
                self.notifier.new_password(user.id, &records[index].user.email, password).await;
            }
            self.notifier.user_created(user.id, &user.username).await;
            info!("user {} ({}) created", user.id, user.username);
        }

        Ok(created)
    }

    pub async fn update_users(
        &self,
        actor: &Claims,
        users: Vec<UpdateUserModel>,
    ) -> Result<(), error::SystemError> {
        self.require_admin(actor, "update users")?;
        let profile_fields = self.profile_field_ids().await?;

        let mut records = Vec::with_capacity(users.len());
        for user in &users {
            if self.repo.find_by_id(user.id).await?.is_none() {
                return Err(error::SystemError::not_found(format!(
                    "User not found: {}",
                    user.id
                )));
            }

            if let Some(username) = &user.username {
                if self.repo.username_taken(username, Some(user.id)).await? {
                    return Err(error::SystemError::already_exists(format!(
                        "Username already exists: {username}"
                    )));
                }
            }
            if let Some(email) = &user.email {
                if !self.site.allow_accounts_same_email
                    && self.repo.email_taken(email, Some(user.id)).await?
                {
                    return Err(error::SystemError::already_exists(format!(
                        "Email address already exists: {email}"
                    )));
                }
            }
            if let Some(auth) = &user.auth {
                if !self.site.auth_methods.contains(auth) {
                    return Err(error::SystemError::bad_request(format!(
                        "Invalid authentication type: {auth}"
                    )));
                }
            }
            if let Some(lang) = &user.lang {
                if !self.site.languages.contains(lang) {
                    return Err(error::SystemError::bad_request(format!(
                        "Invalid language code: {lang}"
                    )));
                }
            }
            if let Some(calendartype) = &user.calendartype {
                if !self.site.calendar_types.contains(calendartype) {
                    return Err(error::SystemError::bad_request(format!(
                        "Invalid calendar type: {calendartype}"
                    )));
                }
            }
            if let Some(theme) = &user.theme {
                if !self.site.themes.contains(theme) {
                    return Err(error::SystemError::bad_request(format!(
                        "Invalid theme: {theme}"
                    )));
                }
            }

            let password_hash =
                user.password.as_deref().map(hash_password).transpose()?;

            records.push(UpdateUserRecord {
                user: UpdateUser {
                    id: user.id,
                    username: user.username.clone(),
                    email: user.email.clone(),
                    hash_password: password_hash,
                    auth: user.auth.clone(),
                    idnumber: user.idnumber.clone(),
                    firstname: user.firstname.clone(),
                    lastname: user.lastname.clone(),
                    lang: user.lang.clone(),
                    calendartype: user.calendartype.clone(),
                    theme: user.theme.clone(),
                    timezone: user.timezone.clone(),
                    description: user.description.clone(),
                    city: user.city.clone(),
                    country: user.country.clone(),
                    institution: user.institution.clone(),
                    department: user.department.clone(),
                    phone1: user.phone1.clone(),
                    phone2: user.phone2.clone(),
                    address: user.address.clone(),
                    url: user.url.clone(),
                },
                custom_fields: resolve_custom_fields(&user.customfields, &profile_fields),
                preferences: preference_writes(&user.preferences),
            });
        }

        self.repo.update_batch(&records).await?;

        for user in &users {
            self.notifier.user_updated(user.id).await;
            info!("user {} updated", user.id);
        }

        Ok(())
    }

    fn require_admin(&self, actor: &Claims, action: &str) -> Result<(), error::SystemError> {
        if actor.role != UserRole::Admin {
            return Err(error::SystemError::forbidden(format!("No permission to {action}")));
        }
        Ok(())
    }

    fn check_registries(
        &self,
        auth: &str,
        lang: &str,
        calendartype: &str,
        theme: Option<&str>,
    ) -> Result<(), error::SystemError> {
        if !self.site.auth_methods.contains(auth) {
            return Err(error::SystemError::bad_request(format!(
                "Invalid authentication type: {auth}"
            )));
        }
        if !self.site.languages.contains(lang) {
            return Err(error::SystemError::bad_request(format!("Invalid language code: {lang}")));
        }
        if !self.site.calendar_types.contains(calendartype) {
            return Err(error::SystemError::bad_request(format!(
                "Invalid calendar type: {calendartype}"
            )));
        }
        if let Some(theme) = theme {
            if !self.site.themes.contains(theme) {
                return Err(error::SystemError::bad_request(format!("Invalid theme: {theme}")));
            }
        }
        Ok(())
    }
}

fn resolve_custom_fields(
    models: &Option<Vec<CustomFieldModel>>,
    profile_fields: &HashMap<String, i64>,
) -> Vec<CustomFieldWrite> {
    models
        .iter()
        .flatten()
        .filter_map(|field| match profile_fields.get(&field.name) {
            Some(&field_id) => Some(CustomFieldWrite { field_id, value: field.value.clone() }),
            None => {
                log::debug!("skipping unknown profile field '{}'", field.name);
                None
            }
        })
        .collect()
}

fn preference_writes(models: &Option<Vec<PreferenceModel>>) -> Vec<PreferenceWrite> {
    models
        .iter()
        .flatten()
        .map(|preference| PreferenceWrite {
            name: preference.name.clone(),
            value: preference.value.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::SystemError;
    use crate::test::{fixtures, mocks};
    use std::sync::Arc;

    fn criterion(key: &str, value: &str) -> SearchCriterion {
        SearchCriterion { key: key.to_string(), value: value.to_string() }
    }

    fn service_with(
        repo: mocks::MockUserRepository,
        profile_repo: mocks::MockProfileFieldRepository,
        notifier: Arc<mocks::MockNotifier>,
    ) -> UserService {
        UserService::with_dependencies(
            Arc::new(repo),
            Arc::new(profile_repo),
            Arc::new(mocks::MockCache::default()),
            notifier,
            Arc::new(fixtures::site()),
        )
    }

    fn create_model(username: &str) -> CreateUserModel {
        CreateUserModel {
            username: username.to_string(),
            password: Some("secret123".to_string()),
            createpassword: None,
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            email: format!("{username}@example.com"),
            auth: None,
            idnumber: None,
            lang: None,
            calendartype: None,
            theme: None,
            timezone: None,
            description: None,
            country: None,
            city: None,
            institution: None,
            department: None,
            phone1: None,
            phone2: None,
            address: None,
            url: None,
            customfields: None,
            preferences: None,
        }
    }

    fn update_model(id: i64) -> UpdateUserModel {
        UpdateUserModel {
            id,
            username: None,
            password: None,
            firstname: None,
            lastname: None,
            email: None,
            auth: None,
            idnumber: None,
            lang: None,
            calendartype: None,
            theme: None,
            timezone: None,
            description: None,
            country: None,
            city: None,
            institution: None,
            department: None,
            phone1: None,
            phone2: None,
            address: None,
            url: None,
            customfields: None,
            preferences: None,
        }
    }

    #[actix_web::test]
    async fn search_drops_records_when_a_searched_field_is_hidden() {
        // The site config hides `email` from plain actors.
        let repo =
            mocks::MockUserRepository { users: vec![fixtures::user(1, "jdoe")], ..Default::default() };
        let service =
            service_with(repo, mocks::MockProfileFieldRepository::default(), Arc::new(mocks::MockNotifier::default()));

        let response = service
            .search_users(&fixtures::claims(UserRole::User), vec![criterion("email", "jdoe@example.com")])
            .await
            .unwrap();

        assert!(response.users.is_empty());
        assert!(response.warnings.is_empty());
    }

    #[actix_web::test]
    async fn admin_search_keeps_records_with_hidden_fields() {
        let repo =
            mocks::MockUserRepository { users: vec![fixtures::user(1, "jdoe")], ..Default::default() };
        let service =
            service_with(repo, mocks::MockProfileFieldRepository::default(), Arc::new(mocks::MockNotifier::default()));

        let response = service
            .search_users(&fixtures::claims(UserRole::Admin), vec![criterion("email", "jdoe@example.com")])
            .await
            .unwrap();

        assert_eq!(response.users.len(), 1);
        assert!(response.users[0].has("email"));
    }

    #[actix_web::test]
    async fn search_by_visible_field_returns_the_filtered_view() {
        let repo =
            mocks::MockUserRepository { users: vec![fixtures::user(1, "jdoe")], ..Default::default() };
        let service =
            service_with(repo, mocks::MockProfileFieldRepository::default(), Arc::new(mocks::MockNotifier::default()));

        let response = service
            .search_users(&fixtures::claims(UserRole::User), vec![criterion("username", "jdoe")])
            .await
            .unwrap();

        assert_eq!(response.users.len(), 1);
        assert!(!response.users[0].has("email"));
        assert!(response.users[0].has("username"));
    }

    #[actix_web::test]
    async fn custom_field_criteria_are_exempt_from_the_visibility_check() {
        let repo =
            mocks::MockUserRepository { users: vec![fixtures::user(1, "jdoe")], ..Default::default() };
        let profile_repo = mocks::MockProfileFieldRepository::with_fields(&[("branch", 7)]);
        let service = service_with(repo, profile_repo, Arc::new(mocks::MockNotifier::default()));

        let response = service
            .search_users(
                &fixtures::claims(UserRole::User),
                vec![criterion("profile_field_branch", "London")],
            )
            .await
            .unwrap();

        assert_eq!(response.users.len(), 1);
    }

    #[actix_web::test]
    async fn unknown_keys_surface_as_warnings() {
        let service = service_with(
            mocks::MockUserRepository::default(),
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let response = service
            .search_users(&fixtures::claims(UserRole::Admin), vec![criterion("shoesize", "44")])
            .await
            .unwrap();

        assert_eq!(response.warnings.len(), 1);
        assert_eq!(response.warnings[0].warningcode, "invalidfieldparameter");
    }

    #[actix_web::test]
    async fn duplicate_criteria_key_fails_the_call() {
        let service = service_with(
            mocks::MockUserRepository::default(),
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let result = service
            .search_users(
                &fixtures::claims(UserRole::Admin),
                vec![criterion("username", "a"), criterion("username", "b")],
            )
            .await;

        assert!(matches!(result, Err(SystemError::DuplicateCriteriaKey(_))));
    }

    #[actix_web::test]
    async fn profile_field_names_are_cached_between_searches() {
        let repo = mocks::MockUserRepository::default();
        let profile_repo = mocks::MockProfileFieldRepository::with_fields(&[("branch", 7)]);
        let list_calls = profile_repo.list_calls.clone();
        let service = service_with(repo, profile_repo, Arc::new(mocks::MockNotifier::default()));
        let actor = fixtures::claims(UserRole::Admin);

        service.search_users(&actor, vec![]).await.unwrap();
        service.search_users(&actor, vec![]).await.unwrap();

        assert_eq!(*list_calls.lock().unwrap(), 1);
    }

    #[actix_web::test]
    async fn create_requires_admin() {
        let service = service_with(
            mocks::MockUserRepository::default(),
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let result =
            service.create_users(&fixtures::claims(UserRole::User), vec![create_model("jdoe")]).await;

        assert!(matches!(result, Err(SystemError::Forbidden(_))));
    }

    #[actix_web::test]
    async fn create_returns_ids_and_dispatches_events() {
        let notifier = Arc::new(mocks::MockNotifier::default());
        let service = service_with(
            mocks::MockUserRepository::default(),
            mocks::MockProfileFieldRepository::default(),
            notifier.clone(),
        );

        let created = service
            .create_users(&fixtures::claims(UserRole::Admin), vec![create_model("jdoe")])
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].username, "jdoe");
        assert!(notifier.events.lock().unwrap().contains(&format!("user_created:{}", created[0].id)));
    }

    #[actix_web::test]
    async fn create_with_createpassword_queues_delivery_and_forces_change() {
        let notifier = Arc::new(mocks::MockNotifier::default());
        let repo = mocks::MockUserRepository::default();
        let created_preferences = repo.created_preferences.clone();
        let service =
            service_with(repo, mocks::MockProfileFieldRepository::default(), notifier.clone());

        let mut model = create_model("jdoe");
        model.password = None;
        model.createpassword = Some(true);

        service.create_users(&fixtures::claims(UserRole::Admin), vec![model]).await.unwrap();

        assert!(notifier.events.lock().unwrap().iter().any(|e| e.starts_with("new_password:")));
        assert!(created_preferences
            .lock()
            .unwrap()
            .contains(&"auth_forcepasswordchange".to_string()));
    }

    #[actix_web::test]
    async fn create_without_password_or_createpassword_is_rejected() {
        let service = service_with(
            mocks::MockUserRepository::default(),
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let mut model = create_model("jdoe");
        model.password = None;

        let result = service.create_users(&fixtures::claims(UserRole::Admin), vec![model]).await;

        assert!(matches!(result, Err(SystemError::BadRequest(_))));
    }

    #[actix_web::test]
    async fn create_rejects_taken_username() {
        let repo = mocks::MockUserRepository {
            taken_usernames: vec!["jdoe".to_string()],
            ..Default::default()
        };
        let service = service_with(
            repo,
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let result =
            service.create_users(&fixtures::claims(UserRole::Admin), vec![create_model("jdoe")]).await;

        assert!(matches!(result, Err(SystemError::AlreadyExists(_))));
    }

    #[actix_web::test]
    async fn create_rejects_taken_email() {
        let repo = mocks::MockUserRepository {
            taken_emails: vec!["jdoe@example.com".to_string()],
            ..Default::default()
        };
        let service = service_with(
            repo,
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let result =
            service.create_users(&fixtures::claims(UserRole::Admin), vec![create_model("jdoe")]).await;

        assert!(matches!(result, Err(SystemError::AlreadyExists(_))));
    }

    #[actix_web::test]
    async fn create_rejects_unregistered_auth_and_lang() {
        let service = service_with(
            mocks::MockUserRepository::default(),
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );
        let admin = fixtures::claims(UserRole::Admin);

        let mut bad_auth = create_model("jdoe");
        bad_auth.auth = Some("telepathy".to_string());
        assert!(matches!(
            service.create_users(&admin, vec![bad_auth]).await,
            Err(SystemError::BadRequest(_))
        ));

        let mut bad_lang = create_model("jdoe");
        bad_lang.lang = Some("xx".to_string());
        assert!(matches!(
            service.create_users(&admin, vec![bad_lang]).await,
            Err(SystemError::BadRequest(_))
        ));
    }

    #[actix_web::test]
    async fn create_resolves_known_custom_fields_and_skips_unknown() {
        let repo = mocks::MockUserRepository::default();
        let created_custom_fields = repo.created_custom_fields.clone();
        let profile_repo = mocks::MockProfileFieldRepository::with_fields(&[("branch", 7)]);
        let service =
            service_with(repo, profile_repo, Arc::new(mocks::MockNotifier::default()));

        let mut model = create_model("jdoe");
        model.customfields = Some(vec![
            CustomFieldModel { name: "branch".to_string(), value: "London".to_string() },
            CustomFieldModel { name: "unknown".to_string(), value: "x".to_string() },
        ]);

        service.create_users(&fixtures::claims(UserRole::Admin), vec![model]).await.unwrap();

        assert_eq!(*created_custom_fields.lock().unwrap(), vec![7]);
    }

    #[actix_web::test]
    async fn update_requires_an_existing_user() {
        let service = service_with(
            mocks::MockUserRepository::default(),
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let result =
            service.update_users(&fixtures::claims(UserRole::Admin), vec![update_model(404)]).await;

        assert!(matches!(result, Err(SystemError::NotFound(_))));
    }

    #[actix_web::test]
    async fn update_dispatches_events_per_user() {
        let notifier = Arc::new(mocks::MockNotifier::default());
        let repo = mocks::MockUserRepository {
            users: vec![fixtures::user(1, "jdoe")],
            ..Default::default()
        };
        let service =
            service_with(repo, mocks::MockProfileFieldRepository::default(), notifier.clone());

        let mut model = update_model(1);
        model.firstname = Some("Joan".to_string());
        service.update_users(&fixtures::claims(UserRole::Admin), vec![model]).await.unwrap();

        assert!(notifier.events.lock().unwrap().contains(&"user_updated:1".to_string()));
    }

    #[actix_web::test]
    async fn update_rejects_email_taken_by_another_account() {
        let repo = mocks::MockUserRepository {
            users: vec![fixtures::user(1, "jdoe")],
            taken_emails: vec!["other@example.com".to_string()],
            ..Default::default()
        };
        let service = service_with(
            repo,
            mocks::MockProfileFieldRepository::default(),
            Arc::new(mocks::MockNotifier::default()),
        );

        let mut model = update_model(1);
        model.email = Some("other@example.com".to_string());
        let result = service.update_users(&fixtures::claims(UserRole::Admin), vec![model]).await;

        assert!(matches!(result, Err(SystemError::AlreadyExists(_))));
    }
}
