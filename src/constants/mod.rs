use std::collections::HashSet;

pub struct Env {
    pub jwt_secret: String,
    pub database_url: String,
    pub redis_url: String,
    pub frontend_url: String,
    pub ip: String,
    pub port: u16,
    pub site: SiteConfig,
}

/// Site-level settings the host platform would normally own: registries of
/// installed auth methods / languages / themes / calendar types, the hidden
/// field list applied to non-admin actors, and account defaults.
#[derive(Clone)]
pub struct SiteConfig {
    pub auth_methods: HashSet<String>,
    pub languages: HashSet<String>,
    pub themes: HashSet<String>,
    pub calendar_types: HashSet<String>,
    pub hidden_user_fields: HashSet<String>,
    pub default_lang: String,
    pub default_calendar_type: String,
    pub allow_accounts_same_email: bool,
    pub profile_fields_cache_ttl: u64,
}

fn csv_set(var: &str, default: &str) -> HashSet<String> {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Env {
    fn new() -> Self {
        let jwt_secret = std::env::var("SECRET_KEY")
            .expect("SECRET_KEY must be set in .env file or environment variable");

        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set in .env file or environment variable");
        let redis_url = std::env::var("REDIS_URL")
            .expect("REDIS_URL must be set in .env file or environment variable");

        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let ip = std::env::var("IP").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .expect("PORT must be a valid u16 integer");

        let default_lang = std::env::var("DEFAULT_LANG").unwrap_or_else(|_| "en".to_string());
        let default_calendar_type =
            std::env::var("DEFAULT_CALENDAR_TYPE").unwrap_or_else(|_| "gregorian".to_string());
        let allow_accounts_same_email = std::env::var("ALLOW_ACCOUNTS_SAME_EMAIL")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let profile_fields_cache_ttl = std::env::var("PROFILE_FIELDS_CACHE_TTL")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .expect("PROFILE_FIELDS_CACHE_TTL must be a valid u64 integer");

        let site = SiteConfig {
            auth_methods: csv_set("AUTH_METHODS", "manual,ldap,oauth2"),
            languages: csv_set("LANGUAGES", "en"),
            themes: csv_set("THEMES", "standard"),
            calendar_types: csv_set("CALENDAR_TYPES", "gregorian"),
            hidden_user_fields: csv_set("HIDDEN_USER_FIELDS", "email,auth"),
            default_lang,
            default_calendar_type,
            allow_accounts_same_email,
            profile_fields_cache_ttl,
        };

        Env { jwt_secret, database_url, redis_url, frontend_url, ip, port, site }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
