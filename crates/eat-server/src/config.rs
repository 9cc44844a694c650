//! Server configuration from environment variables.

use std::env;

use eat_db::DbConfig;

/// Full server configuration. Every value has a default except the
/// bootstrap admin credentials, which are optional — without them no
/// initial administrator is seeded.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    /// Optional server-side pepper for password hashing.
    pub pepper: Option<String>,
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    pub bootstrap_admin_email: Option<String>,
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = DbConfig::default();
        let db = DbConfig {
            url: var("EAT_DB_URL").unwrap_or(defaults.url),
            namespace: var("EAT_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: var("EAT_DB_DATABASE").unwrap_or(defaults.database),
            username: var("EAT_DB_USERNAME").unwrap_or(defaults.username),
            password: var("EAT_DB_PASSWORD").unwrap_or(defaults.password),
        };

        Self {
            db,
            pepper: var("EAT_PASSWORD_PEPPER"),
            bootstrap_admin_username: var("EAT_ADMIN_USERNAME"),
            bootstrap_admin_password: var("EAT_ADMIN_PASSWORD"),
            bootstrap_admin_email: var("EAT_ADMIN_EMAIL"),
        }
    }
}
