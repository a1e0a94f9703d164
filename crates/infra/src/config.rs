//! Environment-driven configuration for the PostgreSQL store and migrations.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `DATABASE_URL` | required | PostgreSQL connection string |
//! | `RETAIL_DB_MAX_CONNECTIONS` | `5` | pool size |
//! | `RETAIL_DB_ACQUIRE_TIMEOUT_SECS` | `5` | pool acquisition timeout |
//! | `RETAIL_USER_TABLE` | `users` | table holding the users orders belong to |
//! | `RETAIL_USER_KEY` | `id` | UUID primary key column of that table |

use std::time::Duration;

use thiserror::Error;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS: &str = "RETAIL_DB_MAX_CONNECTIONS";
pub const ACQUIRE_TIMEOUT_SECS: &str = "RETAIL_DB_ACQUIRE_TIMEOUT_SECS";
pub const USER_TABLE: &str = "RETAIL_USER_TABLE";
pub const USER_KEY: &str = "RETAIL_USER_KEY";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// PostgreSQL identifiers are truncated past this many bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Which external table orders reference as their owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    /// Table name, optionally schema-qualified (`auth.users`).
    pub user_table: String,
    /// UUID key column in `user_table`.
    pub user_key: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            user_table: "users".to_string(),
            user_key: "id".to_string(),
        }
    }
}

impl SchemaConfig {
    pub fn new(
        user_table: impl Into<String>,
        user_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let user_table = user_table.into();
        let user_key = user_key.into();
        validate_identifier(USER_TABLE, &user_table, true)?;
        validate_identifier(USER_KEY, &user_key, false)?;
        Ok(Self {
            user_table,
            user_key,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Self::new(
            lookup(USER_TABLE).unwrap_or(defaults.user_table),
            lookup(USER_KEY).unwrap_or(defaults.user_key),
        )
    }
}

/// Connection settings for [`PostgresStore`](crate::PostgresStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub schema: SchemaConfig,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            schema: SchemaConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL))?;

        let max_connections = match lookup(MAX_CONNECTIONS) {
            Some(raw) => parse_number::<u32>(MAX_CONNECTIONS, &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: MAX_CONNECTIONS,
                reason: "must be at least 1".to_string(),
            });
        }

        let acquire_timeout = match lookup(ACQUIRE_TIMEOUT_SECS) {
            Some(raw) => parse_number::<u64>(ACQUIRE_TIMEOUT_SECS, &raw)?,
            None => DEFAULT_ACQUIRE_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout),
            schema: SchemaConfig::from_lookup(&lookup)?,
        })
    }
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("'{raw}': {e}"),
    })
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`, plus one `schema.` prefix when `qualified`.
/// Identifiers are interpolated into DDL, so nothing else gets through.
fn validate_identifier(name: &'static str, value: &str, qualified: bool) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name,
        reason: format!("'{value}' {reason}"),
    };

    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() > 2 || (parts.len() == 2 && !qualified) {
        return Err(invalid("has too many qualifiers"));
    }
    for part in parts {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(invalid("must start with a letter or underscore")),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("may only contain letters, digits and underscores"));
        }
        if part.len() > MAX_IDENTIFIER_LEN {
            return Err(invalid("is longer than 63 bytes"));
        }
    }
    Ok(())
}
