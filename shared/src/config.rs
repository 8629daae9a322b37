//! Configuration management for Lambda functions.

use std::env;

use crate::{Error, Result};

/// How the database connection is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSource {
    /// A full connection URL, mostly for local development.
    Url(String),
    /// A host plus a Secrets Manager secret holding the credentials.
    Secret {
        host: String,
        name: String,
        secret_arn: String,
    },
}

/// Credentials and region for the object storage client.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("region", &self.region)
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where to find the database
    pub database: DatabaseSource,
    /// Connection pool size
    pub db_max_connections: u32,
    /// Object storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup, so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let database = match lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => DatabaseSource::Url(url),
            None => DatabaseSource::Secret {
                host: required("DATABASE_HOST")?,
                name: lookup("DATABASE_NAME").unwrap_or_else(|| "talktodo".to_string()),
                secret_arn: required("DATABASE_SECRET_ARN")?,
            },
        };

        let db_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| {
                Error::Config(format!("DATABASE_MAX_CONNECTIONS is not a number: {}", raw))
            })?,
            None => 5,
        };

        Ok(Self {
            database,
            db_max_connections,
            storage: StorageConfig {
                region: required("CLOUD_AWS_REGION_STATIC")?,
                access_key: required("CLOUD_AWS_CREDENTIALS_ACCESS_KEY")?,
                secret_key: required("CLOUD_AWS_CREDENTIALS_SECRET_KEY")?,
            },
        })
    }
}
