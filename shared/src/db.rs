//! Database connection management.

use aws_sdk_secretsmanager::Client as SecretsClient;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseSource;
use crate::secrets::get_database_credentials;
use crate::{Config, Error, Result};

/// Resolve the database URL, fetching credentials from Secrets Manager when needed.
pub async fn database_url(config: &Config, secrets: &SecretsClient) -> Result<String> {
    match &config.database {
        DatabaseSource::Url(url) => Ok(url.clone()),
        DatabaseSource::Secret {
            host,
            name,
            secret_arn,
        } => {
            let creds = get_database_credentials(secrets, secret_arn).await?;
            Ok(creds.database_url(host, name))
        }
    }
}

/// Create a database connection pool.
pub async fn create_pool(config: &Config, secrets: &SecretsClient) -> Result<PgPool> {
    let url = database_url(config, secrets).await?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&url)
        .await
        .map_err(Error::Database)?;

    Ok(pool)
}

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
