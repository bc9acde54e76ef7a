//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use foodloc_api::config::{ConfigError, get_database_url};
use foodloc_api::db::{self, RepositoryError};
use foodloc_api::services::auth::AuthError;
use sqlx::PgPool;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Invalid input: {0}")]
    Invalid(String),
}

/// Connect to `FOODLOC_DATABASE_URL` (or `DATABASE_URL`).
///
/// # Errors
///
/// Returns `CliError` if the URL is missing or the database is unreachable.
pub async fn connect() -> Result<PgPool, CliError> {
    let database_url = get_database_url("FOODLOC_DATABASE_URL")?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
