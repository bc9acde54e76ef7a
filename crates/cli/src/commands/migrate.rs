//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded at build time.
//!
//! ```bash
//! foodloc migrate
//! ```

use super::{CliError, connect};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
