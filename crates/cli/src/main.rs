//! FoodLocation management CLI.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! foodloc migrate
//!
//! # Create a staff superuser (password from --password or FOODLOC_SUPERUSER_PASSWORD)
//! foodloc user create-superuser -u root -e root@foodlocation.vn
//!
//! # Insert default payment methods and tags
//! foodloc seed
//! ```
//!
//! Every command reads `FOODLOC_DATABASE_URL` (or `DATABASE_URL`), loading
//! `.env` when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "foodloc")]
#[command(author, version, about = "FoodLocation management tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Insert default payment methods and tags
    Seed,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a staff superuser
    CreateSuperuser {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(long, env = "FOODLOC_SUPERUSER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::CreateSuperuser {
                username,
                email,
                password,
            } => {
                let password = password.ok_or_else(|| {
                    CliError::Invalid(
                        "pass --password or set FOODLOC_SUPERUSER_PASSWORD".to_string(),
                    )
                })?;
                commands::user::create_superuser(&username, email.as_deref(), &password).await?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_superuser() {
        let cli = Cli::try_parse_from([
            "foodloc",
            "user",
            "create-superuser",
            "-u",
            "root",
            "-e",
            "root@foodlocation.vn",
            "--password",
            "correct horse",
        ])
        .unwrap();
        match cli.command {
            Commands::User {
                action:
                    UserAction::CreateSuperuser {
                        username,
                        email,
                        password,
                    },
            } => {
                assert_eq!(username, "root");
                assert_eq!(email.as_deref(), Some("root@foodlocation.vn"));
                assert_eq!(password.as_deref(), Some("correct horse"));
            }
            _ => panic!("expected create-superuser"),
        }
    }

    #[test]
    fn test_parse_migrate_and_seed() {
        assert!(matches!(
            Cli::try_parse_from(["foodloc", "migrate"]).unwrap().command,
            Commands::Migrate
        ));
        assert!(matches!(
            Cli::try_parse_from(["foodloc", "seed"]).unwrap().command,
            Commands::Seed
        ));
        assert!(Cli::try_parse_from(["foodloc", "user", "create-superuser"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
