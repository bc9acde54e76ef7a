//! Account management commands.
//!
//! ```bash
//! FOODLOC_SUPERUSER_PASSWORD=... foodloc user create-superuser -u root -e root@foodlocation.vn
//! ```

use foodloc_api::db::UserRecord;
use foodloc_api::services::auth::{AuthService, hash_password, validate_password};
use foodloc_api::validation;
use foodloc_core::UserId;

use super::{CliError, connect};

/// Validated row for a superuser account.
///
/// # Errors
///
/// Returns `CliError::Invalid` for a malformed username or email.
pub fn superuser_record(username: &str, email: Option<&str>) -> Result<UserRecord, CliError> {
    Ok(UserRecord {
        username: validation::username(username).map_err(CliError::Invalid)?,
        email: validation::optional_email(email).map_err(CliError::Invalid)?,
        is_staff: true,
        is_superuser: true,
        ..UserRecord::default()
    })
}

/// Create an active staff superuser that can sign in to the admin console.
///
/// # Errors
///
/// Returns `CliError` for invalid input, a taken username or database failures.
pub async fn create_superuser(
    username: &str,
    email: Option<&str>,
    password: &str,
) -> Result<UserId, CliError> {
    let record = superuser_record(username, email)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;
    let user = AuthService::new(&pool).create(&record, &password_hash).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "Superuser created");
    Ok(user.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use foodloc_core::UserRole;

    use super::*;

    #[test]
    fn test_superuser_record() {
        let record = superuser_record(" root ", Some("Root@FoodLocation.vn")).unwrap();
        assert_eq!(record.username, "root");
        assert!(record.is_staff);
        assert!(record.is_superuser);
        assert_eq!(record.user_role, UserRole::User);
        assert!(record.email.is_some());
    }

    #[test]
    fn test_superuser_record_rejects_bad_input() {
        assert!(matches!(
            superuser_record("has space", None),
            Err(CliError::Invalid(_))
        ));
        assert!(matches!(
            superuser_record("root", Some("not-an-email")),
            Err(CliError::Invalid(_))
        ));
    }
}
