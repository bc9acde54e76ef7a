//! Authentication service.
//!
//! Username/password accounts hashed with Argon2id. Sessions are handled by
//! the route layer; this module only validates and checks credentials.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use foodloc_core::{UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::{ProfileChanges, UserRecord, UserRepository};
use crate::models::user::{NewUser, ProfileUpdate, User};
use crate::validation::{self, MAX_NAME_LENGTH};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidField` or `AuthError::WeakPassword` for bad
    /// input and `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(&self, new_user: &NewUser) -> Result<User, AuthError> {
        let record = registration_record(new_user)?;
        validate_password(&new_user.password)?;
        let password_hash = hash_password(&new_user.password)?;

        let user = self.create(&record, &password_hash).await?;
        tracing::info!(user_id = %user.id, role = %user.user_role, "Account registered");
        Ok(user)
    }

    /// Create an account from an already validated record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn create(&self, record: &UserRecord, password_hash: &str) -> Result<User, AuthError> {
        self.users
            .create(record, password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is
    /// wrong and `AuthError::InactiveAccount` for disabled accounts.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let Some((user, password_hash)) = self.users.get_credentials(username.trim()).await? else {
            // Hash anyway so unknown usernames take as long as wrong passwords
            let _ = hash_password(password);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;

        if !user.is_active {
            return Err(AuthError::InactiveAccount);
        }
        Ok(user)
    }

    /// Update the caller's profile, including an optional password change.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidField` or `AuthError::WeakPassword` for bad
    /// input.
    pub async fn update_profile(
        &self,
        user: &User,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        let changes = profile_changes(user, update)?;
        let updated = self.users.update_profile(user.id, &changes).await?;
        if changes.password_hash.is_some() {
            tracing::info!(user_id = %user.id, "Password changed");
        }
        Ok(updated)
    }

    /// Load an account by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get_by_id(id).await?)
    }
}

fn registration_record(new_user: &NewUser) -> Result<UserRecord, AuthError> {
    let field = |r: Result<Option<String>, String>| r.map_err(AuthError::InvalidField);

    let username = validation::username(&new_user.username).map_err(AuthError::InvalidField)?;
    let first_name = field(validation::optional_text(
        "first_name",
        Some(&new_user.first_name),
        150,
    ))?;
    let last_name = field(validation::optional_text(
        "last_name",
        Some(&new_user.last_name),
        150,
    ))?;
    let email = field(validation::optional_email(new_user.email.as_deref()))?;
    let phone = new_user
        .phone
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(validation::phone)
        .transpose()
        .map_err(AuthError::InvalidField)?;
    let name_store = field(validation::optional_text(
        "name_store",
        new_user.name_store.as_deref(),
        MAX_NAME_LENGTH,
    ))?;
    let address = field(validation::optional_text(
        "address",
        new_user.address.as_deref(),
        MAX_NAME_LENGTH,
    ))?;
    let avatar = field(validation::optional_text(
        "avatar",
        new_user.avatar.as_deref(),
        MAX_NAME_LENGTH,
    ))?;

    if new_user.user_role == UserRole::Store && name_store.is_none() {
        return Err(AuthError::InvalidField(
            "name_store is required for store accounts".to_string(),
        ));
    }

    Ok(UserRecord {
        username,
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
        email,
        phone,
        avatar,
        name_store,
        address,
        user_role: new_user.user_role,
        is_staff: false,
        is_superuser: false,
    })
}

fn profile_changes(user: &User, update: &ProfileUpdate) -> Result<ProfileChanges, AuthError> {
    let text = |name: &str, value: Option<&String>, max: usize| {
        value
            .map(|v| validation::required_text(name, v, max))
            .transpose()
            .map_err(AuthError::InvalidField)
    };

    if user.is_store()
        && update
            .name_store
            .as_deref()
            .is_some_and(|n| n.trim().is_empty())
    {
        return Err(AuthError::InvalidField(
            "name_store cannot be blank for store accounts".to_string(),
        ));
    }

    let password_hash = match update.password.as_deref() {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    Ok(ProfileChanges {
        first_name: text("first_name", update.first_name.as_ref(), 150)?,
        last_name: text("last_name", update.last_name.as_ref(), 150)?,
        email: validation::optional_email(update.email.as_deref())
            .map_err(AuthError::InvalidField)?,
        phone: update
            .phone
            .as_deref()
            .map(validation::phone)
            .transpose()
            .map_err(AuthError::InvalidField)?,
        avatar: text("avatar", update.avatar.as_ref(), MAX_NAME_LENGTH)?,
        name_store: text("name_store", update.name_store.as_ref(), MAX_NAME_LENGTH)?,
        address: text("address", update.address.as_ref(), MAX_NAME_LENGTH)?,
        password_hash,
    })
}

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` for passwords shorter than eight characters.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
