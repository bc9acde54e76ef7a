//! Accounts and stores.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use foodloc_core::{UserId, UserRole};

/// A marketplace account.
///
/// Stores are accounts with [`UserRole::Store`]; they must be verified by
/// staff before they can publish menus.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Media key of the avatar image.
    pub avatar: Option<String>,
    pub name_store: Option<String>,
    pub address: Option<String>,
    pub user_role: UserRole,
    pub is_verify: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_store(&self) -> bool {
        self.user_role == UserRole::Store
    }

    /// Whether the account may use the admin console.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_active && (self.is_staff || self.is_superuser)
    }

    /// Store name when set, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name_store
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// A store with the number of its active menus.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreWithCount {
    #[sqlx(flatten)]
    pub store: User,
    pub menu_count: i64,
}

/// Fields accepted when creating an account.
///
/// No `Debug`: carries a plaintext password.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub name_store: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub user_role: UserRole,
}

/// Partial profile update. `None` leaves a field unchanged.
#[derive(Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub name_store: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// An active account with the given role.
    pub fn user(id: i32, role: UserRole) -> User {
        User {
            id: UserId::new(id),
            username: format!("user{id}"),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            phone: None,
            avatar: None,
            name_store: None,
            address: None,
            user_role: role,
            is_verify: false,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
        }
    }

    /// A verified store.
    pub fn store(id: i32) -> User {
        User {
            name_store: Some(format!("Store {id}")),
            is_verify: true,
            ..user(id, UserRole::Store)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_display_name_prefers_store_name() {
        assert_eq!(store(3).display_name(), "Store 3");
        let mut s = store(4);
        s.name_store = Some("  ".to_string());
        assert_eq!(s.display_name(), "user4");
    }

    #[test]
    fn test_admin_requires_active_staff() {
        let mut u = user(1, UserRole::User);
        assert!(!u.is_admin());
        u.is_staff = true;
        assert!(u.is_admin());
        u.is_active = false;
        assert!(!u.is_admin());
    }
}
