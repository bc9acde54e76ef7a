//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use foodloc_core::UserId;

/// Session-stored user identity.
///
/// Only the id is trusted; the account row is reloaded on every request so a
/// deactivated user loses access immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Username at login time (for logs).
    pub username: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
