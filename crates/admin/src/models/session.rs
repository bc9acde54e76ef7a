//! Session-related types for staff authentication.

use serde::{Deserialize, Serialize};

use foodloc_core::UserId;

/// Session-stored staff identity.
///
/// The account is reloaded on every request; only the id is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentStaff {
    pub id: UserId,
    /// Username at login time (for logs).
    pub username: String,
}

/// Session keys for staff authentication data.
pub mod keys {
    /// Key for storing the current logged-in staff member.
    pub const CURRENT_STAFF: &str = "current_staff";

    /// One-shot message shown on the next page.
    pub const FLASH: &str = "flash";
}
