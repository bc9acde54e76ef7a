//! Role and ownership checks.
//!
//! Pure functions over the loaded [`User`]; handlers turn a
//! [`PermissionDenied`] into a 403.

use thiserror::Error;

use foodloc_core::UserId;

use crate::models::interaction::Comment;
use crate::models::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PermissionDenied(pub &'static str);

type Check = Result<(), PermissionDenied>;

/// Caller has the `STORE` role.
///
/// # Errors
///
/// Returns `PermissionDenied` for customer accounts.
pub fn require_store(user: &User) -> Check {
    if user.is_store() {
        Ok(())
    } else {
        Err(PermissionDenied("only store accounts can do this"))
    }
}

/// Caller is a store that staff have verified.
///
/// # Errors
///
/// Returns `PermissionDenied` for customers and unverified stores.
pub fn require_verified_store(user: &User) -> Check {
    require_store(user)?;
    if user.is_verify {
        Ok(())
    } else {
        Err(PermissionDenied("store account is awaiting verification"))
    }
}

/// Caller has the `USER` role.
///
/// # Errors
///
/// Returns `PermissionDenied` for store accounts.
pub fn require_customer(user: &User) -> Check {
    if user.is_store() {
        Err(PermissionDenied("store accounts cannot do this"))
    } else {
        Ok(())
    }
}

/// Caller is the verified store that owns the resource.
///
/// # Errors
///
/// Returns `PermissionDenied` unless `user` is `owner` and verified.
pub fn require_owner(user: &User, owner: UserId) -> Check {
    require_verified_store(user)?;
    if user.id == owner {
        Ok(())
    } else {
        Err(PermissionDenied("you do not own this resource"))
    }
}

/// Caller wrote the comment.
///
/// # Errors
///
/// Returns `PermissionDenied` for anyone else.
pub fn require_comment_owner(user: &User, comment: &Comment) -> Check {
    if comment.user_id == user.id {
        Ok(())
    } else {
        Err(PermissionDenied("you can only change your own comments"))
    }
}

/// Caller may create tags: a verified store or staff.
///
/// # Errors
///
/// Returns `PermissionDenied` for everyone else.
pub fn require_tag_author(user: &User) -> Check {
    if user.is_admin() {
        return Ok(());
    }
    require_verified_store(user)
}
