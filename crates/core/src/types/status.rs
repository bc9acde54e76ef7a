//! Roles and lifecycle statuses.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role.
///
/// A `Store` is a user that owns menus and dishes and receives orders; a
/// `User` browses and places orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "marketplace.user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,
    Store,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Store => "STORE",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "STORE" => Ok(Self::Store),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Lifecycle stage of an order.
///
/// Orders only move forward, one step at a time:
///
/// ```text
/// PENDING ──accept──▶ ACCEPTED ──complete──▶ SUCCESSED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "marketplace.order_status"))]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "PENDING")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "PENDING"))]
    Pending,
    #[serde(rename = "ACCEPTED")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "ACCEPTED"))]
    Accepted,
    /// Delivered and paid. The wire value keeps the historical spelling.
    #[serde(rename = "SUCCESSED")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "SUCCESSED"))]
    Succeeded,
}

/// Error returned when an order is asked to move to a status it cannot reach.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("order cannot move from {from} to {to}")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::Accepted, Self::Succeeded];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Succeeded => "SUCCESSED",
        }
    }

    /// The only status this one may advance to.
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Accepted),
            Self::Accepted => Some(Self::Succeeded),
            Self::Succeeded => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        self.next() == Some(to)
    }

    /// Validate a transition and return the new status.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` unless `to` is the immediate successor.
    pub fn transition(self, to: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_are_allowed() {
        assert_eq!(
            OrderStatus::Pending.transition(OrderStatus::Accepted),
            Ok(OrderStatus::Accepted)
        );
        assert_eq!(
            OrderStatus::Accepted.transition(OrderStatus::Succeeded),
            Ok(OrderStatus::Succeeded)
        );
    }

    #[test]
    fn test_every_other_transition_is_rejected() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                if from.next() == Some(to) {
                    continue;
                }
                assert_eq!(
                    from.transition(to),
                    Err(TransitionError { from, to }),
                    "{from} -> {to} should be rejected"
                );
            }
        }
    }

    #[test]
    fn test_skipping_acceptance_is_rejected() {
        let err = OrderStatus::Pending
            .transition(OrderStatus::Succeeded)
            .unwrap_err();
        assert_eq!(err.to_string(), "order cannot move from PENDING to SUCCESSED");
    }

    #[test]
    fn test_terminal() {
        assert!(OrderStatus::Succeeded.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Succeeded).unwrap(),
            "\"SUCCESSED\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"ACCEPTED\"").unwrap();
        assert_eq!(parsed, OrderStatus::Accepted);
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert!("DELIVERED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_user_role() {
        assert_eq!(serde_json::to_string(&UserRole::Store).unwrap(), "\"STORE\"");
        assert_eq!("store".parse::<UserRole>().unwrap(), UserRole::Store);
        assert_eq!(UserRole::default(), UserRole::User);
        assert!("ADMIN".parse::<UserRole>().is_err());
    }
}
