//! Business logic services.
//!
//! - `auth` - password registration and login
//! - `orders` - order placement and status lifecycle

pub mod auth;
pub mod orders;
