//! Core types for FoodLocation.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod rating;
pub mod status;
pub mod window;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use rating::{Rate, RateError};
pub use status::*;
pub use window::ServiceWindow;
