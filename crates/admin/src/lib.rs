//! FoodLocation staff console.
//!
//! Server-rendered pages for moderating accounts, dishes and orders and for
//! maintaining reference data. Reads and writes go through the repositories
//! of `foodloc-api`, so both binaries share one schema and one set of rules.
//!
//! # Security
//!
//! Only active accounts with `is_staff` or `is_superuser` can sign in. The
//! console is meant to be bound to a private interface.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
