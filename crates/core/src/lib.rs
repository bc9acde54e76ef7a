//! FoodLocation Core - Shared domain types.
//!
//! This crate provides the types shared by every FoodLocation component:
//! - `api` - Public REST API for users and stores
//! - `admin` - Staff console
//! - `cli` - Migrations, superuser creation, seed data
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. The order lifecycle and the dish availability rules live
//! here so that every binary enforces them the same way.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money, ratings, service windows and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
