//! FoodLocation marketplace API.
//!
//! Stores publish menus and dishes, customers browse, order, comment, like
//! and rate, and stores accept and complete the orders they receive. The
//! binary in `main.rs` wires this library to a listener; the admin console
//! and CLI reuse its configuration, repositories and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod routes;
pub mod serializers;
pub mod services;
pub mod state;
pub mod validation;
