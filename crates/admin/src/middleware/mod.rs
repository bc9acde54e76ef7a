//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers
//! 2. `TraceLayer` (request span with staff id)
//! 3. Request id (shared with the API)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. `RequireStaff` extractor on protected routes

pub mod auth;
pub mod session;

pub use auth::{
    LOGIN_PATH, RequireStaff, clear_current_staff, set_current_staff, set_flash, take_flash,
};
pub use session::create_session_layer;
