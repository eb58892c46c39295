//! Middleware for the admin binary.

pub mod auth;
pub mod session;

pub use session::create_session_layer;
