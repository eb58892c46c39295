//! Session types for the admin binary.

pub mod session;

pub use session::{CurrentAdmin, keys as session_keys};
