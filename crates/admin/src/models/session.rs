//! Session-related types.
//!
//! Operator login is handled by the identity service; this binary only
//! reads the identity placed in the session.

use serde::{Deserialize, Serialize};

/// Session-stored operator identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Operator's email address.
    pub email: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in operator.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
