//! Session-related types.
//!
//! Types stored in the session for authentication state. Login itself is
//! handled by the identity service; this binary only reads the identity it
//! placed in the session.

use serde::{Deserialize, Serialize};

use eagcart_core::UserCode;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's code.
    pub code: UserCode,
    /// User's email address.
    pub email: String,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
