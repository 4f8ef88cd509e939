//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use wallmart_core::{Email, UserId};

/// Session-stored user identity.
///
/// The Remote Commerce API is the identity provider; the session keeps what
/// its sign-in returned plus the user ID resolved from the token.
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Commerce API user ID, scopes order lookups.
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Bearer token for cart calls.
    pub token: String,
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
