//! Authentication error types.

use thiserror::Error;

use crate::commerce::CommerceError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Carries the API's message.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The API refused the registration (e.g. the email is taken).
    #[error("registration rejected: {0}")]
    RegistrationRejected(String),

    /// The token returned by sign-in did not verify.
    #[error("token verification failed")]
    InvalidToken,

    /// The API returned an email that does not parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] wallmart_core::EmailError),

    /// Remote Commerce API failure.
    #[error("commerce error: {0}")]
    Commerce(#[from] CommerceError),
}

impl AuthError {
    /// Message that is safe to show on the login/register form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials(message) | Self::RegistrationRejected(message) => {
                message.clone()
            }
            Self::InvalidToken | Self::InvalidEmail(_) => {
                "Sign-in failed, please try again".to_string()
            }
            Self::Commerce(err) => err.user_message(),
        }
    }
}
