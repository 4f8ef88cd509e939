//! Authentication service.
//!
//! Sign-in and registration are delegated to the Remote Commerce API, which
//! acts as the identity provider. The storefront only keeps the resulting
//! identity and bearer token in its session.

mod error;
pub mod validation;

pub use error::AuthError;
pub use validation::{
    Credentials, FieldErrors, LoginForm, RegisterForm, validate_login, validate_register,
};

use secrecy::ExposeSecret;
use tracing::instrument;

use wallmart_core::Email;

use crate::commerce::{CommerceClient, CommerceError, SignUp};
use crate::models::CurrentUser;

/// Authentication service.
pub struct AuthService<'a> {
    commerce: &'a CommerceClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(commerce: &'a CommerceClient) -> Self {
        Self { commerce }
    }

    /// Sign in and resolve the session identity.
    ///
    /// The sign-in response carries no user ID, so the token is verified to
    /// learn it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the API refuses the
    /// credentials, `AuthError::InvalidToken` if the issued token does not
    /// verify, or `AuthError::Commerce` for transport failures.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<CurrentUser, AuthError> {
        let session = self
            .commerce
            .sign_in(&credentials.email, &credentials.password)
            .await
            .map_err(|err| match err {
                CommerceError::Unauthorized(message)
                | CommerceError::Rejected { message, .. } => AuthError::InvalidCredentials(message),
                other => AuthError::Commerce(other),
            })?;

        let token = session.token.expose_secret().to_owned();
        let identity = self
            .commerce
            .verify_token(&token)
            .await
            .map_err(|err| match err {
                CommerceError::Unauthorized(_) | CommerceError::Rejected { .. } => {
                    AuthError::InvalidToken
                }
                other => AuthError::Commerce(other),
            })?;

        let email = match Email::parse(&session.user.email) {
            Ok(email) => email,
            Err(_) => credentials.email.clone(),
        };

        tracing::info!(user_id = %identity.id, "User signed in");

        Ok(CurrentUser {
            id: identity.id,
            name: session.user.name,
            email,
            token,
        })
    }

    /// Register a new account.
    ///
    /// Registration does not sign the user in; they are sent to the login
    /// page afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RegistrationRejected` with the API's message if
    /// the account cannot be created, or `AuthError::Commerce` for transport
    /// failures.
    #[instrument(skip(self, sign_up), fields(email = %sign_up.email))]
    pub async fn register(&self, sign_up: &SignUp) -> Result<(), AuthError> {
        self.commerce
            .sign_up(sign_up)
            .await
            .map_err(|err| match err {
                CommerceError::Rejected { message, .. } => AuthError::RegistrationRejected(message),
                other => AuthError::Commerce(other),
            })?;

        tracing::info!("User registered");
        Ok(())
    }
}
