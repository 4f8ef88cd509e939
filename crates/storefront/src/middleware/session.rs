//! Session middleware configuration.
//!
//! Sessions live in memory and the cookie is signed with the configured
//! session secret. A restart signs everyone out, which also drops their
//! in-memory cart stores.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "wm_session";

/// Session expiry time in seconds (7 days of inactivity).
pub const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Error building the session layer.
#[derive(Debug, thiserror::Error)]
#[error("session secret cannot be used as a signing key: {0}")]
pub struct SessionKeyError(#[from] tower_sessions::cookie::KeyError);

/// Create the session layer with an in-memory store.
///
/// # Errors
///
/// Returns an error if the session secret is shorter than 64 bytes.
pub fn create_session_layer(
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<MemoryStore, tower_sessions::service::SignedCookie>, SessionKeyError>
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())?;

    Ok(SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
