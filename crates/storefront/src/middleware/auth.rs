//! Authentication middleware and extractors.
//!
//! The signed-in user lives in the session. Pages that need one redirect
//! to the login page with a `callback_url` pointing back at themselves.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderValue, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders of {}", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection when a signed-in user is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, then back to `callback_url`.
    RedirectToLogin { callback_url: String },
    /// HTMX request: ask the client to navigate to the login page.
    HxRedirect { callback_url: String },
    /// Session middleware missing.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { callback_url } => {
                Redirect::to(&login_url(&callback_url)).into_response()
            }
            Self::HxRedirect { callback_url } => {
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                if let Ok(value) = HeaderValue::from_str(&login_url(&callback_url)) {
                    response.headers_mut().insert("HX-Redirect", value);
                }
                response
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Login page URL returning to `callback_url` afterwards.
#[must_use]
pub fn login_url(callback_url: &str) -> String {
    if callback_url == "/" {
        "/auth/login".to_string()
    } else {
        format!(
            "/auth/login?callback_url={}",
            urlencoding::encode(callback_url)
        )
    }
}

/// Accept only same-site relative paths as a post-login destination.
#[must_use]
pub fn safe_callback_url(candidate: Option<&str>) -> String {
    match candidate {
        Some(url)
            if url.starts_with('/')
                && !url.starts_with("//")
                && !url.contains('\\')
                && !url.starts_with("/auth/") =>
        {
            url.to_string()
        }
        _ => "/".to_string(),
    }
}

async fn session_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        if let Some(user) = session_user(session).await {
            return Ok(Self(user));
        }

        let is_htmx = parts.headers.contains_key("hx-request");
        // HTMX fragments come back to the page that hosted them
        let callback_url = if is_htmx {
            parts
                .headers
                .get("hx-current-url")
                .and_then(|v| v.to_str().ok())
                .and_then(|url| url::Url::parse(url).ok())
                .map_or_else(|| "/".to_string(), |url| url.path().to_string())
        } else {
            // Nested routers see the URI with their prefix stripped
            let uri = parts
                .extensions
                .get::<OriginalUri>()
                .map_or(&parts.uri, |OriginalUri(uri)| uri);
            uri.path_and_query()
                .map_or_else(|| "/".to_string(), ToString::to_string)
        };

        Err(if is_htmx {
            AuthRejection::HxRedirect { callback_url }
        } else {
            AuthRejection::RedirectToLogin { callback_url }
        })
    }
}

/// Extractor that optionally gets the signed-in user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session_user(session).await,
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the signed-in user in the session.
///
/// Cycles the session ID first so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Sign out: drop everything in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be flushed.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
