//! Authentication route handlers.
//!
//! Handles login, registration and logout. Credentials are checked by the
//! Remote Commerce API; the storefront keeps the resulting identity in the
//! session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, safe_callback_url, set_current_user};
use crate::routes::layout::NavView;
use crate::services::auth::{
    AuthService, FieldErrors, LoginForm, RegisterForm, validate_login, validate_register,
};
use crate::state::AppState;

/// Query flag set after a successful registration.
const REGISTERED: &str = "registered";

// =============================================================================
// Query Types
// =============================================================================

/// Login page query parameters.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub callback_url: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub email: String,
    pub callback_url: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: NavView,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl RegisterTemplate {
    /// Re-render the form keeping everything but the passwords.
    fn with_values(form: &RegisterForm, errors: FieldErrors, error: Option<String>) -> Self {
        Self {
            nav: NavView::new(None, "register"),
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            errors,
            error,
        }
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    let callback_url = safe_callback_url(query.callback_url.as_deref());
    if user.is_some() {
        return Redirect::to(&callback_url).into_response();
    }

    LoginTemplate {
        nav: NavView::new(None, "login"),
        email: String::new(),
        callback_url,
        errors: FieldErrors::default(),
        error: None,
        success: (query.success.as_deref() == Some(REGISTERED))
            .then(|| "Account created. Please sign in.".to_string()),
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success the user's cart store starts fresh and the browser goes back
/// to the page that asked for the login.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let callback_url = safe_callback_url(form.callback_url.as_deref());
    let render = |status: StatusCode, errors: FieldErrors, error: Option<String>| {
        (
            status,
            LoginTemplate {
                nav: NavView::new(None, "login"),
                email: form.email.trim().to_string(),
                callback_url: callback_url.clone(),
                errors,
                error,
                success: None,
            },
        )
            .into_response()
    };

    let credentials = match validate_login(&form) {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(render(StatusCode::UNPROCESSABLE_ENTITY, errors, None)),
    };

    let user = match AuthService::new(state.commerce()).login(&credentials).await {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!(error = %err, "Login failed");
            let message = err.user_message();
            let status = AppError::from(err).status();
            return Ok(render(status, FieldErrors::default(), Some(message)));
        }
    };

    state.carts().invalidate(&user.id).await;
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Signed in", None);

    Ok(Redirect::to(&callback_url).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate::with_values(&RegisterForm::default(), FieldErrors::default(), None)
        .into_response()
}

/// Handle registration form submission.
///
/// Registration does not sign the user in; the login page follows.
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let sign_up = match validate_register(&form) {
        Ok(sign_up) => sign_up,
        Err(errors) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                RegisterTemplate::with_values(&form, errors, None),
            )
                .into_response();
        }
    };

    match AuthService::new(state.commerce()).register(&sign_up).await {
        Ok(()) => Redirect::to(&format!("/auth/login?success={REGISTERED}")).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "Registration failed");
            let message = err.user_message();
            let status = AppError::from(err).status();
            (
                status,
                RegisterTemplate::with_values(&form, FieldErrors::default(), Some(message)),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Drops the user's cart store and the whole session.
#[instrument(skip(state, session, user))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Redirect, AppError> {
    if let Some(user) = user {
        state.carts().invalidate(&user.id).await;
        tracing::info!(user_id = %user.id, "User signed out");
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/auth/login"))
}
