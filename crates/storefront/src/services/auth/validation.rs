//! Login and registration form validation.
//!
//! Errors are collected per field so the form can be re-rendered with each
//! message next to its input.

use std::collections::BTreeMap;

use serde::Deserialize;

use wallmart_core::{Email, Phone};

use crate::commerce::SignUp;

const MIN_NAME_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 8;
const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Record an error. The first error for a field wins.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, Self> {
        match value() {
            Some(value) if self.is_empty() => Ok(value),
            _ => Err(self),
        }
    }
}

// =============================================================================
// Login
// =============================================================================

/// Login form as submitted.
#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub callback_url: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

/// Validated login credentials.
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

/// Validate a login form.
///
/// # Errors
///
/// Returns the per-field errors if any field is invalid.
pub fn validate_login(form: &LoginForm) -> Result<Credentials, FieldErrors> {
    let mut errors = FieldErrors::default();

    let email = Email::parse(&form.email)
        .inspect_err(|_| errors.insert("email", "Invalid email address."))
        .ok();
    if form.password.is_empty() {
        errors.insert("password", "Password is required");
    }

    errors.into_result(|| {
        email.map(|email| Credentials {
            email,
            password: form.password.clone(),
        })
    })
}

// =============================================================================
// Registration
// =============================================================================

/// Registration form as submitted. Field names follow the API.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub re_password: String,
    #[serde(default)]
    pub phone: String,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("re_password", &"[REDACTED]")
            .field("phone", &self.phone)
            .finish()
    }
}

/// Validate a registration form into the sign-up payload.
///
/// # Errors
///
/// Returns the per-field errors if any field is invalid.
pub fn validate_register(form: &RegisterForm) -> Result<SignUp, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = form.name.as_str();
    if name.chars().count() < MIN_NAME_LENGTH {
        errors.insert("name", "Name must be at least 3 characters.");
    }

    let email = Email::parse(&form.email)
        .inspect_err(|_| errors.insert("email", "Invalid email address."))
        .ok();

    if !is_strong_password(&form.password) {
        errors.insert(
            "password",
            "Use 8+ characters with upper and lower case letters, a digit and one of @$!%*?&",
        );
    }
    if form.re_password != form.password {
        errors.insert("rePassword", "Passwords don't match");
    }

    let phone = Phone::parse(&form.phone)
        .inspect_err(|_| errors.insert("phone", "Invalid Egyptian phone number"))
        .ok();

    errors.into_result(|| {
        Some(SignUp {
            name: name.to_string(),
            email: email?,
            password: form.password.clone(),
            re_password: form.re_password.clone(),
            phone: phone?,
        })
    })
}

/// At least 8 characters from `[A-Za-z0-9@$!%*?&]`, with one of each class.
fn is_strong_password(password: &str) -> bool {
    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);

    password.chars().count() >= MIN_PASSWORD_LENGTH
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || is_special(c))
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special)
}
