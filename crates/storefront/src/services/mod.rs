//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Sign-in and registration against the Remote Commerce API,
//!   plus form validation

pub mod auth;
