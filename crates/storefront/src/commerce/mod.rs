//! Remote Commerce API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`, JSON envelopes decoded with `serde`
//! - The Remote Commerce API is the source of truth - NO local sync
//! - In-memory caching via `moka` for catalog responses (products, brands)
//! - Cart and order calls are never cached
//!
//! # Envelopes
//!
//! Every response is a JSON object carrying either a `status` field
//! (`"success"` on success) or, for auth endpoints, a `message` field. Failures
//! carry `statusMsg: "fail"` and a human-readable `message`. The client turns
//! both into typed results at this boundary; nothing above it inspects raw
//! JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use wallmart_storefront::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce)?;
//!
//! let page = client.get_products(&ProductQuery::page(1)).await?;
//! let cart = client.update_cart_item(token, &product_id, 3).await?;
//! ```

mod cache;
mod client;
mod conversions;
pub mod types;

pub use client::CommerceClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the Remote Commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// Network, TLS or timeout failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered but rejected the request (`status != "success"`).
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code of the response.
        status: u16,
        /// Message supplied by the API.
        message: String,
    },

    /// The bearer token is missing, expired or invalid.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("rate limited by commerce API")]
    RateLimited,

    /// The response body did not match the expected shape.
    #[error("JSON decode error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot be joined with an endpoint path.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CommerceError {
    /// Message that is safe to show to the customer.
    ///
    /// API rejections carry a customer-facing message already (e.g.
    /// "Incorrect email or password"); everything else is generic.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Unauthorized(_) => "Your session has expired, please sign in again".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::RateLimited => "Too many requests, please try again shortly".to_string(),
            Self::Http(_) | Self::Decode { .. } | Self::InvalidUrl(_) => {
                "Something went wrong, please try again".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::Rejected {
            status: 409,
            message: "Account Already Exists".to_string(),
        };
        assert_eq!(err.to_string(), "request rejected (409): Account Already Exists");

        let err = CommerceError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "not found: product 123");
    }

    #[test]
    fn test_user_message_passes_through_rejections_only() {
        let rejected = CommerceError::Rejected {
            status: 401,
            message: "Incorrect email or password".to_string(),
        };
        assert_eq!(rejected.user_message(), "Incorrect email or password");

        let unauthorized = CommerceError::Unauthorized("Invalid Token".to_string());
        assert!(!unauthorized.user_message().contains("Invalid Token"));
    }
}
