//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::cart::CartStores;
use crate::commerce::{CommerceClient, CommerceError};
use crate::config::StorefrontConfig;
use crate::middleware::session::SESSION_EXPIRY_SECONDS;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// commerce client, the per-user cart stores and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    commerce: CommerceClient,
    carts: CartStores,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce client cannot be built from the
    /// configuration.
    pub fn new(config: StorefrontConfig) -> Result<Self, CommerceError> {
        let commerce = CommerceClient::new(&config.commerce)?;
        let carts = CartStores::new(Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                commerce,
                carts,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Remote Commerce API client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Get a reference to the per-user cart stores.
    #[must_use]
    pub fn carts(&self) -> &CartStores {
        &self.inner.carts
    }
}
