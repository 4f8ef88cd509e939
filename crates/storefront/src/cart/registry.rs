//! Per-user cart store registry.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use wallmart_core::UserId;

use super::CartStore;

/// Cart stores keyed by user.
///
/// A store lives as long as its user keeps browsing: entries idle for
/// longer than the session expiry are evicted, and logout drops them
/// explicitly.
#[derive(Clone)]
pub struct CartStores {
    stores: Cache<UserId, Arc<CartStore>>,
}

impl CartStores {
    /// Create a registry evicting stores idle for `time_to_idle`.
    #[must_use]
    pub fn new(time_to_idle: Duration) -> Self {
        Self {
            stores: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }

    /// The user's store, created empty on first use.
    pub async fn get(&self, user_id: &UserId) -> Arc<CartStore> {
        self.stores
            .get_with(user_id.clone(), async { Arc::new(CartStore::new()) })
            .await
    }

    /// The user's store if one exists.
    pub async fn peek(&self, user_id: &UserId) -> Option<Arc<CartStore>> {
        self.stores.get(user_id).await
    }

    /// Drop the user's store. In-flight operations finish against the
    /// detached store; the next request starts from an unloaded one.
    pub async fn invalidate(&self, user_id: &UserId) {
        self.stores.invalidate(user_id).await;
    }
}
