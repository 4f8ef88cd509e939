//! The server side of the cart store.

use std::future::Future;

use wallmart_core::{CartId, CartSnapshot, ProductId};

use crate::commerce::{CommerceClient, CommerceError};

/// Remote operations the cart store delegates to.
///
/// Every method returns the full cart as the server sees it after the
/// operation.
pub trait CartApi: Sync {
    fn fetch_cart(&self) -> impl Future<Output = Result<CartSnapshot, CommerceError>> + Send;

    fn add_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<CartSnapshot, CommerceError>> + Send;

    fn update_item(
        &self,
        product_id: &ProductId,
        count: u32,
    ) -> impl Future<Output = Result<CartSnapshot, CommerceError>> + Send;

    fn remove_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<CartSnapshot, CommerceError>> + Send;

    fn clear(&self, cart_id: &CartId)
    -> impl Future<Output = Result<CartSnapshot, CommerceError>> + Send;
}

/// The commerce client bound to one user's token.
#[derive(Clone, Copy)]
pub struct AuthorizedCart<'a> {
    client: &'a CommerceClient,
    token: &'a str,
}

impl<'a> AuthorizedCart<'a> {
    #[must_use]
    pub const fn new(client: &'a CommerceClient, token: &'a str) -> Self {
        Self { client, token }
    }
}

impl std::fmt::Debug for AuthorizedCart<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedCart")
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl CartApi for AuthorizedCart<'_> {
    async fn fetch_cart(&self) -> Result<CartSnapshot, CommerceError> {
        self.client.get_cart(self.token).await
    }

    async fn add_item(&self, product_id: &ProductId) -> Result<CartSnapshot, CommerceError> {
        self.client.add_to_cart(self.token, product_id).await
    }

    async fn update_item(
        &self,
        product_id: &ProductId,
        count: u32,
    ) -> Result<CartSnapshot, CommerceError> {
        self.client
            .update_cart_item(self.token, product_id, count)
            .await
    }

    async fn remove_item(&self, product_id: &ProductId) -> Result<CartSnapshot, CommerceError> {
        self.client.remove_cart_item(self.token, product_id).await
    }

    async fn clear(&self, cart_id: &CartId) -> Result<CartSnapshot, CommerceError> {
        self.client.clear_cart(self.token, cart_id).await
    }
}
