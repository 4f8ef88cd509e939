//! Cart snapshot types.
//!
//! A [`CartSnapshot`] is the full server-returned representation of a user's
//! cart. The storefront never patches a snapshot in place: every successful
//! fetch or mutation produces a new snapshot that replaces the previous one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, LineItemId, ProductId};
use super::price::Price;

/// Product reference carried by a cart line.
///
/// Some cart endpoints return the full product, others only its ID; the
/// descriptive fields are therefore optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
}

impl CartProduct {
    /// A reference that only knows the product ID.
    #[must_use]
    pub const fn bare(id: ProductId) -> Self {
        Self {
            id,
            title: None,
            image_url: None,
            brand: None,
            category: None,
        }
    }
}

/// One product-quantity pair within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Line ID assigned by the Remote Commerce API.
    pub id: LineItemId,
    pub product: CartProduct,
    /// Quantity, always at least 1.
    pub count: u32,
    /// Unit price as computed by the server.
    pub price: Decimal,
}

impl CartLineItem {
    /// Price of the whole line (`count * price`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.count)
    }
}

/// Full snapshot of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Server cart ID. `None` for a user who has never created a cart.
    pub cart_id: Option<CartId>,
    /// Number of line items, as reported by the server.
    pub num_of_cart_items: u32,
    pub products: Vec<CartLineItem>,
    /// Cart total, as computed by the server.
    pub total_cart_price: Decimal,
}

impl CartSnapshot {
    /// An empty cart, optionally keeping the server cart ID.
    #[must_use]
    pub const fn empty(cart_id: Option<CartId>) -> Self {
        Self {
            cart_id,
            num_of_cart_items: 0,
            products: Vec::new(),
            total_cart_price: Decimal::ZERO,
        }
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Find the line holding `product_id`.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLineItem> {
        self.products.iter().find(|line| &line.product.id == product_id)
    }

    /// Whether every line carries product details. Add-to-cart responses
    /// reference products by ID only.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.products.iter().all(|line| line.product.title.is_some())
    }

    /// The server total as a displayable price.
    #[must_use]
    pub fn total(&self) -> Price {
        Price::store(self.total_cart_price)
    }
}
