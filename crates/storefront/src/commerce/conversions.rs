//! Wire formats for cart and order endpoints, and their conversion into the
//! `wallmart_core` domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use wallmart_core::{
    CartId, CartLineItem, CartProduct, CartSnapshot, LineItemId, Order, OrderId, OrderStatus,
    ProductId,
};

use super::types::{Brand, Category};

// =============================================================================
// Cart
// =============================================================================

/// `GET/PUT/DELETE /cart` response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CartResponse {
    #[serde(default)]
    pub num_of_cart_items: u32,
    #[serde(default)]
    pub cart_id: Option<CartId>,
    pub data: CartData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CartData {
    #[serde(rename = "_id", default)]
    pub id: Option<CartId>,
    #[serde(default)]
    pub products: Vec<CartLine>,
    #[serde(default)]
    pub total_cart_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub(super) struct CartLine {
    #[serde(rename = "_id")]
    pub id: LineItemId,
    pub count: u32,
    pub price: Decimal,
    pub product: ProductRef,
}

/// Cart lines reference their product either as a populated object or as a
/// bare ID (the add-to-cart endpoint does not populate).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ProductRef {
    Populated(Box<PopulatedProduct>),
    Id(ProductId),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PopulatedProduct {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_cover: Option<String>,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub category: Option<Category>,
}

/// `DELETE /cart` response body. The API answers `{"message": "success"}`
/// but may also include the emptied cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClearCartResponse {
    #[serde(default)]
    pub num_of_cart_items: Option<u32>,
    #[serde(default)]
    pub cart_id: Option<CartId>,
    #[serde(default)]
    pub data: Option<CartData>,
}

impl From<ProductRef> for CartProduct {
    fn from(product: ProductRef) -> Self {
        match product {
            ProductRef::Id(id) => Self::bare(id),
            ProductRef::Populated(product) => {
                let product = *product;
                Self {
                    id: product.id,
                    title: product.title,
                    image_url: product.image_cover,
                    brand: product.brand.map(|b| b.name),
                    category: product.category.map(|c| c.name),
                }
            }
        }
    }
}

impl From<CartLine> for CartLineItem {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            product: line.product.into(),
            count: line.count,
            price: line.price,
        }
    }
}

/// Convert a cart response into a snapshot.
///
/// `cartId` at the top level wins over `data._id`; both name the same cart.
pub(super) fn convert_cart(response: CartResponse) -> CartSnapshot {
    let CartResponse {
        num_of_cart_items,
        cart_id,
        data,
    } = response;
    convert_cart_data(num_of_cart_items, cart_id, data)
}

fn convert_cart_data(num_of_cart_items: u32, cart_id: Option<CartId>, data: CartData) -> CartSnapshot {
    CartSnapshot {
        cart_id: cart_id.or(data.id),
        num_of_cart_items,
        products: data.products.into_iter().map(CartLineItem::from).collect(),
        total_cart_price: data.total_cart_price,
    }
}

/// Convert a clear-cart response into the server-confirmed empty snapshot.
pub(super) fn convert_cleared_cart(response: ClearCartResponse, cart_id: &CartId) -> CartSnapshot {
    let cart_id = response.cart_id.unwrap_or_else(|| cart_id.clone());
    match response.data {
        Some(data) => {
            let count = response
                .num_of_cart_items
                .unwrap_or_else(|| u32::try_from(data.products.len()).unwrap_or(u32::MAX));
            convert_cart_data(count, Some(cart_id), data)
        }
        None => CartSnapshot::empty(Some(cart_id)),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order IDs come back as numbers; `_id` is the object ID string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum WireOrderNumber {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireOrder {
    #[serde(rename = "_id")]
    pub object_id: String,
    #[serde(default)]
    pub id: Option<WireOrderNumber>,
    pub total_order_price: Decimal,
    #[serde(default)]
    pub is_delivered: bool,
    #[serde(default)]
    pub cart_items: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<WireOrder> for Order {
    fn from(order: WireOrder) -> Self {
        let id = match order.id {
            Some(WireOrderNumber::Number(n)) => n.to_string(),
            Some(WireOrderNumber::Text(s)) => s,
            None => order.object_id,
        };
        let items = order.cart_items.len();
        let title = if items == 1 {
            format!("Order #{id} (1 item)")
        } else {
            format!("Order #{id} ({items} items)")
        };

        Self {
            id: OrderId::new(id),
            title,
            status: OrderStatus::from_delivery(order.is_delivered),
            date: order.created_at,
            total: order.total_order_price,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_convert_populated_cart() {
        let body = json!({
            "status": "success",
            "numOfCartItems": 2,
            "cartId": "cart-1",
            "data": {
                "_id": "cart-1",
                "cartOwner": "user-1",
                "products": [
                    {
                        "count": 2,
                        "_id": "line-a",
                        "product": {
                            "_id": "prod-a",
                            "title": "Woman Shawl",
                            "imageCover": "https://cdn.example.com/a.jpeg",
                            "brand": { "_id": "b1", "name": "DeFacto", "slug": "defacto" },
                            "category": { "_id": "c1", "name": "Women's Fashion", "slug": "women" }
                        },
                        "price": 149
                    },
                    { "count": 1, "_id": "line-b", "product": "prod-b", "price": 50 }
                ],
                "totalCartPrice": 348
            }
        });

        let response: CartResponse = serde_json::from_value(body).unwrap();
        let cart = convert_cart(response);

        assert_eq!(cart.cart_id, Some(CartId::new("cart-1")));
        assert_eq!(cart.num_of_cart_items, 2);
        assert_eq!(cart.total_cart_price, Decimal::new(348, 0));
        assert_eq!(cart.products[0].product.title.as_deref(), Some("Woman Shawl"));
        assert_eq!(cart.products[0].product.brand.as_deref(), Some("DeFacto"));
        assert_eq!(cart.products[1].product, CartProduct::bare(ProductId::new("prod-b")));
    }

    #[test]
    fn test_cleared_cart_without_data_is_empty() {
        let response: ClearCartResponse =
            serde_json::from_value(json!({ "message": "success" })).unwrap();
        let cart = convert_cleared_cart(response, &CartId::new("cart-1"));

        assert!(cart.is_empty());
        assert_eq!(cart.cart_id, Some(CartId::new("cart-1")));
        assert_eq!(cart.total_cart_price, Decimal::ZERO);
    }

    #[test]
    fn test_cleared_cart_with_data_uses_server_state() {
        let response: ClearCartResponse = serde_json::from_value(json!({
            "status": "success",
            "data": { "products": [], "totalCartPrice": 0 }
        }))
        .unwrap();
        let cart = convert_cleared_cart(response, &CartId::new("cart-9"));

        assert!(cart.is_empty());
        assert_eq!(cart.num_of_cart_items, 0);
        assert_eq!(cart.cart_id, Some(CartId::new("cart-9")));
    }

    #[test]
    fn test_convert_order() {
        let order: WireOrder = serde_json::from_value(json!({
            "_id": "6512f0c1a2",
            "id": 1042,
            "totalOrderPrice": 1299,
            "isPaid": true,
            "isDelivered": false,
            "paymentMethodType": "cash",
            "cartItems": [{ "count": 1 }, { "count": 3 }],
            "createdAt": "2024-03-01T10:15:00.000Z"
        }))
        .unwrap();

        let order = Order::from(order);
        assert_eq!(order.id, OrderId::new("1042"));
        assert_eq!(order.title, "Order #1042 (2 items)");
        assert_eq!(order.status, OrderStatus::Other);
        assert_eq!(order.total, Decimal::new(1299, 0));
    }
}
