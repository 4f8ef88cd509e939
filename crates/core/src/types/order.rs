//! Order history entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::OrderId;
use super::price::Price;
use super::status::OrderStatus;

/// A past order, read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub title: String,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    pub total: Decimal,
}

impl Order {
    /// The order total as a displayable price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::store(self.total)
    }
}
