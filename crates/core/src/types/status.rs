//! Order status shown in the order history.

use serde::{Deserialize, Serialize};

/// Order status as displayed to the customer.
///
/// The Remote Commerce API tracks payment and delivery flags; the storefront
/// collapses them into a two-state status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// The order has been delivered.
    Completed,
    /// Any state before delivery.
    #[default]
    Other,
}

impl OrderStatus {
    /// Derive the display status from the API's delivery flag.
    #[must_use]
    pub const fn from_delivery(is_delivered: bool) -> Self {
        if is_delivered {
            Self::Completed
        } else {
            Self::Other
        }
    }

    /// Whether the order is completed.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Other => write!(f, "Processing"),
        }
    }
}
