//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// The Remote Commerce API reports every amount as a bare number in the
/// store currency; `Price` attaches the currency for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., pounds, not piastres).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency.
    #[must_use]
    pub fn store(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// Format for display with two decimal places (e.g., `"EGP 1499.00"`).
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{} {:.2}",
            self.currency_code.code(),
            self.amount.round_dp(2)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    EGP,
    USD,
    EUR,
}

impl CurrencyCode {
    /// The three-letter currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EGP => "EGP",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}
