//! Catalog and auth types for the Remote Commerce API.
//!
//! Catalog payloads deserialize straight into these types. Cart and order
//! payloads go through `conversions` into the `wallmart_core` snapshot types.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use wallmart_core::{BrandId, CategoryId, Email, Phone, ProductId, UserId};

// =============================================================================
// Catalog Types
// =============================================================================

/// A product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub price_after_discount: Option<Decimal>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub brand: Option<Brand>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub ratings_average: Option<f64>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl Product {
    /// The price the customer pays: the discounted price when one is set.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        self.price_after_discount.unwrap_or(self.price)
    }
}

/// Pagination metadata for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: u32,
    pub number_of_pages: u32,
    #[serde(default)]
    pub next_page: Option<u32>,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            current_page: 1,
            number_of_pages: 1,
            next_page: None,
        }
    }
}

/// A page of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(rename = "metadata", default)]
    pub page_info: PageInfo,
    #[serde(rename = "data")]
    pub products: Vec<Product>,
}

/// Product listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProductQuery {
    /// 1-based page number.
    pub page: u32,
    /// Restrict to one brand.
    pub brand: Option<BrandId>,
}

impl ProductQuery {
    /// All products, given page.
    #[must_use]
    pub const fn page(page: u32) -> Self {
        Self { page, brand: None }
    }

    /// Products of one brand, given page.
    #[must_use]
    pub const fn brand(brand: BrandId, page: u32) -> Self {
        Self {
            page,
            brand: Some(brand),
        }
    }
}

// =============================================================================
// Auth Types
// =============================================================================

/// User profile returned by the sign-in and sign-up endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Result of a successful sign-in or sign-up.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    /// Bearer token for user-scoped endpoints.
    pub token: SecretString,
}

/// Registration payload.
///
/// Implements `Debug` manually to redact the passwords.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub re_password: String,
    pub phone: Phone,
}

impl std::fmt::Debug for SignUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUp")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("re_password", &"[REDACTED]")
            .field("phone", &self.phone)
            .finish()
    }
}

/// Identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenIdentity {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}
