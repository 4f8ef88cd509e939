//! Cache types for catalog responses.

use wallmart_core::{BrandId, ProductId};

use super::types::{Brand, Product, ProductPage, ProductQuery};

/// Cache key for catalog entries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
    Brand(BrandId),
    Brands,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
    Brand(Brand),
    Brands(Vec<Brand>),
}
