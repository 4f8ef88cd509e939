//! Core types for the WallMart storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod phone;
pub mod price;
pub mod status;

pub use cart::{CartLineItem, CartProduct, CartSnapshot};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::Order;
pub use phone::{Phone, PhoneError};
pub use price::{CurrencyCode, Price};
pub use status::OrderStatus;
