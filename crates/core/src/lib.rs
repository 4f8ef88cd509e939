//! WallMart Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront binary and its
//! integration tests:
//! - Type-safe string IDs for remote commerce entities
//! - Validated contact types (`Email`, `Phone`)
//! - Cart snapshots and order summaries as the storefront displays them
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O and no HTTP clients. Wire
//! formats of the Remote Commerce API live in the storefront crate and are
//! converted into these types at the client boundary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
