//! Core types for Basket.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod line_item;
pub mod price;
pub mod sku;

pub use line_item::LineItem;
pub use price::{Price, PriceError};
pub use sku::{Sku, SkuError};
