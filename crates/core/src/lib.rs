//! Basket Core - Shared cart types.
//!
//! This crate provides the value types every Basket component agrees on:
//! - `cart` - The cart state manager (store, persistence, notifications)
//! - `cli` - Command-line front end over a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no timers, no storage
//! access. Prices are normalized to integer minor units the moment they are
//! deserialized, so nothing downstream ever branches on how a price was
//! written.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for SKUs and prices, plus the `LineItem` record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
