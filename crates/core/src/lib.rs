//! Fernway Core - Shared types library.
//!
//! This crate provides common types used across all Fernway components:
//! - `cart` - Client-side cart state container and checkout client
//! - `cli` - Command-line tools for inspecting and managing the cart slot
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe product and order identifiers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
