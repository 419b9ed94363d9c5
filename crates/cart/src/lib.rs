//! Fernway Cart library.
//!
//! The authoritative client-side record of items a shopper intends to
//! purchase. The cart survives restarts through a durable key-value slot and
//! exposes derived read-only views (item count, total) for display.
//!
//! # Architecture
//!
//! - [`models`] - Cart data model and pure reducer operations
//! - [`storage`] - Durable slot abstraction with file and in-memory backends
//! - [`store`] - The orchestrating store: load, mutate, then persist
//! - [`checkout`] - Order submission client and eviction-retry flow
//! - [`config`] - Environment-driven configuration
//!
//! Mutations never fail from the caller's perspective: storage problems are
//! logged and the in-memory state remains authoritative for the session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod models;
pub mod storage;
pub mod store;

pub use models::{CartState, LineItem};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};
pub use store::CartStore;
