//! The cart store: owns the in-memory state and persists after mutations.
//!
//! `CartStore` is the single writer for the cart. It is explicitly
//! constructed with a storage backend and threaded through whatever layer
//! needs it; there is no ambient singleton. Every mutation applies the pure
//! reducer from [`crate::models`] and then writes the whole state back to
//! the durable slot.
//!
//! Storage failures never surface to callers: a cart that cannot be loaded
//! starts empty, and a failed persist leaves the in-memory state
//! authoritative for the session. Both are logged.

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use fernway_core::ProductId;

use crate::models::{CartState, LineItem};
use crate::storage::{CartStorage, slots};

/// Persisted cart store.
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    state: CartState,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the store, reading the durable slot.
    ///
    /// An absent, empty, or unreadable slot yields an empty cart; this is a
    /// recoverable condition, not an error. Items failing validation
    /// (non-positive quantity, negative unit price, malformed fields) are
    /// dropped and the dropped count is logged.
    pub fn open(storage: S) -> Self {
        let state = match storage.read(slots::CART) {
            Ok(Some(raw)) => sanitize(&raw),
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!(error = %e, "failed to read cart slot, starting with an empty cart");
                CartState::new()
            }
        };
        Self { state, storage }
    }

    /// Add an item with merge-by-id semantics and persist.
    pub fn add_item(&mut self, item: LineItem) {
        if self.state.add_item(item) {
            self.persist();
        }
    }

    /// Remove the item with the given id (no-op if absent) and persist.
    ///
    /// Returns `true` if an item was removed.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let removed = self.state.remove_item(id);
        self.persist();
        removed
    }

    /// Set an item's quantity; zero or below removes the item.
    ///
    /// Persists only when an item with that id was found.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        if self.state.update_quantity(id, quantity) {
            self.persist();
        }
    }

    /// Empty the cart unconditionally and persist the empty state.
    pub fn clear(&mut self) {
        self.state.clear();
        self.persist();
    }

    /// Current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.state.items
    }

    /// Read-only view of the full state.
    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state.item_count()
    }

    /// Sum of `quantity * unit_price` across all items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.state.total()
    }

    /// Write the current state to the durable slot.
    ///
    /// Failures are logged; the in-memory state is not rolled back.
    fn persist(&self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize cart state, skipping persist");
                return;
            }
        };
        if let Err(e) = self.storage.write(slots::CART, &json) {
            warn!(error = %e, "failed to persist cart, in-memory state remains authoritative");
        }
    }
}

/// Raw persisted shape: items are kept as loose JSON so one malformed entry
/// does not discard the rest of the cart.
#[derive(Deserialize)]
struct StoredCart {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// Validate raw slot contents into a well-formed `CartState`.
///
/// Items must deserialize with a positive integer quantity and a
/// non-negative unit price; anything else is dropped. Duplicate ids are
/// merged through the same reducer as live additions, re-establishing the
/// unique-id invariant with accumulate semantics.
fn sanitize(raw: &str) -> CartState {
    let stored: StoredCart = match serde_json::from_str(raw) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(error = %e, "discarding unreadable cart data");
            return CartState::new();
        }
    };

    let mut state = CartState::new();
    let mut dropped = 0_usize;
    for value in stored.items {
        match serde_json::from_value::<LineItem>(value) {
            Ok(item) if item.quantity >= 1 && item.unit_price >= Decimal::ZERO => {
                state.add_item(item);
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(dropped, "dropped invalid cart items on load");
    }
    state
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    fn item(id: &str, quantity: u32, unit_price: u32) -> LineItem {
        LineItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Decimal::from(unit_price),
            image_refs: Vec::new(),
            quantity,
        }
    }

    #[test]
    fn test_open_with_empty_storage_yields_empty_cart() {
        let store = CartStore::open(MemoryStorage::new());
        assert!(store.items().is_empty());
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.total(), Decimal::ZERO);
    }

    #[test]
    fn test_open_with_corrupted_slot_yields_empty_cart() {
        let storage = MemoryStorage::new();
        storage.seed(slots::CART, "not json at all {{{");

        let store = CartStore::open(storage);
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_open_drops_invalid_items_keeps_valid_ones() {
        let storage = MemoryStorage::new();
        storage.seed(
            slots::CART,
            r#"{"items":[
                {"id":"bad","name":"Bad","unit_price":10,"quantity":-1},
                {"id":"good","name":"Good","unit_price":10,"quantity":2}
            ]}"#,
        );

        let store = CartStore::open(storage);
        assert_eq!(store.items().len(), 1);
        let only = store.items().first().unwrap();
        assert_eq!(only.id.as_str(), "good");
        assert_eq!(only.quantity, 2);
    }

    #[test]
    fn test_open_drops_zero_quantity_and_negative_price() {
        let storage = MemoryStorage::new();
        storage.seed(
            slots::CART,
            r#"{"items":[
                {"id":"zero","name":"Zero","unit_price":10,"quantity":0},
                {"id":"neg","name":"Neg","unit_price":-5,"quantity":1},
                {"id":"nan","name":"NaN","unit_price":10,"quantity":"two"},
                {"id":"ok","name":"Ok","unit_price":0,"quantity":1}
            ]}"#,
        );

        let store = CartStore::open(storage);
        let ids: Vec<&str> = store.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["ok"]);
    }

    #[test]
    fn test_open_merges_duplicate_ids() {
        let storage = MemoryStorage::new();
        storage.seed(
            slots::CART,
            r#"{"items":[
                {"id":"a","name":"A","unit_price":10,"quantity":2},
                {"id":"a","name":"A","unit_price":10,"quantity":3}
            ]}"#,
        );

        let store = CartStore::open(storage);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items().first().unwrap().quantity, 5);
    }

    #[test]
    fn test_mutations_persist_and_reload() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage);
        store.add_item(item("a", 2, 100));
        store.add_item(item("b", 1, 50));
        store.update_quantity(&ProductId::new("b"), 4);

        let raw = store.storage.read(slots::CART).unwrap().unwrap();
        let reloaded = sanitize(&raw);
        assert_eq!(reloaded, *store.state());
    }

    #[test]
    fn test_clear_persists_empty_cart() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage);
        store.add_item(item("a", 2, 100));
        store.clear();

        assert!(store.items().is_empty());
        let raw = store.storage.read(slots::CART).unwrap().unwrap();
        assert_eq!(raw, r#"{"items":[]}"#);
    }

    #[test]
    fn test_update_quantity_on_missing_id_does_not_persist() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage);
        store.update_quantity(&ProductId::new("missing"), 5);

        // Nothing was found, so nothing was written.
        assert!(store.storage.read(slots::CART).unwrap().is_none());
    }

    #[test]
    fn test_idempotent_removal_end_state() {
        let storage = MemoryStorage::new();
        let mut store = CartStore::open(storage);
        store.add_item(item("a", 2, 100));

        assert!(store.remove_item(&ProductId::new("a")));
        let after_first = store.state().clone();
        assert!(!store.remove_item(&ProductId::new("a")));
        assert_eq!(*store.state(), after_first);
    }

    /// Backend that accepts reads but rejects every write.
    struct ReadOnlyStorage;

    impl CartStorage for ReadOnlyStorage {
        fn read(&self, _slot: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn write(&self, _slot: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("quota exceeded")))
        }
    }

    #[test]
    fn test_persist_failure_keeps_in_memory_state() {
        let mut store = CartStore::open(ReadOnlyStorage);
        store.add_item(item("a", 2, 100));
        store.update_quantity(&ProductId::new("a"), 3);

        // Every persist failed, but the session state is intact and usable.
        assert_eq!(store.item_count(), 3);
        assert_eq!(store.total(), Decimal::from(300));
    }
}
