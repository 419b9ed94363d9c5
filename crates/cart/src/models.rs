//! Cart data model and pure reducer operations.
//!
//! `CartState` is a plain value: every operation here is a total function
//! over the in-memory state with no I/O. Persistence is layered on top by
//! [`crate::store::CartStore`], which keeps the reducer independently
//! testable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fernway_core::ProductId;

/// A single product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Opaque product identifier. Unique across the cart.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Per-unit price, currency-agnostic. Never negative for a stored item.
    pub unit_price: Decimal,
    /// Ordered image references. May be empty and is omitted on the wire
    /// when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_refs: Vec<String>,
    /// Units of this product in the cart. At least 1 while the item exists.
    pub quantity: u32,
}

/// The full cart: an ordered sequence of line items with unique ids.
///
/// Insertion order is preserved for new items; quantity updates keep the
/// item's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    /// Line items, ids unique across the sequence.
    pub items: Vec<LineItem>,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add an item with merge-by-id semantics.
    ///
    /// If an item with the same id already exists, its quantity is increased
    /// by `item.quantity` (saturating); quantities accumulate, never
    /// overwrite. Otherwise the item is appended. Adding a zero-quantity item
    /// is ignored so that no stored item ever has `quantity == 0`.
    ///
    /// Returns `true` if the state changed.
    pub fn add_item(&mut self, item: LineItem) -> bool {
        if item.quantity == 0 {
            return false;
        }
        if let Some(existing) = self.items.iter_mut().find(|e| e.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
        true
    }

    /// Remove the item with the given id.
    ///
    /// Returns `true` if an item was removed; an unknown id is a no-op.
    pub fn remove_item(&mut self, id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        self.items.len() != before
    }

    /// Set the quantity of the item with the given id.
    ///
    /// A target of zero or below removes the item entirely; a non-positive
    /// quantity is never stored. An unknown id is a no-op.
    ///
    /// Returns `true` if an item with that id was found.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) -> bool {
        let Some(pos) = self.items.iter().position(|item| &item.id == id) else {
            return false;
        };
        if quantity <= 0 {
            self.items.remove(pos);
        } else if let Some(item) = self.items.get_mut(pos) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        true
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of units across all items (for UI badges).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `quantity * unit_price` across all items (for order summaries).
    ///
    /// Saturates at `Decimal::MAX` rather than panicking when a line or the
    /// sum exceeds the representable range.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().fold(Decimal::ZERO, |acc, item| {
            acc.saturating_add(Decimal::from(item.quantity).saturating_mul(item.unit_price))
        })
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
