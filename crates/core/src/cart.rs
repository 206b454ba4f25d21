//! Cart items, identity/merge rules and the persisted cart store.
//!
//! A cart line is identified by `(variant_id, size)`. Adding an item whose
//! key is already present bumps that line by one; quantities never rest at
//! zero, a line that would reach zero is removed.
//!
//! [`CartStore`] owns the cart and writes the whole cart to storage after
//! every mutation. A mutation is committed to memory only after the write
//! succeeds, so memory and storage never disagree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{Storage, StorageError, keys};
use crate::types::{CreatorRef, Price, ProductId, VariantId};

/// A cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub handle: String,
    pub title: String,
    /// Price per unit at the time the line was added.
    pub unit_price: Decimal,
    /// Selected size; empty for products without sizes.
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub creator_ref: Option<CreatorRef>,
}

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub variant_id: VariantId,
    pub size: String,
}

impl CartItem {
    /// The line's identity key.
    #[must_use]
    pub fn key(&self) -> ItemKey {
        ItemKey {
            variant_id: self.variant_id.clone(),
            size: self.size.clone(),
        }
    }

    fn has_key(&self, key: &ItemKey) -> bool {
        self.variant_id == key.variant_id && self.size == key.size
    }

    /// `unit_price × quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Ordered cart lines, at most one per [`ItemKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from arbitrary lines, restoring the cart invariants:
    /// zero-quantity lines are dropped and lines sharing a key are merged
    /// into the first occurrence (quantities summed).
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.quantity == 0 {
                continue;
            }
            let key = item.key();
            match cart.items.iter_mut().find(|line| line.has_key(&key)) {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => cart.items.push(item),
            }
        }
        cart
    }

    /// Lines in display order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the line with this key.
    #[must_use]
    pub fn position(&self, key: &ItemKey) -> Option<usize> {
        self.items.iter().position(|line| line.has_key(key))
    }

    /// Increment the matching line by one, or append `item`.
    ///
    /// The stored line keeps its own price on increment. An appended line
    /// always has a quantity of at least one. Returns the line's index.
    pub fn add_or_increment(&mut self, mut item: CartItem) -> usize {
        if let Some(index) = self.position(&item.key()) {
            if let Some(line) = self.items.get_mut(index) {
                line.quantity = line.quantity.saturating_add(1);
            }
            return index;
        }

        item.quantity = item.quantity.max(1);
        self.items.push(item);
        self.items.len() - 1
    }

    /// Apply `delta` to the line at `index`, clamping at zero and removing
    /// the line when it reaches zero.
    ///
    /// Returns the new quantity (`Some(0)` when removed), or `None` when the
    /// index is out of range.
    pub fn adjust_quantity(&mut self, index: usize, delta: i64) -> Option<u32> {
        let line = self.items.get_mut(index)?;
        let next = (i64::from(line.quantity).saturating_add(delta)).max(0);
        if next == 0 {
            self.items.remove(index);
            return Some(0);
        }
        line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        Some(line.quantity)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// `Σ quantity`.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// `Σ unit_price × quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.line_total()))
    }

    /// Display projection of the cart.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from(self)
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<CartItem>::deserialize(deserializer)?;
        Ok(Self::from_items(items))
    }
}

// =============================================================================
// Display Projection
// =============================================================================

/// One cart line, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub index: usize,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub handle: String,
    pub title: String,
    pub size: Option<String>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        let items = cart
            .items()
            .iter()
            .enumerate()
            .map(|(index, line)| CartLineView {
                index,
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                handle: line.handle.clone(),
                title: line.title.clone(),
                size: (!line.size.is_empty()).then(|| line.size.clone()),
                image_url: line.image_url.clone(),
                quantity: line.quantity,
                price: Price::usd(line.unit_price).display(),
                line_price: Price::usd(line.line_total()).display(),
            })
            .collect();

        Self {
            items,
            subtotal: Price::usd(cart.total_price()).display(),
            item_count: cart.total_quantity(),
        }
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// The cart plus the storage it is persisted to.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
    cart: Cart,
}

impl<S: Storage> CartStore<S> {
    /// Load the persisted cart.
    ///
    /// Missing, unreadable or malformed data yields an empty cart; it is never
    /// an error.
    pub fn load(storage: S) -> Self {
        let cart = match storage.get(keys::CART) {
            Ok(Some(raw)) => serde_json::from_str::<Cart>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding malformed persisted cart");
                Cart::new()
            }),
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Persisted cart unreadable, starting empty");
                Cart::new()
            }
        };

        debug!(lines = cart.len(), "Cart loaded");
        Self { storage, cart }
    }

    /// Persist the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save(&mut self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.cart)?;
        self.storage.set(keys::CART, json)
    }

    /// Persist `next`, then make it the current cart.
    fn commit(&mut self, next: Cart) -> Result<(), StorageError> {
        let json = serde_json::to_string(&next)?;
        self.storage.set(keys::CART, json)?;
        self.cart = next;
        Ok(())
    }

    /// See [`Cart::add_or_increment`].
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted; the in-memory cart
    /// is then left unchanged.
    pub fn add_or_increment(&mut self, item: CartItem) -> Result<usize, StorageError> {
        let mut next = self.cart.clone();
        let index = next.add_or_increment(item);
        self.commit(next)?;
        Ok(index)
    }

    /// See [`Cart::adjust_quantity`]. An out-of-range index changes nothing
    /// and writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted; the in-memory cart
    /// is then left unchanged.
    pub fn adjust_quantity(
        &mut self,
        index: usize,
        delta: i64,
    ) -> Result<Option<u32>, StorageError> {
        let mut next = self.cart.clone();
        let Some(quantity) = next.adjust_quantity(index, delta) else {
            return Ok(None);
        };
        self.commit(next)?;
        Ok(Some(quantity))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the empty cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(Cart::new())
    }

    /// Read access to the cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Owned copy of the cart.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.cart.clone()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.cart.total_quantity()
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.cart.total_price()
    }

    /// Release the storage.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn item(variant: &str, size: &str, price: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(format!("p-{variant}")),
            variant_id: VariantId::new(variant),
            handle: format!("tee-{variant}"),
            title: "Tour Tee".to_string(),
            unit_price: Decimal::new(price, 0),
            size: size.to_string(),
            image_url: None,
            quantity: 1,
            creator_ref: Some(CreatorRef::new("maya")),
        }
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage(MemoryStorage);

    impl Storage for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }
    }

    #[test]
    fn test_add_to_empty_cart() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_or_increment(item("v1", "M", 20)).unwrap();

        assert_eq!(store.total_quantity(), 1);
        assert_eq!(store.total_price(), Decimal::new(20, 0));
    }

    #[test]
    fn test_same_key_merges() {
        let mut cart = Cart::new();
        for _ in 0..5 {
            cart.add_or_increment(item("v1", "M", 20));
        }

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_size_is_part_of_identity() {
        let mut cart = Cart::new();
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v1", "L", 20));
        cart.add_or_increment(item("v2", "M", 30));

        assert_eq!(cart.len(), 3);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_increment_keeps_stored_price() {
        let mut cart = Cart::new();
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v1", "M", 25));

        assert_eq!(cart.items()[0].unit_price, Decimal::new(20, 0));
        assert_eq!(cart.total_price(), Decimal::new(40, 0));
    }

    #[test]
    fn test_append_zero_quantity_stored_as_one() {
        let mut cart = Cart::new();
        let mut zero = item("v1", "M", 20);
        zero.quantity = 0;
        cart.add_or_increment(zero);

        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn test_adjust_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v1", "M", 20));

        assert_eq!(cart.adjust_quantity(0, -2), Some(0));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_adjust_below_zero_clamps_and_removes() {
        let mut cart = Cart::new();
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v2", "M", 20));

        assert_eq!(cart.adjust_quantity(0, -10), Some(0));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].variant_id.as_str(), "v2");
        assert!(cart.items().iter().all(|line| line.quantity >= 1));
    }

    #[test]
    fn test_adjust_out_of_range() {
        let mut cart = Cart::new();
        cart.add_or_increment(item("v1", "M", 20));

        assert_eq!(cart.adjust_quantity(3, 1), None);
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_total_price_sums_lines() {
        let mut cart = Cart::new();
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v2", "S", 35));
        cart.adjust_quantity(1, 2);

        let expected: Decimal = cart
            .items()
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();
        assert_eq!(cart.total_price(), expected);
        assert_eq!(cart.total_price(), Decimal::new(145, 0));
    }

    #[test]
    fn test_oversized_price_saturates() {
        let mut huge = item("v1", "M", 0);
        huge.unit_price = Decimal::MAX;
        huge.quantity = 2;
        let mut cart = Cart::from_items([huge, item("v2", "S", 35)]);

        assert_eq!(cart.items()[0].line_total(), Decimal::MAX);
        assert_eq!(cart.total_price(), Decimal::MAX);
        assert_eq!(cart.summary().item_count, 3);

        cart.adjust_quantity(0, -2);
        assert_eq!(cart.total_price(), Decimal::new(35, 0));
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_or_increment(item("v1", "M", 20)).unwrap();
        store.add_or_increment(item("v1", "M", 20)).unwrap();
        store.adjust_quantity(0, 3).unwrap();

        let storage = store.into_storage();
        let reloaded = CartStore::load(storage);
        assert_eq!(reloaded.total_quantity(), 5);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_or_increment(item("v1", "M", 20)).unwrap();
        store.add_or_increment(item("v2", "", 15)).unwrap();
        store.save().unwrap();
        let before = store.snapshot();

        let reloaded = CartStore::load(store.into_storage());
        assert_eq!(reloaded.snapshot(), before);
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(keys::CART, "{not json".to_string()).unwrap();

        let store = CartStore::load(storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_repairs_invariants() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                keys::CART,
                r#"[
                    {"productId":"p1","variantId":"v1","handle":"tee","title":"Tee","unitPrice":20,"size":"M","quantity":1},
                    {"productId":"p1","variantId":"v1","handle":"tee","title":"Tee","unitPrice":"20.00","size":"M","quantity":2},
                    {"productId":"p2","variantId":"v2","handle":"cap","title":"Cap","unitPrice":"12.50","quantity":0}
                ]"#
                .to_string(),
            )
            .unwrap();

        let store = CartStore::load(storage);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.total_quantity(), 3);
        assert_eq!(store.total_price(), Decimal::new(60, 0));
    }

    #[test]
    fn test_failed_write_leaves_cart_unchanged() {
        let mut store = CartStore::load(ReadOnlyStorage(MemoryStorage::new()));

        assert!(store.add_or_increment(item("v1", "M", 20)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_persists_empty_array() {
        let mut store = CartStore::load(MemoryStorage::new());
        store.add_or_increment(item("v1", "M", 20)).unwrap();
        store.clear().unwrap();

        let storage = store.into_storage();
        assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_summary_formats_prices() {
        let mut cart = Cart::new();
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v1", "M", 20));
        cart.add_or_increment(item("v2", "", 5));

        let summary = cart.summary();
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal, "$45.00");
        assert_eq!(summary.items[0].line_price, "$40.00");
        assert_eq!(summary.items[0].size.as_deref(), Some("M"));
        assert_eq!(summary.items[1].size, None);
        assert_eq!(summary.items[1].index, 1);
    }
}
