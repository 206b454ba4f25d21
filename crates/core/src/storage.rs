//! Key-value storage seam.
//!
//! The storefront persists everything as string values under well-known
//! keys, the same way a browser theme uses `localStorage`/`sessionStorage`.
//! Hosts provide a [`Storage`] implementation: [`MemoryStorage`] for tests,
//! a JSON file for the CLI, the visitor's HTTP session for the server.

use std::collections::BTreeMap;

use thiserror::Error;

/// Storage keys shared by every host.
pub mod keys {
    /// Durable cart: JSON array of cart items.
    pub const CART: &str = "creator_cart";

    /// Set right before redirecting to checkout, cleared on the next page load.
    pub const CHECKOUT_INITIATED: &str = "checkout_initiated";

    /// Cached creator pricing delta (decimal percentage).
    pub const PRICING_DELTA: &str = "pricing_delta";

    /// Cached creator product list (JSON array of product handles).
    pub const CREATOR_PRODUCTS: &str = "creator_products";

    /// Referral id captured from the landing URL.
    pub const REFERRAL_ID: &str = "referral_id";

    /// Serialized view state.
    pub const VIEW_STATE: &str = "view_state";

    /// Session-cached values purged on every page load.
    pub const EPHEMERAL: &[&str] = &[PRICING_DELTA, CREATOR_PRODUCTS, REFERRAL_ID];
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A value could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value storage.
///
/// Writes are synchronous: once `set`/`remove` returns `Ok`, a following
/// `get` observes the new value.
pub trait Storage {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Whether a boolean flag is set (stored as `"true"`).
    fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(value)) if value == "true")
    }
}

impl<S: Storage + ?Sized> Storage for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over stored entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for MemoryStorage {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}
