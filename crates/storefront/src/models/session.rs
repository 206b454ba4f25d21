//! Session-backed storage for the storefront core.
//!
//! The core state machine is synchronous; the session store is not. A
//! handler loads the keys it needs into a [`SessionStorage`] snapshot, runs
//! the core operation against it, then flushes the keys it changed back to
//! the session before responding. Every core write therefore reaches the
//! session store within the same request.

use std::collections::BTreeSet;

use creator_storefront_core::pricing;
use creator_storefront_core::storage::keys;
use creator_storefront_core::{MemoryStorage, ReferralId, Storage, StorageError};
use tower_sessions::Session;
use tracing::debug;

/// Keys making up the durable cart scope.
pub const CART_SCOPE: &[&str] = &[keys::CART];

/// Keys making up the session scope: lifecycle flag, pricing cache and view.
pub const SESSION_SCOPE: &[&str] = &[
    keys::CHECKOUT_INITIATED,
    keys::PRICING_DELTA,
    keys::CREATOR_PRODUCTS,
    keys::REFERRAL_ID,
    keys::VIEW_STATE,
];

/// A snapshot of selected session keys with write tracking.
///
/// Only keys passed to [`SessionStorage::load`] are visible.
#[derive(Debug, Default)]
pub struct SessionStorage {
    values: MemoryStorage,
    dirty: BTreeSet<String>,
}

impl SessionStorage {
    /// Read `keys` from the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(
        session: &Session,
        keys: &[&str],
    ) -> Result<Self, tower_sessions::session::Error> {
        let mut values = MemoryStorage::new();
        for key in keys {
            if let Some(value) = session.get::<String>(key).await? {
                // MemoryStorage writes are infallible
                let _ = values.set(key, value);
            }
        }
        Ok(Self {
            values,
            dirty: BTreeSet::new(),
        })
    }

    /// Write changed keys back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects a write.
    pub async fn flush(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        for key in &self.dirty {
            match self.values.get(key).ok().flatten() {
                Some(value) => session.insert(key, value).await?,
                None => {
                    session.remove::<String>(key).await?;
                }
            }
        }
        if !self.dirty.is_empty() {
            debug!(keys = ?self.dirty, "Session keys flushed");
        }
        Ok(())
    }

    /// Whether any key was written since loading.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

/// The referral id captured on the last page load, if any.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn referral_id(
    session: &Session,
) -> Result<Option<ReferralId>, tower_sessions::session::Error> {
    let storage = SessionStorage::load(session, &[keys::REFERRAL_ID]).await?;
    Ok(pricing::referral_id(&storage))
}

impl Storage for SessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.values.set(key, value)?;
        self.dirty.insert(key.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.values.get(key)?.is_some() {
            self.values.remove(key)?;
            self.dirty.insert(key.to_owned());
        }
        Ok(())
    }
}
