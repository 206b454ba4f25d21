//! Local JSON cart file.
//!
//! Holds both storage scopes of one visitor, so the CLI can replay page
//! loads and checkouts against a cart on disk:
//!
//! ```json
//! {
//!   "local":   { "creator_cart": "[...]" },
//!   "session": { "checkout_initiated": "true" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use creator_storefront_core::MemoryStorage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CliError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CartFileData {
    #[serde(default)]
    local: BTreeMap<String, String>,
    #[serde(default)]
    session: BTreeMap<String, String>,
}

/// A visitor's storage, loaded from and saved to one JSON file.
#[derive(Debug)]
pub struct CartFile {
    path: PathBuf,
    /// Durable storage (the cart).
    pub local: MemoryStorage,
    /// Session-scoped flags and caches.
    pub session: MemoryStorage,
}

impl CartFile {
    /// Open `path`; a missing file is an empty visitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CliError> {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<CartFileData>(&raw).map_err(|source| {
                CliError::CorruptCartFile {
                    path: path.display().to_string(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Cart file not found, starting empty");
                CartFileData::default()
            }
            Err(source) => {
                return Err(CliError::CartFile {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        Ok(Self {
            path,
            local: data.local.into_iter().collect(),
            session: data.session.into_iter().collect(),
        })
    }

    /// Write both scopes back to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self) -> Result<(), CliError> {
        let data = CartFileData {
            local: to_map(&self.local),
            session: to_map(&self.session),
        };
        let json = serde_json::to_string_pretty(&data)?;
        std::fs::write(&self.path, json).map_err(|source| CliError::CartFile {
            path: self.path.display().to_string(),
            source,
        })?;
        debug!(path = %self.path.display(), "Cart file saved");
        Ok(())
    }
}

fn to_map(storage: &MemoryStorage) -> BTreeMap<String, String> {
    storage
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
