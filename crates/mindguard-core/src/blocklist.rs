//! Durable set of blocked applications.
//!
//! The set is read from the key-value store once at construction and cached.
//! Mutations build a new set, write it through to storage and only then swap
//! it in, all under the write lock: a failed write leaves the cache untouched
//! and a `contains` after a successful `add`/`remove` always sees it.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::error::{CoreError, StorageError};
use crate::identity::AppIdentityResolver;
use crate::storage::KeyValueStore;

/// Key holding the JSON array of blocked entries.
pub const BLOCKED_APPS_KEY: &str = "blocked_apps_set";

pub struct BlockListStore {
    kv: Arc<dyn KeyValueStore>,
    resolver: Arc<AppIdentityResolver>,
    entries: RwLock<BTreeSet<String>>,
}

impl BlockListStore {
    /// Read the persisted set.
    ///
    /// # Errors
    /// Returns a `StorageError` if the key cannot be read or holds malformed JSON.
    pub fn load(
        kv: Arc<dyn KeyValueStore>,
        resolver: Arc<AppIdentityResolver>,
    ) -> Result<Self, StorageError> {
        let entries = match kv.get(BLOCKED_APPS_KEY)? {
            Some(raw) => serde_json::from_str::<BTreeSet<String>>(&raw).map_err(|source| {
                StorageError::Codec {
                    key: BLOCKED_APPS_KEY.to_string(),
                    source,
                }
            })?,
            None => BTreeSet::new(),
        };
        debug!(count = entries.len(), "Loaded block list");
        Ok(Self {
            kv,
            resolver,
            entries: RwLock::new(entries),
        })
    }

    /// Insert an entry verbatim. Returns `false` when it was already present.
    pub fn add(&self, app_id: &str) -> Result<bool, CoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.contains(app_id) {
            return Ok(false);
        }

        let mut next = entries.clone();
        next.insert(app_id.to_string());
        self.persist(&next)?;
        *entries = next;
        info!(app = app_id, "Blocked app");
        Ok(true)
    }

    /// Remove an entry. Returns `false` when it was not present.
    pub fn remove(&self, app_id: &str) -> Result<bool, CoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains(app_id) {
            return Ok(false);
        }

        let mut next = entries.clone();
        next.remove(app_id);
        self.persist(&next)?;
        *entries = next;
        info!(app = app_id, "Unblocked app");
        Ok(true)
    }

    /// Membership by raw identifier or by its resolved display name.
    pub fn contains(&self, app_id: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains(app_id) || entries.contains(self.resolver.resolve(app_id))
    }

    /// Snapshot of the stored entries, sorted.
    pub fn list(&self) -> BTreeSet<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &BTreeSet<String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries).map_err(|source| StorageError::Codec {
            key: BLOCKED_APPS_KEY.to_string(),
            source,
        })?;
        self.kv.set(BLOCKED_APPS_KEY, &raw)
    }
}
