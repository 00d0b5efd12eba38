//! Persisted dismissal state.
//!
//! The engine talks to a typed key-value store through [`DismissalSettings`],
//! which binds the two dismissal slots to a storage group. Surfaces sharing a
//! group (and a backing store) see the same state.

use campaign_core::{CampaignError, CampaignResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub const HAS_DISMISSED_BANNER_KEY: &str = "hasDismissedBanner";
pub const LAST_SEEN_CAMPAIGN_ID_KEY: &str = "lastSeenCampaignId";

/// Typed, synchronous key-value storage. Writing `None` clears the slot.
pub trait KeyValueStore: Send + Sync {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn set_bool(&self, key: &str, value: Option<bool>);
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&self, key: &str, value: Option<String>);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Bool(bool),
    String(String),
}

/// Process-local store backed by DashMap.
#[derive(Default)]
pub struct MemoryStore {
    values: DashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    fn put(&self, key: &str, value: Option<StoredValue>) {
        match value {
            Some(value) => {
                self.values.insert(key.to_string(), value);
            }
            None => {
                self.values.remove(key);
            }
        }
    }

    fn replace(&self, values: BTreeMap<String, StoredValue>) {
        self.values.clear();
        for (key, value) in values {
            self.values.insert(key, value);
        }
    }

    fn to_map(&self) -> BTreeMap<String, StoredValue> {
        self.values
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)?.value() {
            StoredValue::Bool(value) => Some(*value),
            StoredValue::String(_) => None,
        }
    }

    fn set_bool(&self, key: &str, value: Option<bool>) {
        self.put(key, value.map(StoredValue::Bool));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.values.get(key)?.value() {
            StoredValue::String(value) => Some(value.clone()),
            StoredValue::Bool(_) => None,
        }
    }

    fn set_string(&self, key: &str, value: Option<String>) {
        self.put(key, value.map(StoredValue::String));
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Every access re-reads the file so stores opened on the same path by
/// different surfaces observe each other's writes. A write reloads the file,
/// applies the one key, and replaces the file through a temp file rename.
/// Read and write failures are logged and the last loaded view is served.
pub struct JsonFileStore {
    path: PathBuf,
    cache: MemoryStore,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store, loading existing values when the file is present.
    pub fn open(path: impl Into<PathBuf>) -> CampaignResult<Self> {
        let path = path.into();
        let cache = MemoryStore::new();
        cache.replace(read_file(&path)?);

        debug!(path = %path.display(), entries = cache.len(), "Opened dismissal state file");
        Ok(Self {
            path,
            cache,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reload(&self) {
        match read_file(&self.path) {
            Ok(values) => self.cache.replace(values),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to reload dismissal state")
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.write_file() {
            warn!(path = %self.path.display(), error = %e, "Failed to persist dismissal state");
        }
    }

    fn write_file(&self) -> CampaignResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let content = serde_json::to_string_pretty(&self.cache.to_map())?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| CampaignError::Io(e.error))?;
        Ok(())
    }
}

fn read_file(path: &Path) -> CampaignResult<BTreeMap<String, StoredValue>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&raw)
        .map_err(|e| CampaignError::Storage(format!("{}: {}", path.display(), e)))
}

impl KeyValueStore for JsonFileStore {
    fn get_bool(&self, key: &str) -> Option<bool> {
        let _guard = self.lock.lock();
        self.reload();
        self.cache.get_bool(key)
    }

    fn set_bool(&self, key: &str, value: Option<bool>) {
        let _guard = self.lock.lock();
        self.reload();
        self.cache.set_bool(key, value);
        self.persist();
    }

    fn get_string(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock();
        self.reload();
        self.cache.get_string(key)
    }

    fn set_string(&self, key: &str, value: Option<String>) {
        let _guard = self.lock.lock();
        self.reload();
        self.cache.set_string(key, value);
        self.persist();
    }
}

/// Point-in-time copy of the persisted dismissal slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissalState {
    pub has_dismissed_banner: Option<bool>,
    pub last_seen_campaign_id: Option<String>,
}

/// The two dismissal slots of one storage group.
#[derive(Clone)]
pub struct DismissalSettings {
    store: Arc<dyn KeyValueStore>,
    group: String,
}

impl DismissalSettings {
    pub fn new(store: Arc<dyn KeyValueStore>, group: impl Into<String>) -> Self {
        Self {
            store,
            group: group.into(),
        }
    }

    fn key(&self, slot: &str) -> String {
        format!("{}.{}", self.group, slot)
    }

    pub fn has_dismissed_banner(&self) -> Option<bool> {
        self.store.get_bool(&self.key(HAS_DISMISSED_BANNER_KEY))
    }

    pub fn set_has_dismissed_banner(&self, value: Option<bool>) {
        self.store.set_bool(&self.key(HAS_DISMISSED_BANNER_KEY), value);
    }

    pub fn last_seen_campaign_id(&self) -> Option<String> {
        self.store.get_string(&self.key(LAST_SEEN_CAMPAIGN_ID_KEY))
    }

    pub fn set_last_seen_campaign_id(&self, value: Option<String>) {
        self.store
            .set_string(&self.key(LAST_SEEN_CAMPAIGN_ID_KEY), value);
    }

    pub fn snapshot(&self) -> DismissalState {
        DismissalState {
            has_dismissed_banner: self.has_dismissed_banner(),
            last_seen_campaign_id: self.last_seen_campaign_id(),
        }
    }
}
