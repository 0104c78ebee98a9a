//! Key-Value Preferences
//!
//! Durable storage for named string sets, grouped by namespace.
//!
//! `FilePreferences` keeps one JSON document per namespace:
//!
//! ```json
//! { "keywords": ["free", "lottery"] }
//! ```
//!
//! Every write replaces the whole document through a temporary file and a
//! rename, so a concurrent reader sees either the old or the new content.
//! A document that no longer parses is moved to `<namespace>.json.bak`
//! before the next write replaces it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{Result, SpamGuardError};

/// Contents of one namespace document
type Namespace = BTreeMap<String, BTreeSet<String>>;

/// Key-value persistence service for string sets
pub trait PreferenceStore: Send + Sync {
    /// Read the set stored under `namespace`/`key`, `None` when absent
    fn get_string_set(&self, namespace: &str, key: &str) -> Result<Option<BTreeSet<String>>>;

    /// Replace the set stored under `namespace`/`key`
    fn put_string_set(&self, namespace: &str, key: &str, values: &BTreeSet<String>) -> Result<()>;
}

impl<P: PreferenceStore + ?Sized> PreferenceStore for Arc<P> {
    fn get_string_set(&self, namespace: &str, key: &str) -> Result<Option<BTreeSet<String>>> {
        (**self).get_string_set(namespace, key)
    }

    fn put_string_set(&self, namespace: &str, key: &str, values: &BTreeSet<String>) -> Result<()> {
        (**self).put_string_set(namespace, key, values)
    }
}

/// File-backed preferences, one JSON file per namespace
pub struct FilePreferences {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FilePreferences {
    /// Create preferences rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Directory holding the namespace files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document backing `namespace`
    pub fn namespace_path(&self, namespace: &str) -> Result<PathBuf> {
        if namespace.is_empty()
            || namespace.contains(['/', '\\'])
            || namespace == "."
            || namespace == ".."
        {
            return Err(SpamGuardError::Storage(format!("Invalid namespace: {:?}", namespace)));
        }
        Ok(self.dir.join(format!("{}.json", namespace)))
    }

    fn read_namespace(path: &Path) -> Result<Option<Namespace>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_namespace(path: &Path, document: &Namespace) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(document)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents)?;
        if let Err(e) = std::fs::rename(&tmp_path, path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!("Preferences written to {:?}", path);
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn get_string_set(&self, namespace: &str, key: &str) -> Result<Option<BTreeSet<String>>> {
        let path = self.namespace_path(namespace)?;
        let document = Self::read_namespace(&path)?;
        Ok(document.and_then(|mut doc| doc.remove(key)))
    }

    fn put_string_set(&self, namespace: &str, key: &str, values: &BTreeSet<String>) -> Result<()> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.write_lock.lock();

        let mut document = match Self::read_namespace(&path) {
            Ok(doc) => doc.unwrap_or_default(),
            Err(SpamGuardError::Json(e)) => {
                let backup = path.with_extension("json.bak");
                std::fs::rename(&path, &backup)?;
                warn!("Unreadable preferences {:?} moved to {:?}: {}", path, backup, e);
                Namespace::new()
            }
            Err(e) => return Err(e),
        };

        document.insert(key.to_string(), values.clone());
        Self::write_namespace(&path, &document)
    }
}

/// In-memory preferences
#[derive(Default)]
pub struct MemoryPreferences {
    entries: RwLock<HashMap<(String, String), BTreeSet<String>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string_set(&self, namespace: &str, key: &str) -> Result<Option<BTreeSet<String>>> {
        let entries = self.entries.read();
        Ok(entries.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    fn put_string_set(&self, namespace: &str, key: &str, values: &BTreeSet<String>) -> Result<()> {
        self.entries
            .write()
            .insert((namespace.to_string(), key.to_string()), values.clone());
        Ok(())
    }
}
