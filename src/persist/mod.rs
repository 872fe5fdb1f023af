// ============================================================================
// reactive-model - Persistence
// Storage collaborators and the JSON snapshot codec
// ============================================================================
//
// The core only needs a string key-value contract. Snapshots cover stored,
// persistence-eligible properties; computed values are derived state and
// are rebuilt by propagation on load.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::model::store::PropertyStore;

// =============================================================================
// STORAGE CONTRACT
// =============================================================================

/// String key-value storage collaborator.
///
/// Implementations map their own failures into
/// [`Error::PersistenceFailure`]; the core treats the rest as opaque.
pub trait Storage {
    /// Fetch the snapshot stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory storage, mainly for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored string, for inspection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Pre-seed a snapshot, for load tests.
    pub fn seed(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// JSON FILE STORE
// =============================================================================

/// File-backed storage: one `<dir>/<key>.json` file per key.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create the store, making the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::PersistenceFailure(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn file(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.file(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| Error::PersistenceFailure(format!("read {}: {e}", path.display())))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.file(key);
        fs::write(&path, value)
            .map_err(|e| Error::PersistenceFailure(format!("write {}: {e}", path.display())))
    }
}

// =============================================================================
// SNAPSHOT CODEC
// =============================================================================

/// Serialize the store's persist-eligible stored properties as a JSON
/// object keyed by property name.
pub(crate) fn encode_snapshot(store: &PropertyStore) -> String {
    let object: serde_json::Map<String, serde_json::Value> = store
        .persisted_values()
        .into_iter()
        .map(|(name, value)| (name, value.to_json()))
        .collect();
    // Pretty layout keeps the on-disk files hand-inspectable
    serde_json::to_string_pretty(&serde_json::Value::Object(object))
        .unwrap_or_else(|_| "{}".to_owned())
}

/// Parse a snapshot back into `(name, value)` pairs. Anything other than a
/// JSON object is malformed.
pub(crate) fn decode_snapshot(raw: &str) -> Result<Vec<(String, Value)>> {
    let json: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::PersistenceFailure(format!("malformed snapshot: {e}")))?;
    match json {
        serde_json::Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(name, value)| (name, Value::from_json(&value)))
            .collect()),
        _ => Err(Error::PersistenceFailure(
            "malformed snapshot: expected a JSON object".to_owned(),
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================
