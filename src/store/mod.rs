pub mod collections;
pub mod json_store;
pub mod preferences;
pub mod schema;

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key-value persistence for JSON documents.
pub trait BlobStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, json: &str) -> Result<()>;
}

/// Load and parse `key`, falling back to `T::default()` when it is missing or malformed.
pub fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: BlobStore + ?Sized,
{
    let Some(content) = store.load(key) else {
        return T::default();
    };
    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, %err, "stored data is malformed, starting empty");
            T::default()
        }
    }
}

pub fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: BlobStore + ?Sized,
{
    let json = serde_json::to_string_pretty(value)?;
    store.save(key, &json)
}

/// In-memory store for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(self, key: &str, json: &str) -> Self {
        self.blobs.borrow_mut().insert(key.to_string(), json.to_string());
        self
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.raw(key)
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        self.blobs.borrow_mut().insert(key.to_string(), json.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_blob_degrades_to_default() {
        let store = MemoryStore::new().with_blob("k", "{not json");
        let value: Vec<u32> = load_or_default(&store, "k");
        assert!(value.is_empty());
    }

    #[test]
    fn test_missing_blob_is_default() {
        let store = MemoryStore::new();
        let value: bool = load_or_default(&store, "absent");
        assert!(!value);
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        save_json(&store, "nums", &vec![1u32, 2, 3]).unwrap();
        let value: Vec<u32> = load_or_default(&store, "nums");
        assert_eq!(value, vec![1, 2, 3]);
    }
}
