use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::item::{PronunciationFeedback, SentenceData, WordData};
use crate::lookup::normalize::{normalize_sentence, normalize_word};
use crate::lookup::{LookupError, LookupService};

/// Longest encoded key that still fits a file name on common filesystems.
const MAX_FILE_STEM: usize = 200;

/// On-disk record. The key is stored alongside the value so a hit can be
/// checked against the key that was asked for.
#[derive(Serialize, Deserialize)]
struct DiskEntry<T> {
    key: String,
    value: T,
}

/// One JSON file per key, named by the URL-safe base64 of the key.
pub struct DiskCache {
    base_dir: PathBuf,
}

impl DiskCache {
    pub fn new() -> Option<Self> {
        let base = dirs::data_dir()?.join("flashvocab").join("lookup-cache");
        Self::with_base_dir(base)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Option<Self> {
        fs::create_dir_all(&base_dir).ok()?;
        Some(Self { base_dir })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.base_dir.join(Self::file_name(key)?);
        let json = fs::read_to_string(path).ok()?;
        let entry: DiskEntry<T> = serde_json::from_str(&json).ok()?;
        if entry.key != key {
            tracing::warn!(key, stored = %entry.key, "disk cache entry has the wrong key");
            return None;
        }
        Some(entry.value)
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let Some(name) = Self::file_name(key) else {
            return false;
        };
        let entry = DiskEntry {
            key: key.to_string(),
            value,
        };
        serde_json::to_string(&entry)
            .ok()
            .is_some_and(|json| fs::write(self.base_dir.join(name), json).is_ok())
    }

    fn file_name(key: &str) -> Option<String> {
        let stem = URL_SAFE_NO_PAD.encode(key.as_bytes());
        (stem.len() <= MAX_FILE_STEM).then(|| format!("{stem}.json"))
    }
}

/// Memoizes lookups by normalized input, in memory and optionally on disk.
/// Pronunciation checks are never cached.
pub struct CachedLookup<S> {
    inner: S,
    words: Mutex<HashMap<String, WordData>>,
    sentences: Mutex<HashMap<String, SentenceData>>,
    disk: Option<DiskCache>,
}

impl<S: LookupService> CachedLookup<S> {
    pub fn new(inner: S, disk: Option<DiskCache>) -> Self {
        Self {
            inner,
            words: Mutex::new(HashMap::new()),
            sentences: Mutex::new(HashMap::new()),
            disk,
        }
    }

    fn cached<T, F>(
        &self,
        memory: &Mutex<HashMap<String, T>>,
        disk_key: &str,
        key: &str,
        fetch: F,
    ) -> Result<T, LookupError>
    where
        T: Clone + Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, LookupError>,
    {
        if let Some(hit) = memory.lock().ok().and_then(|m| m.get(key).cloned()) {
            return Ok(hit);
        }
        if let Some(hit) = self.disk.as_ref().and_then(|d| d.get::<T>(disk_key)) {
            if let Ok(mut m) = memory.lock() {
                m.insert(key.to_string(), hit.clone());
            }
            return Ok(hit);
        }

        let fresh = fetch()?;
        if let Ok(mut m) = memory.lock() {
            m.insert(key.to_string(), fresh.clone());
        }
        if let Some(disk) = &self.disk
            && !disk.put(disk_key, &fresh)
        {
            tracing::debug!(key = disk_key, "lookup result not written to disk cache");
        }
        Ok(fresh)
    }
}

impl<S: LookupService> LookupService for CachedLookup<S> {
    fn lookup_word(&self, text: &str) -> Result<WordData, LookupError> {
        let key = normalize_word(text);
        self.cached(&self.words, &format!("word-{key}"), &key, || {
            self.inner.lookup_word(&key)
        })
    }

    fn lookup_sentence(&self, text: &str) -> Result<SentenceData, LookupError> {
        let key = normalize_sentence(text);
        self.cached(&self.sentences, &format!("sentence-{key}"), &key, || {
            self.inner.lookup_sentence(&key)
        })
    }

    fn check_pronunciation(
        &self,
        target_text: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<PronunciationFeedback, LookupError> {
        self.inner.check_pronunciation(target_text, audio, mime_type)
    }
}
