use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::Utc;

use crate::store::BlobStore;
use crate::store::schema::{
    ALL_KEYS, AUTO_READ_KEY, EXPORT_VERSION, ExportData, SENTENCES_KEY, WORDS_KEY,
};
use crate::store::load_or_default;

/// One pretty-printed JSON file per key under the app data directory.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flashvocab");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    pub fn export_all(&self) -> ExportData {
        ExportData {
            flashvocab_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            words: load_or_default(self, WORDS_KEY),
            sentences: load_or_default(self, SENTENCES_KEY),
            auto_read: load_or_default(self, AUTO_READ_KEY),
        }
    }

    pub fn export_to(&self, path: &Path) -> Result<()> {
        let data = self.export_all();
        fs::write(path, serde_json::to_string_pretty(&data)?)?;
        tracing::info!(
            path = %path.display(),
            words = data.words.len(),
            sentences = data.sentences.len(),
            "exported collections"
        );
        Ok(())
    }

    pub fn import_from(&self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let data: ExportData = serde_json::from_str(&content)?;
        self.import_all(&data)
    }

    /// Replace every stored key with the backup's contents.
    ///
    /// All documents are first staged as `.json.tmp` files; nothing is touched
    /// until staging succeeds. Each original is then moved aside to `.json.bak`
    /// before its replacement is renamed in, and a failure part-way through
    /// restores whatever was already replaced.
    pub fn import_all(&self, data: &ExportData) -> Result<()> {
        if data.flashvocab_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.flashvocab_export_version,
                EXPORT_VERSION
            );
        }

        let documents = [
            (WORDS_KEY, serde_json::to_string_pretty(&data.words)?),
            (SENTENCES_KEY, serde_json::to_string_pretty(&data.sentences)?),
            (AUTO_READ_KEY, serde_json::to_string_pretty(&data.auto_read)?),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (key, json) in &documents {
            let tmp_path = self.file_path(key).with_extension("json.tmp");
            if let Err(e) = write_synced(&tmp_path, json) {
                remove_all(&staged);
                bail!("Import failed during staging: {e}");
            }
            staged.push(tmp_path);
        }

        let mut committed: Vec<Committed> = Vec::new();
        for (i, (key, _)) in documents.iter().enumerate() {
            let target = Committed {
                final_path: self.file_path(key),
                bak_path: self.file_path(key).with_extension("json.bak"),
                had_original: self.file_path(key).exists(),
            };

            if target.had_original
                && let Err(e) = fs::rename(&target.final_path, &target.bak_path)
            {
                rollback(&committed);
                remove_all(&staged);
                bail!("Import failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(&staged[i], &target.final_path) {
                rollback(std::slice::from_ref(&target));
                rollback(&committed);
                remove_all(&staged[i + 1..]);
                bail!("Import failed during commit (rename): {e}");
            }

            committed.push(target);
        }

        for c in committed.iter().filter(|c| c.had_original) {
            let _ = fs::remove_file(&c.bak_path);
        }
        tracing::info!(
            words = data.words.len(),
            sentences = data.sentences.len(),
            "imported collections"
        );
        Ok(())
    }

    /// Resolve `.bak` files left by an interrupted import. A backup whose
    /// document is missing is the only copy and is moved back into place.
    /// A backup next to a live document is stale and removed.
    pub fn check_interrupted_import(&self) -> ImportRecovery {
        let mut recovery = ImportRecovery::default();
        for key in ALL_KEYS {
            let final_path = self.file_path(key);
            let bak_path = final_path.with_extension("json.bak");
            if !bak_path.exists() {
                continue;
            }
            if final_path.exists() {
                match fs::remove_file(&bak_path) {
                    Ok(()) => recovery.discarded.push(key),
                    Err(e) => tracing::warn!(key, error = %e, "could not remove stale backup"),
                }
            } else {
                match fs::rename(&bak_path, &final_path) {
                    Ok(()) => recovery.restored.push(key),
                    Err(e) => tracing::warn!(key, error = %e, "could not restore backup"),
                }
            }
        }
        if !recovery.is_clean() {
            tracing::warn!(
                restored = ?recovery.restored,
                discarded = ?recovery.discarded,
                "recovered from interrupted import"
            );
        }
        recovery
    }
}

/// What `check_interrupted_import` found on disk.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportRecovery {
    /// Keys whose backup was moved back because the document was missing.
    pub restored: Vec<&'static str>,
    /// Keys whose leftover backup was deleted.
    pub discarded: Vec<&'static str>,
}

impl ImportRecovery {
    pub fn is_clean(&self) -> bool {
        self.restored.is_empty() && self.discarded.is_empty()
    }
}

impl BlobStore for JsonStore {
    fn load(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.file_path(key)).ok()
    }

    fn save(&self, key: &str, json: &str) -> Result<()> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("tmp");
        write_synced(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

struct Committed {
    final_path: PathBuf,
    bak_path: PathBuf,
    had_original: bool,
}

fn write_synced(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn rollback(committed: &[Committed]) {
    for c in committed {
        if c.had_original {
            let _ = fs::rename(&c.bak_path, &c.final_path);
        } else {
            let _ = fs::remove_file(&c.final_path);
        }
    }
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}
