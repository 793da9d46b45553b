use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{SentenceData, WordData};

pub const WORDS_KEY: &str = "flashcards";
pub const SENTENCES_KEY: &str = "saved_sentences";
pub const AUTO_READ_KEY: &str = "vocab_auto_read";

pub const ALL_KEYS: [&str; 3] = [WORDS_KEY, SENTENCES_KEY, AUTO_READ_KEY];

pub const EXPORT_VERSION: u32 = 1;

/// Full backup of saved collections and preferences.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub flashvocab_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub words: Vec<WordData>,
    pub sentences: Vec<SentenceData>,
    #[serde(default)]
    pub auto_read: bool,
}
