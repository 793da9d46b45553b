pub mod cache;
pub mod gemini;
pub mod normalize;

use thiserror::Error;

use crate::item::{PronunciationFeedback, SentenceData, WordData};

/// Shown to the learner whenever a lookup or check fails, whatever the cause.
pub const LOOKUP_FAILED_NOTICE: &str = "Lookup failed.";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup not configured: {0}")]
    NotConfigured(&'static str),
    #[error("lookup unavailable: built without network support")]
    Unavailable,
    #[cfg(feature = "network")]
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyResponse,
}

/// Dictionary, translation and pronunciation service. Every call either
/// returns a complete payload or fails.
pub trait LookupService: Send + Sync {
    fn lookup_word(&self, text: &str) -> Result<WordData, LookupError>;

    fn lookup_sentence(&self, text: &str) -> Result<SentenceData, LookupError>;

    fn check_pronunciation(
        &self,
        target_text: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<PronunciationFeedback, LookupError>;
}

impl<T: LookupService + ?Sized> LookupService for std::sync::Arc<T> {
    fn lookup_word(&self, text: &str) -> Result<WordData, LookupError> {
        (**self).lookup_word(text)
    }

    fn lookup_sentence(&self, text: &str) -> Result<SentenceData, LookupError> {
        (**self).lookup_sentence(text)
    }

    fn check_pronunciation(
        &self,
        target_text: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<PronunciationFeedback, LookupError> {
        (**self).check_pronunciation(target_text, audio, mime_type)
    }
}
