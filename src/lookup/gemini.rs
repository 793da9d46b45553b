use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::Config;
use crate::item::{PronunciationFeedback, SentenceData, WordData};
use crate::lookup::{LookupError, LookupService};

const WORD_INSTRUCTION: &str = "You are an ultra-fast bilingual English/Vietnamese dictionary. \
If the input is English, the \"word\" field MUST equal the input unchanged. \
If the input is Vietnamese, translate it to the most precise English word first. \
Keep root_word and mnemonic as separate fields. JSON output only.";

const SENTENCE_INSTRUCTION: &str = "Analyze an English or Vietnamese sentence. \
If it is Vietnamese, translate it to natural English. \
The \"sentence\" field MUST be the English version. JSON output only.";

const PRONUNCIATION_INSTRUCTION: &str = "Pronunciation coach. Be brief. JSON output.";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: std::env::var(&config.api_key_env)
                .ok()
                .filter(|v| !v.trim().is_empty()),
            model: config.model.clone(),
            api_endpoint: config.api_endpoint.trim().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_endpoint, self.model)
    }
}

pub struct GeminiClient {
    config: GeminiConfig,
    #[cfg(feature = "network")]
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        #[cfg(feature = "network")]
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            config,
            #[cfg(feature = "network")]
            client,
        }
    }

    pub fn is_available(&self) -> bool {
        cfg!(feature = "network")
            && self.config.api_key.is_some()
            && !self.config.model.trim().is_empty()
            && !self.config.api_endpoint.is_empty()
    }

    fn generate<T: DeserializeOwned>(&self, body: &Value) -> Result<T, LookupError> {
        let bytes = self.post(body)?;
        parse_payload(&bytes)
    }

    #[cfg(feature = "network")]
    fn post(&self, body: &Value) -> Result<Vec<u8>, LookupError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LookupError::NotConfigured("API key"))?;
        let response = self
            .client
            .post(self.config.url())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "lookup request rejected");
            return Err(LookupError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    #[cfg(not(feature = "network"))]
    fn post(&self, _body: &Value) -> Result<Vec<u8>, LookupError> {
        Err(LookupError::Unavailable)
    }
}

impl LookupService for GeminiClient {
    fn lookup_word(&self, text: &str) -> Result<WordData, LookupError> {
        tracing::debug!(model = %self.config.model, "looking up word");
        self.generate(&request_body(
            WORD_INSTRUCTION,
            vec![json!({ "text": format!("Analyze this English/Vietnamese word: \"{text}\"") })],
            word_schema(),
        ))
    }

    fn lookup_sentence(&self, text: &str) -> Result<SentenceData, LookupError> {
        tracing::debug!(model = %self.config.model, "looking up sentence");
        self.generate(&request_body(
            SENTENCE_INSTRUCTION,
            vec![json!({ "text": format!("Analyze sentence: \"{text}\"") })],
            sentence_schema(),
        ))
    }

    fn check_pronunciation(
        &self,
        target_text: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<PronunciationFeedback, LookupError> {
        tracing::debug!(bytes = audio.len(), mime_type, "checking pronunciation");
        self.generate(&request_body(
            PRONUNCIATION_INSTRUCTION,
            vec![
                json!({ "inlineData": { "data": BASE64.encode(audio), "mimeType": mime_type } }),
                json!({ "text": format!("Check pronunciation for: \"{target_text}\"") }),
            ],
            pronunciation_schema(),
        ))
    }
}

fn request_body(instruction: &str, parts: Vec<Value>, schema: Value) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": instruction }] },
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
            "temperature": 0,
        },
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Pull the model's JSON answer out of a generateContent response.
pub fn parse_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, LookupError> {
    let response: GenerateResponse = serde_json::from_slice(body)?;
    let text = response
        .first_text()
        .filter(|t| !t.trim().is_empty())
        .ok_or(LookupError::EmptyResponse)?;
    Ok(serde_json::from_str(text)?)
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn word_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "word": { "type": "STRING", "description": "The English word, exactly as given if the input is English" },
            "meaning_vi": { "type": "STRING", "description": "Main Vietnamese meaning" },
            "definition_en": { "type": "STRING", "description": "Short, simple English definition (max 15 words)" },
            "ipa": { "type": "STRING" },
            "syllables": { "type": "STRING" },
            "spelling_tip": { "type": "STRING" },
            "part_of_speech": { "type": "STRING" },
            "example_en": { "type": "STRING" },
            "example_vi": { "type": "STRING" },
            "example_b2_en": { "type": "STRING" },
            "example_b2_vi": { "type": "STRING" },
            "root_word": { "type": "STRING", "description": "The origin or root of the word" },
            "mnemonic": { "type": "STRING", "description": "Memory trick for this word" },
            "synonyms": string_array(),
            "antonyms": string_array(),
            "word_family": string_array(),
            "collocations": string_array(),
        },
        "required": ["word", "meaning_vi", "definition_en", "ipa", "example_en", "example_vi", "root_word", "mnemonic"],
    })
}

fn sentence_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "sentence": { "type": "STRING", "description": "The English version of the sentence" },
            "meaning_vi": { "type": "STRING", "description": "Vietnamese translation" },
            "grammar_breakdown": { "type": "STRING" },
            "usage_context": { "type": "STRING" },
            "naturalness_score": { "type": "NUMBER" },
            "similar_sentences": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": { "en": { "type": "STRING" }, "vi": { "type": "STRING" } },
                },
            },
        },
        "required": ["sentence", "meaning_vi", "grammar_breakdown", "usage_context", "naturalness_score", "similar_sentences"],
    })
}

fn pronunciation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER" },
            "is_correct": { "type": "BOOLEAN" },
            "feedback_vi": { "type": "STRING" },
            "detected_speech": { "type": "STRING" },
        },
        "required": ["score", "is_correct", "feedback_vi", "detected_speech"],
    })
}
