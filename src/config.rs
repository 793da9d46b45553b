use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_tts_command")]
    pub tts_command: Vec<String>,
    #[serde(default = "default_record_command")]
    pub record_command: Vec<String>,
    #[serde(default = "default_record_mime_type")]
    pub record_mime_type: String,
    #[serde(default = "default_record_timeout_secs")]
    pub record_timeout_secs: u64,
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    #[serde(default = "default_lookup_cache_enabled")]
    pub lookup_cache_enabled: bool,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_api_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_tts_command() -> Vec<String> {
    ["espeak-ng", "-v", "en-us", "-s", "150", "{text}"]
        .map(String::from)
        .to_vec()
}
fn default_record_command() -> Vec<String> {
    ["arecord", "-q", "-f", "cd", "-t", "wav", "{out}"]
        .map(String::from)
        .to_vec()
}
fn default_record_mime_type() -> String {
    "audio/wav".to_string()
}
fn default_record_timeout_secs() -> u64 {
    3
}
fn default_transition_ms() -> u64 {
    200
}
fn default_search_debounce_ms() -> u64 {
    400
}
fn default_lookup_cache_enabled() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            model: default_model(),
            api_endpoint: default_api_endpoint(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
            tts_command: default_tts_command(),
            record_command: default_record_command(),
            record_mime_type: default_record_mime_type(),
            record_timeout_secs: default_record_timeout_secs(),
            transition_ms: default_transition_ms(),
            search_debounce_ms: default_search_debounce_ms(),
            lookup_cache_enabled: default_lookup_cache_enabled(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flashvocab")
            .join("config.toml")
    }

    /// Clamp numeric settings into usable ranges and reset values that no
    /// longer name anything. Call after deserialization.
    pub fn validate(&mut self, valid_themes: &[&str]) {
        if !valid_themes.contains(&self.theme.as_str()) {
            self.theme = default_theme();
        }
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        if self.api_endpoint.trim().is_empty() {
            self.api_endpoint = default_api_endpoint();
        }
        if self.record_mime_type.trim().is_empty() {
            self.record_mime_type = default_record_mime_type();
        }
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 120);
        self.record_timeout_secs = self.record_timeout_secs.clamp(1, 30);
        self.transition_ms = self.transition_ms.min(2000);
        self.search_debounce_ms = self.search_debounce_ms.min(5000);
    }
}
