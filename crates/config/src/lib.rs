//! Configuration loading, validation, and management for Leadbot.
//!
//! Loads configuration from `~/.leadbot/config.toml` with environment
//! variable overrides. Validates all settings at startup. The result is
//! read-only for the lifetime of the process.

pub mod company;

pub use company::{CompanyProfile, JobOpening, Service};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.leadbot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat-completion backend and model chain
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Agent turn behavior
    #[serde(default)]
    pub agent: AgentSettings,

    /// Where lead CSV files are written
    #[serde(default)]
    pub storage: StorageConfig,

    /// The company catalog the tools answer from
    #[serde(default)]
    pub company: CompanyProfile,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, used in logs
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// Base URL of an OpenAI-compatible `/chat/completions` API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifiers in priority order; the first is preferred
    #[serde(default = "default_models")]
    pub models: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider_name() -> String {
    "groq".into()
}
fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_models() -> Vec<String> {
    vec![
        "gemma2-9b-it".into(),
        "qwen-2.5-32b".into(),
        "llama3-70b-8192".into(),
    ]
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            api_key: None,
            models: default_models(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("models", &self.models)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Extra attempts after the first when a turn fails unexpectedly
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed pause between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Turns kept in conversation memory
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,

    /// Longer visitor messages are truncated to this many characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Answer catalog questions from keyword rules before calling the LLM
    #[serde(default = "default_true")]
    pub fast_paths: bool,

    /// Replaces the built-in system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_retries() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_memory_window() -> usize {
    10
}
fn default_max_input_chars() -> usize {
    500
}
fn default_true() -> bool {
    true
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            memory_window: default_memory_window(),
            max_input_chars: default_max_input_chars(),
            fast_paths: true,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `service_inquiries.csv` and `job_applications.csv`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.leadbot/config.toml).
    ///
    /// Environment variables override the file, see [`AppConfig::apply_env`].
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// - `LEADBOT_API_KEY`, then `GROQ_API_KEY`, then `OPENAI_API_KEY` (only if no key is set)
    /// - `LEADBOT_BASE_URL`
    /// - `LEADBOT_MODELS` (comma-separated, priority order)
    /// - `LEADBOT_DATA_DIR`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = lookup("LEADBOT_API_KEY")
                .or_else(|| lookup("GROQ_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(url) = lookup("LEADBOT_BASE_URL") {
            self.provider.base_url = url;
        }

        if let Some(models) = lookup("LEADBOT_MODELS") {
            let parsed: Vec<String> = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
            if !parsed.is_empty() {
                self.provider.models = parsed;
            }
        }

        if let Some(dir) = lookup("LEADBOT_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".leadbot")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.models.is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.models must name at least one model".into(),
            ));
        }

        if self.provider.models.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "provider.models must not contain blank entries".into(),
            ));
        }

        if self.agent.memory_window < 2 {
            return Err(ConfigError::ValidationError(
                "agent.memory_window must hold at least one exchange (2 turns)".into(),
            ));
        }

        if self.agent.max_input_chars == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_input_chars must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.models[0], "gemma2-9b-it");
        assert_eq!(config.provider.models.len(), 3);
        assert_eq!(config.agent.max_retries, 2);
        assert_eq!(config.agent.memory_window, 10);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.models, config.provider.models);
        assert_eq!(parsed.company.services, config.company.services);
        assert_eq!(parsed.company.contact, config.company.contact);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.provider.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_model_chain_rejected() {
        let mut config = AppConfig::default();
        config.provider.models.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn tiny_memory_window_rejected() {
        let mut config = AppConfig::default();
        config.agent.memory_window = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.provider.name, "groq");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[provider]
models = ["llama-3.1-8b-instant"]

[agent]
max_retries = 0

[[company.services]]
id = "s1"
name = "Consulting"
description = "We advise."
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.models, vec!["llama-3.1-8b-instant"]);
        assert_eq!(config.provider.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.agent.max_retries, 0);
        assert_eq!(config.agent.retry_delay_ms, 1000);
        assert_eq!(config.company.services.len(), 1);
        assert_eq!(config.company.name, "LogBinary");
        assert_eq!(config.company.jobs.len(), 2);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("GROQ_API_KEY", "gsk-test"),
            ("LEADBOT_MODELS", "a, b ,,c"),
            ("LEADBOT_DATA_DIR", "/var/leads"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.provider.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.provider.models, vec!["a", "b", "c"]);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/leads"));
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("from-file".into());
        config.apply_env(|k| (k == "LEADBOT_API_KEY").then(|| "from-env".to_string()));
        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.provider.api_key = Some("gsk-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("gsk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemma2-9b-it"));
        assert!(toml_str.contains("LogBinary"));
    }
}
