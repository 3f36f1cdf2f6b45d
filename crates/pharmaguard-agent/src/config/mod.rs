//! Configuration loading for PharmaGuard.
//! Reads pharmaguard.toml from the current directory or the path in the
//! PHARMAGUARD_CONFIG env var. Every section is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    /// YAML rule table merged over (or replacing) the builtin table.
    pub table_path: Option<String>,
    #[serde(default)]
    pub replace_builtin: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// JSON classifier artifacts. Without them predictions fall back to "Unknown".
    pub artifacts_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmMode {
    Disabled,
    Ollama,
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_mode")]
    pub mode: LlmMode,
    /// Model name. Unset means the mode's default, see [`LlmConfig::model_name`].
    pub model: Option<String>,
    /// Endpoint override. Unset means the mode's default endpoint.
    pub base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_mode()     -> LlmMode { LlmMode::Disabled }
fn default_api_key_env()  -> String  { "PHARMAGUARD_OPENAI_API_KEY".to_string() }
fn default_temperature()  -> f32     { 0.3 }
fn default_max_tokens()   -> u32     { 1024 }
fn default_timeout_secs() -> u64     { 30 }

pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

impl LlmConfig {
    /// Configured model, or the default for the selected mode.
    pub fn model_name(&self) -> &str {
        match (&self.model, self.mode) {
            (Some(model), _) => model.as_str(),
            (None, LlmMode::OpenAi) => DEFAULT_OPENAI_MODEL,
            (None, LlmMode::Ollama | LlmMode::Disabled) => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// Ollama endpoint, defaulting to the local daemon.
    pub fn ollama_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_BASE_URL)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: default_llm_mode(),
            model: None,
            base_url: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "pharmaguard=info,warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

mod tests;

impl Config {
    /// Path checked by [`Config::load`].
    pub fn path() -> PathBuf {
        std::env::var("PHARMAGUARD_CONFIG")
            .unwrap_or_else(|_| "pharmaguard.toml".to_string())
            .into()
    }

    /// Load configuration, falling back to defaults when no file exists.
    /// Returns the config and the file it came from, if any.
    pub fn load() -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = Self::path();
        if !Path::new(&path).exists() {
            return Ok((Self::default(), None));
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&content)?;
        Ok((config, Some(path)))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
