use crate::error::AppError;
use anyhow::Result;
use serde::Deserialize;

const DEFAULT_MODEL: &str = "gemini-2.0-flash-001";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Structured generation backend settings
#[derive(Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub api_key: String,

    /// Model used for both prompt and insight generation
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout enforced by the HTTP client
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Voice call settings; both values must be present before a call starts
#[derive(Clone, Default, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub assistant_id: String,
}

impl std::fmt::Debug for VoiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceConfig")
            .field("api_token", &"[REDACTED]")
            .field("assistant_id", &self.assistant_id)
            .finish()
    }
}

impl VoiceConfig {
    /// Check that the call can be attempted at all
    pub fn validate(&self) -> Result<(), AppError> {
        if self.api_token.trim().is_empty() {
            return Err(AppError::configuration("voice API token is not configured"));
        }
        if self.assistant_id.trim().is_empty() {
            return Err(AppError::configuration("voice assistant id is not configured"));
        }
        Ok(())
    }
}

impl Config {
    /// Load from a TOML file, then apply `THERAPY__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("THERAPY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}
