//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted image size in megabytes
    pub max_upload_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,

    /// Remote image fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,

    /// Vision provider call timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Extra attempts after a retryable provider failure
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds (doubles each attempt)
    pub retry_delay_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 10,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
            fetch_timeout_ms: 15000,
            request_timeout_ms: 60000,
            retry_attempts: 1,
            retry_delay_ms: 1000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Vision provider configurations.
///
/// A section omitted from the config file falls back to its default, which
/// reads the API key from the conventional environment variable. An engine
/// whose key does not resolve at startup is not registered.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,

    /// Google Gemini configuration
    pub gemini: Option<GeminiConfig>,
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Google Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}
