//! Vision provider trait and request/response types.
//!
//! Defines the interface that all vision providers implement, plus the
//! registry that holds every engine with a usable API key. The registry is
//! built once at startup; each request then selects an engine by name.

use crate::config::ProvidersConfig;
use crate::error::{AnalysisError, AnalysisResult, ConfigError};
use crate::types::{Engine, ReportLanguage};
use crate::vision::prompt;
use async_trait::async_trait;
use base64::Engine as _;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Base64-encoded image ready to send to a vision API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A request to assess vehicle damage in a photo.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// The photo to assess
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl VisionRequest {
    /// Build a damage assessment request for a photo.
    ///
    /// The prompt pins the response to the section skeleton the report
    /// parser expects, in the requested language.
    pub fn assessment(image: ImageInput, language: ReportLanguage) -> Self {
        Self {
            image,
            prompt: prompt::assessment_prompt(language),
            max_tokens: 1500,
            temperature: 0.2,
        }
    }
}

/// The response from a vision assessment call.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    /// Generated assessment text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all vision providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Arc<dyn VisionProvider>` for dynamic dispatch).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logging (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Assess the photo in the given request.
    async fn analyze(&self, request: &VisionRequest) -> AnalysisResult<VisionResponse>;

    /// Per-request HTTP timeout for this provider.
    fn timeout(&self) -> Duration;
}

impl std::fmt::Debug for dyn VisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionProvider")
            .field("name", &self.name())
            .finish()
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Holds every engine that resolved a usable API key at startup.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<Engine, Arc<dyn VisionProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for an engine, replacing any previous one.
    pub fn register(&mut self, engine: Engine, provider: Arc<dyn VisionProvider>) {
        self.providers.insert(engine, provider);
    }

    /// Build the registry from provider configuration.
    ///
    /// A missing config section falls back to its default, so an API key in
    /// the conventional environment variable is enough to enable an engine
    /// without any config file. Errors only when no engine resolves a key:
    /// a service that cannot analyze anything should not start.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new();

        let openai = config.openai.clone().unwrap_or_default();
        match resolve_env_var(&openai.api_key) {
            Some(api_key) => {
                registry.register(
                    Engine::OpenAi,
                    Arc::new(super::openai::OpenAiProvider::new(&api_key, &openai.model)),
                );
            }
            None => tracing::debug!("OpenAI API key not resolvable, engine disabled"),
        }

        let gemini = config.gemini.clone().unwrap_or_default();
        match resolve_env_var(&gemini.api_key) {
            Some(api_key) => {
                registry.register(
                    Engine::Gemini,
                    Arc::new(super::gemini::GeminiProvider::new(&api_key, &gemini.model)),
                );
            }
            None => tracing::debug!("Gemini API key not resolvable, engine disabled"),
        }

        if registry.providers.is_empty() {
            return Err(ConfigError::NoProviders(
                "set OPENAI_API_KEY or GEMINI_API_KEY, or configure a provider in config.toml"
                    .to_string(),
            ));
        }

        Ok(registry)
    }

    /// Look up the provider for an engine.
    pub fn get(&self, engine: Engine) -> AnalysisResult<Arc<dyn VisionProvider>> {
        self.providers
            .get(&engine)
            .cloned()
            .ok_or_else(|| AnalysisError::EngineNotConfigured(engine.to_string()))
    }

    /// Engines with a registered provider, in declaration order.
    pub fn engines(&self) -> Vec<Engine> {
        [Engine::OpenAi, Engine::Gemini]
            .into_iter()
            .filter(|engine| self.providers.contains_key(engine))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeminiConfig, OpenAiConfig};

    #[test]
    fn test_image_input_from_bytes_jpeg() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF], "jpeg");
        assert_eq!(input.media_type, "image/jpeg");
        assert!(!input.data.is_empty());
    }

    #[test]
    fn test_image_input_from_bytes_png() {
        let input = ImageInput::from_bytes(&[0x89, 0x50, 0x4E, 0x47], "png");
        assert_eq!(input.media_type, "image/png");
    }

    #[test]
    fn test_image_input_data_url() {
        let input = ImageInput::from_bytes(&[1, 2, 3], "jpeg");
        let url = input.data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_assessment_request_defaults() {
        let image = ImageInput::from_bytes(&[1, 2, 3], "jpeg");
        let request = VisionRequest::assessment(image, ReportLanguage::English);
        assert_eq!(request.max_tokens, 1500);
        assert!(request.prompt.contains("Damage Assessment"));
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }

    #[test]
    fn test_from_config_with_inline_keys() {
        let config = ProvidersConfig {
            openai: Some(OpenAiConfig {
                api_key: "sk-test".to_string(),
                ..Default::default()
            }),
            gemini: Some(GeminiConfig {
                api_key: "g-test".to_string(),
                ..Default::default()
            }),
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.engines(), vec![Engine::OpenAi, Engine::Gemini]);
    }

    #[test]
    fn test_from_config_skips_unresolvable_engine() {
        let config = ProvidersConfig {
            openai: Some(OpenAiConfig {
                api_key: "${DEFINITELY_NOT_SET_XYZ_123}".to_string(),
                ..Default::default()
            }),
            gemini: Some(GeminiConfig {
                api_key: "g-test".to_string(),
                ..Default::default()
            }),
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.engines(), vec![Engine::Gemini]);
        assert!(registry.get(Engine::Gemini).is_ok());
        assert!(matches!(
            registry.get(Engine::OpenAi).unwrap_err(),
            AnalysisError::EngineNotConfigured(_)
        ));
    }

    #[test]
    fn test_from_config_errors_when_nothing_resolves() {
        let config = ProvidersConfig {
            openai: Some(OpenAiConfig {
                api_key: "${DEFINITELY_NOT_SET_XYZ_123}".to_string(),
                ..Default::default()
            }),
            gemini: Some(GeminiConfig {
                api_key: "${ALSO_NOT_SET_XYZ_123}".to_string(),
                ..Default::default()
            }),
        };
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::NoProviders(_)));
    }
}
