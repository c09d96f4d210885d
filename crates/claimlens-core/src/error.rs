//! Error types for the ClaimLens damage analysis service.
//!
//! Errors are split by concern: configuration problems are fatal at startup,
//! analysis problems are surfaced to the caller per request with enough
//! context to produce a useful HTTP status and message.

use thiserror::Error;

/// Top-level error type for ClaimLens operations.
#[derive(Error, Debug)]
pub enum ClaimlensError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Per-request analysis errors
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// No vision provider has a usable API key
    #[error("No vision provider configured: {0}")]
    NoProviders(String),
}

/// Errors produced while handling a single analysis request.
///
/// The server maps these onto HTTP statuses; the CLI prints them as-is.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Request carried neither an image file nor an image URL
    #[error("No image supplied. Attach an image file or provide an image URL.")]
    EmptyImage,

    /// Magic bytes did not match any accepted image format
    #[error("Unsupported image format: {0}. Accepted formats: JPEG, PNG, GIF, WebP.")]
    UnsupportedFormat(String),

    /// Upload exceeds the configured size limit
    #[error("Image too large: {size_mb}MB exceeds the {max_mb}MB limit")]
    FileTooLarge { size_mb: u64, max_mb: u64 },

    /// Decoded dimensions exceed the configured limit
    #[error("Image dimensions too large: {width}x{height} exceeds {max_dim}px")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Image bytes could not be decoded
    #[error("Cannot decode image: {0}")]
    Decode(String),

    /// Unrecognized engine selector in the request
    #[error("Unknown analysis engine: {0}. Expected \"openai\" or \"gemini\".")]
    UnknownEngine(String),

    /// Unrecognized report language in the request
    #[error("Unknown report language: {0}. Expected \"english\" or \"persian\".")]
    UnknownLanguage(String),

    /// The selected engine has no resolvable API key
    #[error("Engine {0} is not configured. Set its API key and restart.")]
    EngineNotConfigured(String),

    /// Fetching a URL-referenced image failed
    #[error("Failed to fetch image URL: {0}")]
    Fetch(String),

    /// The upstream vision API returned an error
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        status_code: Option<u16>,
    },

    /// The provider call exceeded the per-request deadline
    #[error("Analysis timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// Convenience type alias for ClaimLens results.
pub type Result<T> = std::result::Result<T, ClaimlensError>;

/// Convenience type alias for per-request analysis results.
pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
