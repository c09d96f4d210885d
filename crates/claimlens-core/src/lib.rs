//! ClaimLens Core - Vehicle damage assessment library.
//!
//! ClaimLens takes a photo of a damaged car, sends it to a vision model
//! (OpenAI or Google Gemini), and normalizes the response into a structured
//! damage report: identified vehicle, per-part damage with localized
//! severity and cost bands, and a drivability verdict.
//!
//! # Architecture
//!
//! ```text
//! Image → Validate/Decode → Vision model → Parse sections → DamageReport
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use claimlens_core::{Analyzer, Config, Engine, ReportLanguage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let analyzer = Analyzer::new(&config)?;
//!
//!     let bytes = std::fs::read("./crash.jpg")?;
//!     let report = analyzer
//!         .analyze_bytes(bytes, Engine::OpenAi, ReportLanguage::English)
//!         .await?;
//!     println!("{}", report.safety_status);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod analyzer;
pub mod config;
pub mod error;
pub mod intake;
pub mod output;
pub mod report;
pub mod types;
pub mod vision;

// Re-exports for convenient access
pub use analyzer::{Analyzer, BatchResult};
pub use config::Config;
pub use error::{AnalysisError, AnalysisResult, ClaimlensError, ConfigError, Result};
pub use output::{OutputFormat, OutputWriter};
pub use types::{DamageReport, Engine, ReportLanguage};
pub use vision::{ProviderRegistry, VisionProvider};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
