//! End-to-end damage analysis orchestration.
//!
//! The analyzer wires intake, the vision providers, and the report parser
//! into one pipeline: validate the bytes, call the selected engine with
//! retry, and assemble the normalized [`DamageReport`]. Batch analysis
//! runs the same pipeline per file under bounded concurrency, delivering
//! results through a callback as they complete.

use crate::config::{Config, LimitsConfig};
use crate::error::{AnalysisError, AnalysisResult, ConfigError};
use crate::intake::{self, CaptureExtractor, ImageFetcher, ImageValidator};
use crate::report;
use crate::types::{CaptureInfo, DamageReport, Engine, ReportLanguage};
use crate::vision::{
    retry, ImageInput, ProviderRegistry, VisionProvider, VisionRequest, VisionResponse,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Result of analyzing one file in a batch.
#[derive(Debug)]
pub enum BatchResult {
    Success { path: PathBuf, report: DamageReport },
    Failure { path: PathBuf, error: String },
}

/// The damage analysis pipeline.
///
/// Cheap to clone; the provider registry is shared behind an `Arc` so the
/// server and batch tasks can hold copies.
#[derive(Clone)]
pub struct Analyzer {
    validator: ImageValidator,
    fetcher: ImageFetcher,
    registry: Arc<ProviderRegistry>,
    limits: LimitsConfig,
}

impl Analyzer {
    /// Build an analyzer from configuration.
    ///
    /// Fails when no provider resolves an API key, so a misconfigured
    /// deployment is reported at startup rather than on the first upload.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let registry = ProviderRegistry::from_config(&config.providers)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Build an analyzer around an already-populated provider registry.
    pub fn with_registry(config: &Config, registry: ProviderRegistry) -> Self {
        Self {
            validator: ImageValidator::new(config.limits.clone()),
            fetcher: ImageFetcher::new(&config.limits),
            registry: Arc::new(registry),
            limits: config.limits.clone(),
        }
    }

    /// Engines with a configured provider.
    pub fn engines(&self) -> Vec<Engine> {
        self.registry.engines()
    }

    /// Analyze in-memory image bytes and produce a normalized report.
    pub async fn analyze_bytes(
        &self,
        bytes: Vec<u8>,
        engine: Engine,
        language: ReportLanguage,
    ) -> AnalysisResult<DamageReport> {
        let provider = self.registry.get(engine)?;
        let checked = self.validator.check(bytes).await?;
        let report_id = intake::report_id(&checked.bytes);
        let capture = CaptureExtractor::extract(&checked.bytes);

        tracing::info!(
            report_id = %report_id,
            engine = %engine,
            format = checked.format,
            width = checked.width,
            height = checked.height,
            "Analyzing image"
        );

        let image = ImageInput::from_bytes(&checked.bytes, checked.format);
        let request = VisionRequest::assessment(image, language);
        let response = self.call_with_retry(provider.as_ref(), &request).await?;

        tracing::info!(
            report_id = %report_id,
            model = %response.model,
            latency_ms = response.latency_ms,
            tokens = ?response.tokens_used,
            "Analysis complete"
        );

        Ok(assemble_report(report_id, engine, language, capture, response))
    }

    /// Fetch a remote image by URL, then analyze it.
    pub async fn analyze_url(
        &self,
        url: &str,
        engine: Engine,
        language: ReportLanguage,
    ) -> AnalysisResult<DamageReport> {
        let bytes = self.fetcher.fetch(url).await?;
        self.analyze_bytes(bytes, engine, language).await
    }

    /// Analyze a batch of image files with bounded concurrency.
    ///
    /// Spawns one tokio task per file, bounded by a semaphore. Calls
    /// `on_result` for each completed analysis so the CLI can stream
    /// JSONL lines in real time.
    ///
    /// Returns `(succeeded, failed)` counts.
    pub async fn analyze_batch<F>(
        &self,
        paths: &[PathBuf],
        engine: Engine,
        language: ReportLanguage,
        parallel: usize,
        on_result: F,
    ) -> (usize, usize)
    where
        F: Fn(BatchResult) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
        let on_result = Arc::new(on_result);
        let mut handles = Vec::with_capacity(paths.len());

        for path in paths {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Batch semaphore closed unexpectedly, stopping");
                    break;
                }
            };

            let analyzer = self.clone();
            let on_result = on_result.clone();
            let path = path.clone();

            let handle = tokio::spawn(async move {
                let result = match tokio::fs::read(&path).await {
                    Ok(bytes) => match analyzer.analyze_bytes(bytes, engine, language).await {
                        Ok(report) => BatchResult::Success { path, report },
                        Err(e) => BatchResult::Failure {
                            path,
                            error: e.to_string(),
                        },
                    },
                    Err(e) => BatchResult::Failure {
                        path,
                        error: format!("Failed to read image: {e}"),
                    },
                };
                let success = matches!(&result, BatchResult::Success { .. });
                drop(permit); // Release the concurrency permit before the callback
                on_result(result);
                success
            });

            handles.push(handle);
        }

        let mut succeeded = 0usize;
        let mut failed = 0usize;

        for handle in handles {
            match handle.await {
                Ok(true) => succeeded += 1,
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::error!("Analysis task panicked: {e}");
                    failed += 1;
                }
            }
        }

        (succeeded, failed)
    }

    /// Call the provider with timeout and retry on transient failures.
    async fn call_with_retry(
        &self,
        provider: &dyn VisionProvider,
        request: &VisionRequest,
    ) -> AnalysisResult<VisionResponse> {
        let timeout = Duration::from_millis(self.limits.request_timeout_ms);
        let mut last_error = AnalysisError::Timeout {
            timeout_ms: self.limits.request_timeout_ms,
        };

        for attempt in 0..=self.limits.retry_attempts {
            if attempt > 0 {
                let delay = retry::backoff_duration(attempt - 1, self.limits.retry_delay_ms);
                tracing::debug!(
                    "Retry {attempt}/{} against {} after {delay:?}",
                    self.limits.retry_attempts,
                    provider.name()
                );
                tokio::time::sleep(delay).await;
            }

            match tokio::time::timeout(timeout, provider.analyze(request)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => {
                    let retryable = retry::is_retryable(&e);
                    last_error = e;
                    if !retryable {
                        break;
                    }
                }
                Err(_) => {
                    last_error = AnalysisError::Timeout {
                        timeout_ms: self.limits.request_timeout_ms,
                    };
                    // Timeouts are retryable
                }
            }
        }

        Err(last_error)
    }
}

/// Combine the parsed response with request metadata into the final report.
fn assemble_report(
    report_id: String,
    engine: Engine,
    language: ReportLanguage,
    capture: Option<CaptureInfo>,
    response: VisionResponse,
) -> DamageReport {
    let parsed = report::parse(&response.text, language);

    DamageReport {
        report_id,
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
        engine: engine.label().to_string(),
        model: response.model,
        language,
        vehicle: parsed.vehicle,
        damages: parsed.damages,
        total_cost: parsed.total_cost,
        repair_time: parsed.repair_time,
        safety_status: parsed.safety.label(language).to_string(),
        content: response.text,
        capture,
        latency_ms: response.latency_ms,
        tokens_used: response.tokens_used,
    }
}
