//! Fetching images referenced by URL.

use std::time::Duration;

use crate::config::LimitsConfig;
use crate::error::{AnalysisError, AnalysisResult};

/// Downloads URL-referenced images with a streaming size cap.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    max_bytes: u64,
    max_mb: u64,
    timeout: Duration,
}

impl ImageFetcher {
    /// Create a fetcher honoring the configured upload limits.
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_bytes: limits.max_upload_mb * 1024 * 1024,
            max_mb: limits.max_upload_mb,
            timeout: Duration::from_millis(limits.fetch_timeout_ms),
        }
    }

    /// Download an image, enforcing the size cap while streaming.
    ///
    /// Only http and https URLs are accepted. The cap is checked both
    /// against the declared Content-Length and against the running byte
    /// count, so a misdeclared response cannot exhaust memory.
    pub async fn fetch(&self, url: &str) -> AnalysisResult<Vec<u8>> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AnalysisError::Fetch(format!(
                "unsupported URL scheme in {:?}, expected http or https",
                url
            )));
        }

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AnalysisError::Fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::Fetch(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(AnalysisError::FileTooLarge {
                    size_mb: length / (1024 * 1024),
                    max_mb: self.max_mb,
                });
            }
        }

        let mut response = response;
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AnalysisError::Fetch(e.to_string()))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > self.max_bytes {
                return Err(AnalysisError::FileTooLarge {
                    size_mb: bytes.len() as u64 / (1024 * 1024),
                    max_mb: self.max_mb,
                });
            }
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> ImageFetcher {
        ImageFetcher::new(&LimitsConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let err = fetcher().fetch("ftp://example.com/car.jpg").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Fetch(_)));
        assert!(err.to_string().contains("scheme"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_bare_path() {
        let err = fetcher().fetch("/tmp/car.jpg").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_file_url() {
        let err = fetcher().fetch("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Fetch(_)));
    }
}
