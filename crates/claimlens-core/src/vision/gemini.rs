//! Google Gemini vision provider using the generateContent API.
//!
//! Sends the photo inline as base64 next to the prompt text. The API key
//! travels as a query parameter, which is how the v1beta endpoint expects it.

use super::provider::{VisionProvider, VisionRequest, VisionResponse};
use crate::error::{AnalysisError, AnalysisResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider using the generateContent API.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

impl GenerateResponse {
    /// Concatenate the text parts of the first candidate.
    fn extract_text(&self) -> Option<String> {
        let parts = self
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?;
        let text: String = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn analyze(&self, request: &VisionRequest) -> AnalysisResult<VisionResponse> {
        let start = Instant::now();

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.media_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| AnalysisError::Provider {
                message: format!("Gemini request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Provider {
                message: format!("Gemini HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let gen_resp: GenerateResponse =
            resp.json().await.map_err(|e| AnalysisError::Provider {
                message: format!("Failed to parse Gemini response: {e}"),
                status_code: None,
            })?;

        let text = gen_resp.extract_text().ok_or_else(|| AnalysisError::Provider {
            message: "Gemini returned no candidates with text content".to_string(),
            status_code: None,
        })?;

        Ok(VisionResponse {
            text: text.trim().to_string(),
            model: self.model.clone(),
            tokens_used: gen_resp
                .usage_metadata
                .and_then(|u| u.total_token_count),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_wire_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: "assess".to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: "AAAA".to_string(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 1500,
                temperature: 0.2,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "assess");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "AAAA");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1500);
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let raw = r#"{
            "candidates": [{"content": {"parts": [{"text": "part one"}, {"text": " part two"}]}}],
            "usageMetadata": {"promptTokenCount": 900, "candidatesTokenCount": 200, "totalTokenCount": 1100}
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.extract_text().as_deref(), Some("part one part two"));
        assert_eq!(
            parsed.usage_metadata.unwrap().total_token_count,
            Some(1100)
        );
    }

    #[test]
    fn test_extract_text_handles_empty_response() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.extract_text().is_none());

        let no_parts: GenerateResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {}}]}"#).unwrap();
        assert!(no_parts.extract_text().is_none());
    }
}
