//! Route handlers for the upload UI and the analysis API.

use super::error::ApiError;
use super::AppState;
use axum::extract::{Multipart, State};
use axum::response::Html;
use axum::Json;
use claimlens_core::{AnalysisError, DamageReport, Engine, ReportLanguage};
use serde_json::{json, Value};

const INDEX_HTML: &str = include_str!("../../../../assets/web/index.html");
const REPORT_HTML: &str = include_str!("../../../../assets/web/report.html");

/// GET / - the upload form.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /report - the report page (renders the JSON the form page stored).
pub async fn report_page() -> Html<&'static str> {
    Html(REPORT_HTML)
}

/// GET /api/health - liveness plus the set of configured engines.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let engines: Vec<String> = state
        .analyzer
        .engines()
        .iter()
        .map(|e| e.to_string())
        .collect();

    Json(json!({
        "status": "ok",
        "version": claimlens_core::VERSION,
        "engines": engines,
    }))
}

/// POST /analyze - multipart upload, returns the damage report as JSON.
///
/// Accepts an `image` file part or an `image_url` text part; when both are
/// present the uploaded file wins. `api` and `language` fall back to
/// `openai` and `english` when absent, and reject unrecognized values.
pub async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DamageReport>, ApiError> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut image_url: Option<String> = None;
    let mut engine = Engine::OpenAi;
    let mut language = ReportLanguage::English;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let data = field.bytes().await?;
                if !data.is_empty() {
                    image_bytes = Some(data.to_vec());
                }
            }
            "image_url" => {
                let value = field.text().await?;
                let value = value.trim();
                if !value.is_empty() {
                    image_url = Some(value.to_string());
                }
            }
            "api" => {
                engine = field.text().await?.parse()?;
            }
            "language" => {
                language = field.text().await?.parse()?;
            }
            other => {
                tracing::debug!("Ignoring unknown form field {other:?}");
            }
        }
    }

    let report = match (image_bytes, image_url) {
        (Some(bytes), _) => state.analyzer.analyze_bytes(bytes, engine, language).await?,
        (None, Some(url)) => state.analyzer.analyze_url(&url, engine, language).await?,
        (None, None) => return Err(AnalysisError::EmptyImage.into()),
    };

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use claimlens_core::error::AnalysisResult;
    use claimlens_core::vision::{VisionProvider, VisionRequest, VisionResponse};
    use claimlens_core::{Analyzer, Config, ProviderRegistry};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "claimlens-test-boundary";

    const CANNED_RESPONSE: &str = "\
### 1. Vehicle Identification
Make: Honda
Model: Civic
Year: 2019

### 2. Damage Assessment
- Front bumper (dent) - moderate
- Hood (scratch) - minor

### 3. Repair Recommendations
Reshape and repaint the bumper cover.

### 4. Cost Estimation
Total estimated repair cost: $1,250
Estimated repair timeline: 3 days

### 5. Safety Analysis
Safe to drive: yes
";

    /// A canned vision provider that counts how often it is called.
    struct RouteMock {
        reply: Result<String, (Option<u16>, String)>,
        calls: Arc<AtomicU32>,
    }

    impl RouteMock {
        fn success(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing(status_code: Option<u16>, message: &str) -> Self {
            Self {
                reply: Err((status_code, message.to_string())),
                calls: Arc::new(AtomicU32::new(0)),
            }
        }

        fn calls_handle(&self) -> Arc<AtomicU32> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl VisionProvider for RouteMock {
        fn name(&self) -> &str {
            "route-mock"
        }

        async fn analyze(&self, _request: &VisionRequest) -> AnalysisResult<VisionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(VisionResponse {
                    text: text.clone(),
                    model: "mock-v1".to_string(),
                    tokens_used: Some(64),
                    latency_ms: 5,
                }),
                Err((status_code, message)) => Err(AnalysisError::Provider {
                    message: message.clone(),
                    status_code: *status_code,
                }),
            }
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(60)
        }
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.limits.retry_attempts = 0;
        config.limits.retry_delay_ms = 10;
        config
    }

    fn test_app(registry: ProviderRegistry) -> Router {
        let analyzer = Analyzer::with_registry(&fast_config(), registry);
        let state = AppState {
            analyzer: Arc::new(analyzer),
        };
        create_router(state, 10 * 1024 * 1024)
    }

    fn openai_only(mock: RouteMock) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Engine::OpenAi, Arc::new(mock));
        registry
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut cursor = std::io::Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    enum Part<'a> {
        File {
            name: &'a str,
            filename: &'a str,
            data: &'a [u8],
        },
        Text {
            name: &'a str,
            value: &'a str,
        },
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File {
                    name,
                    filename,
                    data,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
                Part::Text { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn analyze_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_analyze_without_image_is_rejected() {
        let mock = RouteMock::success(CANNED_RESPONSE);
        let calls = mock.calls_handle();
        let app = test_app(openai_only(mock));

        let body = multipart_body(&[Part::Text {
            name: "api",
            value: "openai",
        }]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("No image"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_analyze_routes_to_selected_engine() {
        let openai = RouteMock::success(CANNED_RESPONSE);
        let gemini = RouteMock::success(CANNED_RESPONSE);
        let openai_calls = openai.calls_handle();
        let gemini_calls = gemini.calls_handle();

        let mut registry = ProviderRegistry::new();
        registry.register(Engine::OpenAi, Arc::new(openai));
        registry.register(Engine::Gemini, Arc::new(gemini));
        let app = test_app(registry);

        let image = png_bytes(4, 4);
        let body = multipart_body(&[
            Part::File {
                name: "image",
                filename: "crash.png",
                data: &image,
            },
            Part::Text {
                name: "api",
                value: "gemini",
            },
        ]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["engine"], "Google Gemini");
        assert_eq!(gemini_calls.load(Ordering::SeqCst), 1);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_analyze_defaults_to_openai() {
        let mock = RouteMock::success(CANNED_RESPONSE);
        let calls = mock.calls_handle();
        let app = test_app(openai_only(mock));

        let image = png_bytes(4, 4);
        let body = multipart_body(&[Part::File {
            name: "image",
            filename: "crash.png",
            data: &image,
        }]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["engine"], "OpenAI");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_analyze_returns_structured_report() {
        let app = test_app(openai_only(RouteMock::success(CANNED_RESPONSE)));

        let image = png_bytes(4, 4);
        let body = multipart_body(&[Part::File {
            name: "image",
            filename: "crash.png",
            data: &image,
        }]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["vehicle"]["make"], "Honda");
        assert_eq!(json["vehicle"]["model"], "Civic");
        assert_eq!(json["vehicle"]["year"], "2019");
        assert_eq!(json["damages"][0]["part"], "Front bumper");
        assert_eq!(json["damages"][0]["type"], "dent");
        assert_eq!(json["damages"][0]["severity"], "moderate");
        assert_eq!(json["damages"][1]["severity"], "minor");
        assert_eq!(json["total_cost"], "$1,250");
        assert_eq!(json["safety_status"], "safe");
        assert_eq!(json["report_id"].as_str().unwrap().len(), 12);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_analyze_persian_labels() {
        let app = test_app(openai_only(RouteMock::success(CANNED_RESPONSE)));

        let image = png_bytes(4, 4);
        let body = multipart_body(&[
            Part::File {
                name: "image",
                filename: "crash.png",
                data: &image,
            },
            Part::Text {
                name: "language",
                value: "persian",
            },
        ]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["language"], "persian");
        assert_eq!(json["safety_status"], "ایمن");
        assert_eq!(json["damages"][0]["severity"], "متوسط");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_engine_value_is_rejected() {
        let mock = RouteMock::success(CANNED_RESPONSE);
        let calls = mock.calls_handle();
        let app = test_app(openai_only(mock));

        let image = png_bytes(4, 4);
        let body = multipart_body(&[
            Part::File {
                name: "image",
                filename: "crash.png",
                data: &image,
            },
            Part::Text {
                name: "api",
                value: "claude",
            },
        ]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("claude"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_language_value_is_rejected() {
        let mock = RouteMock::success(CANNED_RESPONSE);
        let calls = mock.calls_handle();
        let app = test_app(openai_only(mock));

        let image = png_bytes(4, 4);
        let body = multipart_body(&[
            Part::File {
                name: "image",
                filename: "crash.png",
                data: &image,
            },
            Part::Text {
                name: "language",
                value: "german",
            },
        ]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failing_provider_maps_to_bad_gateway() {
        let app = test_app(openai_only(RouteMock::failing(
            Some(500),
            "upstream had a bad day",
        )));

        let image = png_bytes(4, 4);
        let body = multipart_body(&[Part::File {
            name: "image",
            filename: "crash.png",
            data: &image,
        }]);

        let response = app
            .clone()
            .oneshot(analyze_request(body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Provider error"));

        // The failure is per-request; the same app keeps answering
        let response = app
            .clone()
            .oneshot(analyze_request(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let health = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejected_url_scheme_is_bad_request() {
        let mock = RouteMock::success(CANNED_RESPONSE);
        let calls = mock.calls_handle();
        let app = test_app(openai_only(mock));

        let body = multipart_body(&[Part::Text {
            name: "image_url",
            value: "ftp://example.com/crash.jpg",
        }]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_body_limit_rejects_oversized_upload() {
        let analyzer = Analyzer::with_registry(
            &fast_config(),
            openai_only(RouteMock::success(CANNED_RESPONSE)),
        );
        let state = AppState {
            analyzer: Arc::new(analyzer),
        };
        // 1 KB limit so the request below trips the router's body cap
        let app = create_router(state, 1024);

        let oversized = vec![0u8; 128 * 1024];
        let body = multipart_body(&[Part::File {
            name: "image",
            filename: "huge.bin",
            data: &oversized,
        }]);
        let response = app.oneshot(analyze_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_health_lists_configured_engines() {
        let mut registry = ProviderRegistry::new();
        registry.register(Engine::OpenAi, Arc::new(RouteMock::success(CANNED_RESPONSE)));
        registry.register(Engine::Gemini, Arc::new(RouteMock::success(CANNED_RESPONSE)));
        let app = test_app(registry);

        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], claimlens_core::VERSION);
        let engines = json["engines"].as_array().unwrap();
        assert!(engines.contains(&Value::from("openai")));
        assert!(engines.contains(&Value::from("gemini")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pages_are_served() {
        let app = test_app(openai_only(RouteMock::success(CANNED_RESPONSE)));

        let index = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(index.status(), StatusCode::OK);
        let bytes = index.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("ClaimLens"));

        let report = app
            .oneshot(Request::builder().uri("/report").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(report.status(), StatusCode::OK);
    }
}
