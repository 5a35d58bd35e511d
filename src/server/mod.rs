//! HTTP Server
//!
//! Exposes the pipeline as a single multipart endpoint:
//! `POST /refine-prompt` with `user_prompt` and zero or more `files`.

mod handlers;

pub use handlers::{ApiError, RefineForm, RefineResponse};

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::pipeline::RefinePipeline;
use crate::types::Result;

pub const REFINE_ROUTE: &str = "/refine-prompt";

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RefinePipeline>,
}

impl AppState {
    pub fn new(pipeline: RefinePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route(REFINE_ROUTE, post(handlers::refine_prompt))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    let router = if config.cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, pipeline: RefinePipeline) -> Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!(
        %addr,
        drafting_model = pipeline.drafting_model(),
        refining_model = pipeline.refining_model(),
        "Prompt refiner listening"
    );

    let app = router(AppState::new(pipeline), config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ContentPart, GenerationRequest, LlmProvider, LlmResponse};
    use crate::config::LimitsConfig;
    use crate::pipeline::{Drafter, Refiner, RetryPolicy};
    use crate::types::{ErrorCategory, LlmError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "refine-test-boundary";

    const FIVE_SECTIONS: &str = "# 1. Core Product Intent\nA todo app.\n\
        # 2. Key Functional Requirements\n- Add tasks\n\
        # 3. Technical Constraints\nWeb\n\
        # 4. Expected Deliverables\nCode\n\
        # 5. Refined LLM Prompt\nBuild a todo app.";

    /// Returns a fixed reply (or error) and records every request
    struct StubProvider {
        reply: std::result::Result<String, ErrorCategory>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl StubProvider {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(category: ErrorCategory) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(category),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse::content_only(text.clone())),
                Err(category) => Err(LlmError::with_provider(*category, "stub failure", "stub").into()),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    fn app(drafter: Arc<StubProvider>, refiner: Arc<StubProvider>) -> Router {
        app_with_config(drafter, refiner, &ServerConfig::default())
    }

    fn app_with_config(
        drafter: Arc<StubProvider>,
        refiner: Arc<StubProvider>,
        config: &ServerConfig,
    ) -> Router {
        let pipeline = RefinePipeline::new(
            Drafter::new(drafter, RetryPolicy::new(3, Duration::ZERO)),
            Refiner::new(refiner),
            LimitsConfig::default(),
        );
        router(AppState::new(pipeline), config)
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File {
            field: &'a str,
            filename: &'a str,
            content_type: &'a str,
            data: &'a [u8],
        },
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    field,
                    filename,
                    content_type,
                    data,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            field, filename, content_type
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn refine_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(REFINE_ROUTE)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_refined_prompt_starts_at_first_section() {
        let refiner_reply = format!("Here you go!\n```markdown\n{}\n```", FIVE_SECTIONS);
        let drafter = StubProvider::ok("Draft text");
        let refiner = StubProvider::ok(&refiner_reply);

        let response = app(drafter.clone(), refiner.clone())
            .oneshot(refine_request(&[Part::Text("user_prompt", "Build a todo app")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let refined = body["refined_prompt"].as_str().unwrap();
        assert!(refined.starts_with("# 1. Core Product Intent"));
        assert_eq!(refined, FIVE_SECTIONS);
        assert!(body.get("error").is_none());

        let refine_calls = refiner.requests();
        assert_eq!(refine_calls.len(), 1);
        assert!(
            refine_calls[0]
                .joined_text()
                .contains("Gemini Draft: Draft text")
        );
    }

    #[tokio::test]
    async fn test_refiner_failure_returns_cleaned_draft() {
        let draft = "Sure.\n```\n**Goal**: build a todo app\n```";
        let drafter = StubProvider::ok(draft);
        let refiner = StubProvider::failing(ErrorCategory::Transient);

        let response = app(drafter, refiner)
            .oneshot(refine_request(&[Part::Text("user_prompt", "Build a todo app")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["refined_prompt"],
            crate::ai::clean_response(draft).as_str()
        );
    }

    #[tokio::test]
    async fn test_draft_failure_returns_error_payload() {
        let drafter = StubProvider::failing(ErrorCategory::Auth);
        let refiner = StubProvider::ok(FIVE_SECTIONS);

        let response = app(drafter, refiner.clone())
            .oneshot(refine_request(&[Part::Text("user_prompt", "Build a todo app")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("Gemini Error: "));
        assert!(body.get("refined_prompt").is_none());
        assert!(refiner.requests().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_draft_reports_max_retries() {
        let drafter = StubProvider::failing(ErrorCategory::RateLimit);
        let refiner = StubProvider::ok(FIVE_SECTIONS);

        let response = app(drafter.clone(), refiner)
            .oneshot(refine_request(&[Part::Text("user_prompt", "x")]))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("Max retries exceeded")
        );
        assert_eq!(drafter.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_prompt_is_unprocessable() {
        let response = app(StubProvider::ok("d"), StubProvider::ok("r"))
            .oneshot(refine_request(&[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("user_prompt"));
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_unprocessable() {
        let request = Request::builder()
            .method("POST")
            .uri(REFINE_ROUTE)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"user_prompt":"x"}"#))
            .unwrap();

        let response = app(StubProvider::ok("d"), StubProvider::ok("r"))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let drafter = StubProvider::ok("Draft text");
        let config = ServerConfig {
            max_upload_bytes: 1024,
            ..ServerConfig::default()
        };
        let scan = vec![0u8; 4096];
        let parts = [
            Part::Text("user_prompt", "Build a todo app"),
            Part::File {
                field: "files",
                filename: "scan.png",
                content_type: "image/png",
                data: &scan,
            },
        ];

        let response = app_with_config(drafter.clone(), StubProvider::ok("r"), &config)
            .oneshot(refine_request(&parts))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert!(body["error"].is_string());
        assert!(drafter.requests().is_empty());
    }

    #[tokio::test]
    async fn test_uploads_reach_drafter_in_order() {
        let drafter = StubProvider::ok("Draft text");
        let refiner = StubProvider::ok(FIVE_SECTIONS);

        let parts = [
            Part::Text("user_prompt", "Build a todo app"),
            Part::File {
                field: "files",
                filename: "broken.pdf",
                content_type: "application/pdf",
                data: b"not a pdf",
            },
            Part::File {
                field: "files",
                filename: "",
                content_type: "application/octet-stream",
                data: b"",
            },
            Part::File {
                field: "files",
                filename: "notes.txt",
                content_type: "text/plain",
                data: b"ignored",
            },
        ];

        let response = app(drafter.clone(), refiner.clone())
            .oneshot(refine_request(&parts))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let draft_calls = drafter.requests();
        assert_eq!(draft_calls.len(), 1);
        let draft_parts = &draft_calls[0].parts;
        assert_eq!(draft_parts.len(), 2);
        assert_eq!(draft_parts[1], ContentPart::text("\n[PDF Content]\n"));

        let refine_text = refiner.requests()[0].joined_text();
        assert!(refine_text.contains("Context: \n[PDF: broken.pdf]\n"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app(StubProvider::ok("d"), StubProvider::ok("r"))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
