//! Gemini service for Google Gemini API interactions
//!
//! This module handles structured-output generation against the Gemini REST
//! API. One request per call: no retries, no timeout policy, no fallback
//! model.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::schemas::gemini::{models, GeminiError, GeminiRequest, GeminiResponse};
use crate::services::model::{GenerationRequest, ModelClient, ModelError};

// ============================================================================
// Constants
// ============================================================================

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = models::GEMINI_2_0_FLASH;

// ============================================================================
// Gemini Service
// ============================================================================

/// Configuration for Gemini service
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key for authentication
    pub api_key: String,

    /// Model name (e.g., "gemini-2.0-flash")
    pub model: String,

    /// Base URL (default: generativelanguage.googleapis.com)
    pub base_url: Option<String>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Service for interacting with Google Gemini API
#[derive(Clone)]
pub struct GeminiService {
    /// HTTP client
    client: Client,

    /// Base URL for API calls
    base_url: Option<String>,

    /// Model used for every call
    model: String,

    api_key: String,
}

impl GeminiService {
    /// Create a new Gemini service
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::MissingApiKey);
        }

        let client = Client::builder().build()?;

        tracing::info!(
            model = %config.model,
            base_url = %config.base_url.as_deref().unwrap_or(GEMINI_API_BASE),
            "Initialized Gemini service"
        );

        Ok(Self {
            client,
            base_url: config.base_url,
            model: config.model,
            api_key: config.api_key,
        })
    }

    /// Get the base URL
    fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(GEMINI_API_BASE)
            .trim_end_matches('/')
    }

    /// Generate content (non-streaming)
    pub async fn generate_content(
        &self,
        request: &GeminiRequest,
    ) -> Result<GeminiResponse, ModelError> {
        let url = format!("{}/models/{}:generateContent", self.base_url(), self.model);

        tracing::debug!(
            model = %self.model,
            url = %url,
            "Calling Gemini generateContent API"
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();

            // Try to parse as Gemini error
            if let Ok(gemini_error) = serde_json::from_str::<GeminiError>(&error_text) {
                return Err(ModelError::ApiError {
                    code: gemini_error.error.code,
                    message: gemini_error.error.message,
                });
            }

            return Err(ModelError::ApiError {
                code: status.as_u16() as i32,
                message: error_text,
            });
        }

        let response_text = resp.text().await?;

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(error = %e, body = %response_text, "Failed to parse Gemini response");
            ModelError::ParseError(e.to_string())
        })
    }
}

#[async_trait]
impl ModelClient for GeminiService {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Value, ModelError> {
        let body = GeminiRequest::structured(&request.prompt, request.output_schema.clone());
        let response = self.generate_content(&body).await?;

        if let Some(usage) = &response.usage_metadata {
            tracing::debug!(
                kind = %request.kind,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }

        let text = response
            .first_text()
            .ok_or_else(|| ModelError::EmptyReply(response.empty_reason()))?;

        serde_json::from_str(strip_code_fence(&text)).map_err(|e| {
            tracing::warn!(kind = %request.kind, error = %e, "Gemini reply is not JSON");
            ModelError::ParseError(format!("reply is not valid JSON: {e}"))
        })
    }
}

/// Drop a surrounding ```json fence if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisKind, DataUri, Prompt, PromptPart};
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::json;

    #[test]
    fn test_gemini_config() {
        let config = GeminiConfig::new("test-api-key")
            .with_model(models::GEMINI_2_5_FLASH)
            .with_base_url("https://custom.api.com");

        assert_eq!(config.api_key, "test-api-key");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.base_url, Some("https://custom.api.com".to_string()));
        assert!(!format!("{:?}", config).contains("test-api-key"));
    }

    #[test]
    fn test_gemini_service_empty_key_error() {
        let result = GeminiService::new(GeminiConfig::new("  "));
        assert!(matches!(result, Err(ModelError::MissingApiKey)));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    fn generation() -> GenerationRequest {
        GenerationRequest {
            kind: AnalysisKind::FeatureDetection,
            prompt: Prompt {
                parts: vec![
                    PromptPart::Text("Image: ".to_string()),
                    PromptPart::Media(DataUri::parse("data:image/png;base64,AAAA").unwrap()),
                ],
            },
            output_schema: json!({"type": "object"}),
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v1beta", addr)
    }

    #[tokio::test]
    async fn test_generate_sends_structured_request() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(call, "gemini-2.0-flash:generateContent");
                assert_eq!(headers["x-goog-api-key"], "secret");
                assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
                assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
                Json(json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "{\"summary\": \"clear\"}"}]},
                        "finishReason": "STOP"
                    }]
                }))
            }),
        );
        let base_url = serve(router).await;

        let service = GeminiService::new(GeminiConfig::new("secret").with_base_url(base_url)).unwrap();
        let reply = service.generate(&generation()).await.unwrap();

        assert_eq!(reply, json!({"summary": "clear"}));
    }

    #[tokio::test]
    async fn test_generate_surfaces_api_error() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
                    })),
                )
            }),
        );
        let base_url = serve(router).await;

        let service = GeminiService::new(GeminiConfig::new("secret").with_base_url(base_url)).unwrap();
        let err = service.generate(&generation()).await.unwrap_err();

        match err {
            ModelError::ApiError { code, message } => {
                assert_eq!(code, 429);
                assert_eq!(message, "Resource has been exhausted");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_non_json_reply() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async {
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": "I see two boulders."}]}}]
                }))
            }),
        );
        let base_url = serve(router).await;

        let service = GeminiService::new(GeminiConfig::new("secret").with_base_url(base_url)).unwrap();
        let err = service.generate(&generation()).await.unwrap_err();

        assert!(matches!(err, ModelError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_generate_reports_blocked_prompt() {
        let router = Router::new().route(
            "/v1beta/models/:call",
            post(|| async { Json(json!({"promptFeedback": {"blockReason": "SAFETY"}})) }),
        );
        let base_url = serve(router).await;

        let service = GeminiService::new(GeminiConfig::new("secret").with_base_url(base_url)).unwrap();
        let err = service.generate(&generation()).await.unwrap_err();

        assert_eq!(err.to_string(), "Model returned no content: prompt blocked (SAFETY)");
    }
}
