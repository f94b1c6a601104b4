//! Model client abstraction
//!
//! The pipeline does not know which hosted model answers it. It hands a
//! composed prompt plus the declared output schema to a [`ModelClient`] and
//! expects a parsed JSON reply back.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::analysis::{AnalysisKind, Prompt};

/// Errors that can occur when calling a hosted model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Model returned no content: {0}")]
    EmptyReply(String),

    #[error("Missing API key")]
    MissingApiKey,
}

/// A single structured-output generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: AnalysisKind,
    pub prompt: Prompt,
    /// JSON Schema the reply must follow
    pub output_schema: Value,
}

/// A hosted generative model that can answer with schema-shaped JSON.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier of the model answering requests (e.g. `gemini-2.0-flash`)
    fn model_id(&self) -> &str;

    /// Send one request and return the parsed JSON reply. Single attempt.
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, ModelError>;
}
