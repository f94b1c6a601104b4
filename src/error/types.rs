//! API error types

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analysis::{AnalysisError, FieldViolation};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        violations: Vec<FieldViolation>,
    },

    #[error("Request too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream model error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Validation(violations) => ApiError::InvalidRequest {
                message: AnalysisError::Validation(violations.clone()).to_string(),
                violations,
            },
            AnalysisError::Upstream(message) => ApiError::Upstream(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::InvalidRequest {
            message: rejection.body_text(),
            violations: vec![FieldViolation::new("body", rejection.body_text())],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, violations) = match self {
            ApiError::InvalidRequest {
                message,
                violations,
            } => ("invalid_request_error", message, violations),
            ApiError::PayloadTooLarge(msg) => ("request_too_large", msg, Vec::new()),
            ApiError::NotFound(msg) => ("not_found_error", msg, Vec::new()),
            ApiError::Upstream(msg) => ("api_error", msg, Vec::new()),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("api_error", err.to_string(), Vec::new())
            }
        };

        let body = Json(ErrorResponse {
            type_: "error".to_string(),
            error: ErrorDetail {
                type_: error_type.to_string(),
                message,
                field: violations.first().map(|v| v.field.clone()),
                violations,
            },
        });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    #[serde(rename = "type")]
    type_: String,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    type_: String,
    message: String,
    /// First offending field, when the error is about one
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<FieldViolation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_response() {
        let err: ApiError = AnalysisError::Validation(vec![
            FieldViolation::new("dtmUri", "field is required"),
            FieldViolation::new("imageUri", "field is required"),
        ])
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["field"], "dtmUri");
        assert_eq!(body["error"]["violations"].as_array().unwrap().len(), 2);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("imageUri: field is required"));
    }

    #[tokio::test]
    async fn test_upstream_error_response() {
        let err: ApiError = AnalysisError::Upstream("quota exhausted".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "api_error");
        assert_eq!(body["error"]["message"], "quota exhausted");
        assert!(body["error"].get("field").is_none());
        assert!(body["error"].get("violations").is_none());
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = ApiError::NotFound("unknown analysis 'craters'".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "not_found_error");
    }
}
