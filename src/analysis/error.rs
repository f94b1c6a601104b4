//! Analysis error types

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// One rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Wire name of the field (`photoDataUri`), or `body` when the request as a
    /// whole could not be read
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// The two ways an analysis can fail.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The request was rejected before any model call.
    #[error("Invalid request: {}", join(.0))]
    Validation(Vec<FieldViolation>),

    /// The model call failed or its reply did not fit the declared schema.
    #[error("Model request failed: {0}")]
    Upstream(String),
}

impl AnalysisError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::Validation(vec![FieldViolation::new(field, reason)])
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AnalysisError::Validation(_))
    }

    /// Rejected fields, empty for upstream failures.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            AnalysisError::Validation(violations) => violations,
            AnalysisError::Upstream(_) => &[],
        }
    }
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = AnalysisError::Validation(vec![
            FieldViolation::new("dtmUri", "field is required"),
            FieldViolation::new("imageUri", "must be a data URI starting with 'data:'"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid request: dtmUri: field is required; imageUri: must be a data URI starting with 'data:'"
        );
        assert!(err.is_validation());
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_upstream_has_no_violations() {
        let err = AnalysisError::Upstream("quota exhausted".to_string());
        assert_eq!(err.to_string(), "Model request failed: quota exhausted");
        assert!(err.violations().is_empty());
    }
}
