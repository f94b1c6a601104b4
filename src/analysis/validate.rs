//! Input validation at the trust boundary

use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::analysis::{Analysis, AnalysisError, DataUri, FieldViolation};

/// Check a request and turn it into the analysis' typed input.
///
/// Runs the `validator` rules first so every missing or malformed field is
/// reported together, then parses the data URIs into the input record.
pub fn validate<A: Analysis>(request: A::Request) -> Result<A::Input, AnalysisError> {
    if let Err(errors) = request.validate() {
        let violations = violations_from(&errors);
        tracing::debug!(
            kind = %A::KIND,
            violations = ?violations,
            "Request failed validation"
        );
        return Err(AnalysisError::Validation(violations));
    }

    A::into_input(request).map_err(|violation| AnalysisError::Validation(vec![violation]))
}

/// Read a request record out of a raw JSON body.
///
/// Missing fields are left for [`validate`] to report by name. A body that is
/// not an object, or holds a field of the wrong JSON type, is rejected here
/// with the `body` field path.
pub fn parse_request<A: Analysis>(body: Value) -> Result<A::Request, AnalysisError> {
    if !body.is_object() {
        return Err(AnalysisError::invalid("body", "request body must be a JSON object"));
    }
    serde_json::from_value(body).map_err(|e| AnalysisError::invalid("body", e.to_string()))
}

/// Required data URI field of a validated request.
pub(crate) fn require_data_uri(
    field: &str,
    value: Option<String>,
) -> Result<DataUri, FieldViolation> {
    let value = value.ok_or_else(|| FieldViolation::new(field, REQUIRED))?;
    DataUri::parse(&value).map_err(|e| FieldViolation::new(field, e.to_string()))
}

/// Required text field of a validated request.
pub(crate) fn require_text(field: &str, value: Option<String>) -> Result<String, FieldViolation> {
    value.ok_or_else(|| FieldViolation::new(field, REQUIRED))
}

const REQUIRED: &str = "field is required";

fn violations_from(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            let field = wire_name(&field);
            errors
                .iter()
                .map(move |error| FieldViolation::new(field.clone(), reason(error)))
        })
        .collect();
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}

fn reason(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match &*error.code {
        "required" => REQUIRED.to_string(),
        code => format!("failed '{code}' check"),
    }
}

/// `photo_data_uri` -> `photoDataUri`
fn wire_name(field: &str) -> String {
    let mut name = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            name.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            name.push(c);
        }
    }
    name
}
