//! Request and reply records for the four lunar analyses
//!
//! Request records mirror what arrives at the trust boundary: every field is
//! optional at the serde level so a missing field is reported by validation with
//! its name instead of failing deserialization. Reply records double as the
//! declared output schema sent to the model; their doc comments become the field
//! descriptions in that schema.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================================================
// Feature Detection
// ============================================================================

/// Hazard feature detection request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DetectFeaturesRequest {
    /// Lunar surface photo as a `data:<mimetype>;base64,<data>` URI
    #[validate(required, custom(function = "crate::analysis::validate_data_uri"))]
    pub photo_data_uri: Option<String>,

    /// Free-text context about the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl DetectFeaturesRequest {
    pub fn new(photo_data_uri: impl Into<String>) -> Self {
        Self {
            photo_data_uri: Some(photo_data_uri.into()),
            additional_context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = Some(context.into());
        self
    }
}

/// A single feature the model found in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFeature {
    /// Kind of feature detected, e.g. landslide or boulder.
    #[serde(rename = "type")]
    pub feature_type: String,

    /// Detection confidence between 0 and 1.
    pub confidence: f64,

    /// Where the feature sits within the image, in words.
    pub location_description: String,
}

/// Hazard feature detection reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetectFeaturesOutput {
    /// Features detected in the image.
    pub detected_features: Vec<DetectedFeature>,

    /// Summary of the detected features and the hazards they pose to lunar missions.
    pub summary: String,
}

// ============================================================================
// Shadow / Slope Analysis
// ============================================================================

/// Shadow and slope terrain classification request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShadowSlopeRequest {
    /// Lunar surface image as a data URI
    #[validate(required, custom(function = "crate::analysis::validate_data_uri"))]
    pub image_uri: Option<String>,

    /// Digital terrain model as a data URI
    #[validate(required, custom(function = "crate::analysis::validate_data_uri"))]
    pub dtm_uri: Option<String>,

    /// Description of the area being analyzed
    #[validate(required)]
    pub description: Option<String>,
}

impl ShadowSlopeRequest {
    pub fn new(
        image_uri: impl Into<String>,
        dtm_uri: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            image_uri: Some(image_uri.into()),
            dtm_uri: Some(dtm_uri.into()),
            description: Some(description.into()),
        }
    }
}

/// Shadow and slope terrain classification reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShadowSlopeOutput {
    /// Findings from the shadow and slope based features.
    pub analysis_results: String,

    /// Risk assessment based on the analysis of displaced mass.
    pub risk_assessment: String,
}

// ============================================================================
// Geological Reasoning
// ============================================================================

/// Geological reasoning request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GeologicalReasoningRequest {
    /// Extracted lunar features such as landslides and boulders
    #[validate(required)]
    pub extracted_features: Option<String>,

    /// Known geological data for the area
    #[validate(required)]
    pub known_geological_data: Option<String>,
}

impl GeologicalReasoningRequest {
    pub fn new(extracted_features: impl Into<String>, known_geological_data: impl Into<String>) -> Self {
        Self {
            extracted_features: Some(extracted_features.into()),
            known_geological_data: Some(known_geological_data.into()),
        }
    }
}

/// Geological reasoning reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeologicalReasoningOutput {
    /// Risk zone map for the analyzed features and data, as a string holding GeoJSON.
    pub risk_zone_mapping: String,

    /// Contextual analysis in paragraph form.
    pub llm_contextual_analysis: String,
}

impl GeologicalReasoningOutput {
    /// Best-effort parse of the risk zone mapping.
    ///
    /// The mapping is opaque text as far as the pipeline is concerned; this only
    /// reports whether the model happened to produce JSON, it does not check
    /// GeoJSON structure.
    pub fn risk_zone_geojson(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.risk_zone_mapping.trim()).ok()
    }

    /// Risk zone mapping pretty-printed when it parses as JSON, verbatim otherwise.
    pub fn pretty_risk_zone_mapping(&self) -> String {
        self.risk_zone_geojson()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
            .unwrap_or_else(|| self.risk_zone_mapping.clone())
    }
}

// ============================================================================
// Temporal Analysis
// ============================================================================

/// Before/after change comparison request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TemporalAnalysisRequest {
    /// Earlier image as a data URI
    #[validate(required, custom(function = "crate::analysis::validate_data_uri"))]
    pub image_before_uri: Option<String>,

    /// Later image as a data URI
    #[validate(required, custom(function = "crate::analysis::validate_data_uri"))]
    pub image_after_uri: Option<String>,

    /// Date the earlier image was taken
    #[validate(required)]
    pub date_before: Option<String>,

    /// Date the later image was taken
    #[validate(required)]
    pub date_after: Option<String>,
}

impl TemporalAnalysisRequest {
    pub fn new(
        image_before_uri: impl Into<String>,
        image_after_uri: impl Into<String>,
        date_before: impl Into<String>,
        date_after: impl Into<String>,
    ) -> Self {
        Self {
            image_before_uri: Some(image_before_uri.into()),
            image_after_uri: Some(image_after_uri.into()),
            date_before: Some(date_before.into()),
            date_after: Some(date_after.into()),
        }
    }
}

/// How much a change matters for mission planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Low,
    Medium,
    High,
}

/// One change found between the two images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedChange {
    /// Detailed description of the change.
    pub description: String,

    /// Location of the change within the image.
    pub location: String,

    /// Significance of the change.
    pub significance: Significance,
}

/// Before/after change comparison reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemporalAnalysisOutput {
    /// High-level summary of the changes between the two images.
    pub change_summary: String,

    /// Each significant change found.
    pub detailed_changes: Vec<DetectedChange>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_names() {
        let request: DetectFeaturesRequest = serde_json::from_value(json!({
            "photoDataUri": "data:image/png;base64,AAAA",
            "additionalContext": "landing hazards"
        }))
        .unwrap();

        assert_eq!(request.photo_data_uri.as_deref(), Some("data:image/png;base64,AAAA"));
        assert_eq!(request.additional_context.as_deref(), Some("landing hazards"));
    }

    #[test]
    fn test_missing_fields_deserialize_as_none() {
        let request: TemporalAnalysisRequest =
            serde_json::from_value(json!({ "dateBefore": "2024-01-01" })).unwrap();

        assert!(request.image_before_uri.is_none());
        assert_eq!(request.date_before.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_validation_flags_missing_and_malformed_fields() {
        let request = ShadowSlopeRequest {
            image_uri: Some("moon.png".to_string()),
            dtm_uri: None,
            description: Some("Crater rim".to_string()),
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("image_uri"));
        assert!(fields.contains_key("dtm_uri"));
        assert!(!fields.contains_key("description"));
    }

    #[test]
    fn test_significance_rejects_unknown_value() {
        let result = serde_json::from_value::<DetectedChange>(json!({
            "description": "new crater",
            "location": "sector 4",
            "significance": "critical"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_type_serializes_as_type() {
        let feature = DetectedFeature {
            feature_type: "boulder".to_string(),
            confidence: 0.82,
            location_description: "NE quadrant".to_string(),
        };
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["type"], "boulder");
        assert_eq!(value["locationDescription"], "NE quadrant");
    }

    #[test]
    fn test_risk_zone_mapping_pretty_print() {
        let output = GeologicalReasoningOutput {
            risk_zone_mapping: r#"{"type":"FeatureCollection","features":[]}"#.to_string(),
            llm_contextual_analysis: "Stable.".to_string(),
        };
        assert_eq!(output.risk_zone_geojson().unwrap()["type"], "FeatureCollection");
        assert!(output.pretty_risk_zone_mapping().contains("\n"));

        let opaque = GeologicalReasoningOutput {
            risk_zone_mapping: "Zone A: high risk near the scarp".to_string(),
            llm_contextual_analysis: "Unstable.".to_string(),
        };
        assert!(opaque.risk_zone_geojson().is_none());
        assert_eq!(opaque.pretty_risk_zone_mapping(), "Zone A: high risk near the scarp");
    }
}
