//! The four analyses and their validated inputs

use crate::analysis::validate::{require_data_uri, require_text};
use crate::analysis::{Analysis, AnalysisKind, DataUri, FieldValue, FieldViolation, PromptFields};
use crate::schemas::analysis::{
    DetectFeaturesOutput, DetectFeaturesRequest, GeologicalReasoningOutput,
    GeologicalReasoningRequest, ShadowSlopeOutput, ShadowSlopeRequest, TemporalAnalysisOutput,
    TemporalAnalysisRequest,
};

// ============================================================================
// Feature Detection
// ============================================================================

/// Landslide, boulder and hazard detection in a single image.
pub struct FeatureDetection;

#[derive(Debug, Clone)]
pub struct FeatureDetectionInput {
    pub photo: DataUri,
    pub additional_context: Option<String>,
}

impl PromptFields for FeatureDetectionInput {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "photoDataUri" => Some(FieldValue::Media(&self.photo)),
            "additionalContext" => self.additional_context.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}

impl Analysis for FeatureDetection {
    const KIND: AnalysisKind = AnalysisKind::FeatureDetection;
    type Request = DetectFeaturesRequest;
    type Input = FeatureDetectionInput;
    type Output = DetectFeaturesOutput;

    fn into_input(request: DetectFeaturesRequest) -> Result<FeatureDetectionInput, FieldViolation> {
        Ok(FeatureDetectionInput {
            photo: require_data_uri("photoDataUri", request.photo_data_uri)?,
            additional_context: request.additional_context,
        })
    }
}

// ============================================================================
// Shadow / Slope Analysis
// ============================================================================

/// Natural terrain versus displaced mass, from an image plus terrain model.
pub struct ShadowSlope;

#[derive(Debug, Clone)]
pub struct ShadowSlopeInput {
    pub image: DataUri,
    pub terrain_model: DataUri,
    pub description: String,
}

impl PromptFields for ShadowSlopeInput {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "imageUri" => Some(FieldValue::Media(&self.image)),
            "dtmUri" => Some(FieldValue::Media(&self.terrain_model)),
            "description" => Some(FieldValue::Text(&self.description)),
            _ => None,
        }
    }
}

impl Analysis for ShadowSlope {
    const KIND: AnalysisKind = AnalysisKind::ShadowSlope;
    type Request = ShadowSlopeRequest;
    type Input = ShadowSlopeInput;
    type Output = ShadowSlopeOutput;

    fn into_input(request: ShadowSlopeRequest) -> Result<ShadowSlopeInput, FieldViolation> {
        Ok(ShadowSlopeInput {
            image: require_data_uri("imageUri", request.image_uri)?,
            terrain_model: require_data_uri("dtmUri", request.dtm_uri)?,
            description: require_text("description", request.description)?,
        })
    }
}

// ============================================================================
// Geological Reasoning
// ============================================================================

/// Risk zone mapping from extracted features and known geology. Text only.
pub struct GeologicalReasoning;

#[derive(Debug, Clone)]
pub struct GeologicalReasoningInput {
    pub extracted_features: String,
    pub known_geological_data: String,
}

impl PromptFields for GeologicalReasoningInput {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "extractedFeatures" => Some(FieldValue::Text(&self.extracted_features)),
            "knownGeologicalData" => Some(FieldValue::Text(&self.known_geological_data)),
            _ => None,
        }
    }
}

impl Analysis for GeologicalReasoning {
    const KIND: AnalysisKind = AnalysisKind::GeologicalReasoning;
    type Request = GeologicalReasoningRequest;
    type Input = GeologicalReasoningInput;
    type Output = GeologicalReasoningOutput;

    fn into_input(
        request: GeologicalReasoningRequest,
    ) -> Result<GeologicalReasoningInput, FieldViolation> {
        Ok(GeologicalReasoningInput {
            extracted_features: require_text("extractedFeatures", request.extracted_features)?,
            known_geological_data: require_text(
                "knownGeologicalData",
                request.known_geological_data,
            )?,
        })
    }
}

// ============================================================================
// Temporal Analysis
// ============================================================================

/// Change comparison between a before and an after image.
pub struct TemporalAnalysis;

#[derive(Debug, Clone)]
pub struct TemporalAnalysisInput {
    pub image_before: DataUri,
    pub image_after: DataUri,
    pub date_before: String,
    pub date_after: String,
}

impl PromptFields for TemporalAnalysisInput {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "imageBeforeUri" => Some(FieldValue::Media(&self.image_before)),
            "imageAfterUri" => Some(FieldValue::Media(&self.image_after)),
            "dateBefore" => Some(FieldValue::Text(&self.date_before)),
            "dateAfter" => Some(FieldValue::Text(&self.date_after)),
            _ => None,
        }
    }
}

impl Analysis for TemporalAnalysis {
    const KIND: AnalysisKind = AnalysisKind::TemporalAnalysis;
    type Request = TemporalAnalysisRequest;
    type Input = TemporalAnalysisInput;
    type Output = TemporalAnalysisOutput;

    fn into_input(request: TemporalAnalysisRequest) -> Result<TemporalAnalysisInput, FieldViolation> {
        Ok(TemporalAnalysisInput {
            image_before: require_data_uri("imageBeforeUri", request.image_before_uri)?,
            image_after: require_data_uri("imageAfterUri", request.image_after_uri)?,
            date_before: require_text("dateBefore", request.date_before)?,
            date_after: require_text("dateAfter", request.date_after)?,
        })
    }
}
