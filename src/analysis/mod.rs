//! Lunar analysis pipeline
//!
//! Every analysis runs the same straight line: validate the request, compose
//! the prompt from the kind's template, ask the model for a reply shaped like
//! the kind's output schema, check the reply against that schema and hand it
//! back unchanged. What differs between kinds is data: the [`Analysis`] trait
//! binds each kind to its request, validated input and output types, and
//! [`AnalysisKind`] keys the template and schema tables.

pub mod data_uri;
pub mod error;
pub mod kinds;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod validate;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

pub use data_uri::{validate_data_uri, DataUri, DataUriError};
pub use error::{AnalysisError, FieldViolation};
pub use kinds::{FeatureDetection, GeologicalReasoning, ShadowSlope, TemporalAnalysis};
pub use pipeline::Analyzer;
pub use prompt::{FieldValue, Prompt, PromptFields, PromptPart};
pub use schema::SchemaRegistry;

/// The four supported analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    FeatureDetection,
    ShadowSlope,
    GeologicalReasoning,
    TemporalAnalysis,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::FeatureDetection,
        AnalysisKind::ShadowSlope,
        AnalysisKind::GeologicalReasoning,
        AnalysisKind::TemporalAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::FeatureDetection => "feature_detection",
            AnalysisKind::ShadowSlope => "shadow_slope",
            AnalysisKind::GeologicalReasoning => "geological_reasoning",
            AnalysisKind::TemporalAnalysis => "temporal_analysis",
        }
    }

    /// URL path segment under `/v1/analyses/`.
    pub fn slug(&self) -> &'static str {
        match self {
            AnalysisKind::FeatureDetection => "feature-detection",
            AnalysisKind::ShadowSlope => "shadow-slope",
            AnalysisKind::GeologicalReasoning => "geological-reasoning",
            AnalysisKind::TemporalAnalysis => "temporal-changes",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// Position in [`AnalysisKind::ALL`].
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binds an analysis kind to its request, validated input and output records.
pub trait Analysis: Send + Sync + 'static {
    const KIND: AnalysisKind;

    /// Record as received at the trust boundary.
    type Request: DeserializeOwned + Validate + Send;

    /// Record after validation, with data URIs parsed.
    type Input: PromptFields + Send + Sync;

    /// Structured reply the model is asked to produce.
    type Output: Serialize + DeserializeOwned + JsonSchema + Send;

    /// Convert a request that passed field validation into the typed input.
    fn into_input(request: Self::Request) -> Result<Self::Input, FieldViolation>;
}
