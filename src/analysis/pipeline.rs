//! The analysis pipeline
//!
//! validate -> compose prompt -> invoke model -> check reply -> return.
//! No retries, no partial results. The model handle is the only shared state
//! and is read-only.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::prompt::compose;
use crate::analysis::validate::{parse_request, validate};
use crate::analysis::{
    Analysis, AnalysisError, AnalysisKind, FeatureDetection, GeologicalReasoning,
    SchemaRegistry, ShadowSlope, TemporalAnalysis,
};
use crate::schemas::analysis::{
    DetectFeaturesOutput, DetectFeaturesRequest, GeologicalReasoningOutput,
    GeologicalReasoningRequest, ShadowSlopeOutput, ShadowSlopeRequest, TemporalAnalysisOutput,
    TemporalAnalysisRequest,
};
use crate::services::{GenerationRequest, ModelClient};

/// Runs lunar analyses against a configured model.
///
/// Cheap to clone; clones share the model handle and schema registry.
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn ModelClient>,
    schemas: Arc<SchemaRegistry>,
}

impl Analyzer {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            schemas: Arc::new(SchemaRegistry::new()),
        }
    }

    /// Identifier of the model behind this analyzer.
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Landslide and boulder detection in a single lunar image.
    pub async fn detect_features(
        &self,
        request: DetectFeaturesRequest,
    ) -> Result<DetectFeaturesOutput, AnalysisError> {
        self.run::<FeatureDetection>(request).await
    }

    /// Natural terrain versus displaced mass from an image and terrain model.
    pub async fn analyze_shadow_slope(
        &self,
        request: ShadowSlopeRequest,
    ) -> Result<ShadowSlopeOutput, AnalysisError> {
        self.run::<ShadowSlope>(request).await
    }

    /// Risk zone mapping from extracted features and known geological data.
    pub async fn enhance_geological_reasoning(
        &self,
        request: GeologicalReasoningRequest,
    ) -> Result<GeologicalReasoningOutput, AnalysisError> {
        self.run::<GeologicalReasoning>(request).await
    }

    /// Change comparison between a before and an after image.
    pub async fn analyze_temporal_changes(
        &self,
        request: TemporalAnalysisRequest,
    ) -> Result<TemporalAnalysisOutput, AnalysisError> {
        self.run::<TemporalAnalysis>(request).await
    }

    /// Run any analysis.
    pub async fn run<A: Analysis>(&self, request: A::Request) -> Result<A::Output, AnalysisError> {
        let reply = self.invoke::<A>(request).await?;
        self.schemas.decode_reply(A::KIND, reply)
    }

    /// Run the analysis for `kind` on a raw JSON body.
    ///
    /// Returns the model reply exactly as received once it has passed the
    /// declared output schema.
    pub async fn run_json(&self, kind: AnalysisKind, body: Value) -> Result<Value, AnalysisError> {
        match kind {
            AnalysisKind::FeatureDetection => self.run_value::<FeatureDetection>(body).await,
            AnalysisKind::ShadowSlope => self.run_value::<ShadowSlope>(body).await,
            AnalysisKind::GeologicalReasoning => self.run_value::<GeologicalReasoning>(body).await,
            AnalysisKind::TemporalAnalysis => self.run_value::<TemporalAnalysis>(body).await,
        }
    }

    async fn run_value<A: Analysis>(&self, body: Value) -> Result<Value, AnalysisError> {
        let request = parse_request::<A>(body)?;
        let reply = self.invoke::<A>(request).await?;
        self.schemas.decode_reply::<A::Output>(A::KIND, reply.clone())?;
        Ok(reply)
    }

    /// validate -> compose -> model -> schema check. Yields the checked reply.
    async fn invoke<A: Analysis>(&self, request: A::Request) -> Result<Value, AnalysisError> {
        let start = Instant::now();
        let kind = A::KIND;

        let input = validate::<A>(request)?;
        let prompt = compose(kind, &input);

        tracing::debug!(
            kind = %kind,
            model = %self.model.model_id(),
            prompt_chars = prompt.text().len(),
            media_parts = prompt.media().count(),
            "Invoking model"
        );

        let generation = GenerationRequest {
            kind,
            prompt,
            output_schema: self.schemas.get(kind).clone(),
        };
        let reply = self.model.generate(&generation).await.map_err(|e| {
            tracing::error!(kind = %kind, error = %e, "Model call failed");
            AnalysisError::Upstream(e.to_string())
        })?;

        self.schemas.check_reply(kind, &reply)?;

        tracing::info!(
            kind = %kind,
            model = %self.model.model_id(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Analysis completed"
        );

        Ok(reply)
    }
}
