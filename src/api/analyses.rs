//! Analysis endpoints
//!
//! POST /v1/analyses/:kind runs one analysis on a JSON body whose fields use
//! the camelCase wire names (`photoDataUri`, `imageBeforeUri`, ...).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::analysis::AnalysisKind;
use crate::error::ApiError;
use crate::middleware::TraceId;
use crate::server::state::AppState;

/// One entry of the analysis listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInfo {
    pub kind: AnalysisKind,
    pub path: String,
    pub output_schema: Value,
}

/// Response for GET /v1/analyses
#[derive(Debug, Serialize)]
pub struct AnalysisList {
    pub object: String,
    pub model: String,
    pub data: Vec<AnalysisInfo>,
}

/// List the supported analyses with their declared output schemas.
///
/// GET /v1/analyses
pub async fn list_analyses(State(state): State<AppState>) -> Json<AnalysisList> {
    let schemas = state.analyzer.schemas();
    let data = AnalysisKind::ALL
        .into_iter()
        .map(|kind| AnalysisInfo {
            kind,
            path: format!("/v1/analyses/{}", kind.slug()),
            output_schema: schemas.get(kind).clone(),
        })
        .collect();

    Json(AnalysisList {
        object: "list".to_string(),
        model: state.analyzer.model_id().to_string(),
        data,
    })
}

/// Run one analysis.
///
/// POST /v1/analyses/:kind
pub async fn analyze(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    trace_id: Option<Extension<TraceId>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let kind = AnalysisKind::from_slug(&slug)
        .ok_or_else(|| ApiError::NotFound(format!("unknown analysis '{slug}'")))?;
    let Json(body) = payload?;

    let trace_id = trace_id.map(|Extension(id)| id.0).unwrap_or_default();
    tracing::info!(trace_id = %trace_id, kind = %kind, "Running analysis");

    match state.analyzer.run_json(kind, body).await {
        Ok(reply) => Ok(Json(reply)),
        Err(err) => {
            if err.is_validation() {
                tracing::warn!(trace_id = %trace_id, kind = %kind, error = %err, "Rejected analysis request");
            } else {
                tracing::error!(trace_id = %trace_id, kind = %kind, error = %err, "Analysis failed");
            }
            Err(err.into())
        }
    }
}
