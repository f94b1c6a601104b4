//! Application state container
//!
//! Shared state passed to every request handler via Axum's state extraction.

use crate::analysis::Analyzer;
use crate::config::Settings;
use crate::services::{GeminiConfig, GeminiService, ModelClient};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
///
/// Cheaply cloneable (via Arc) and thread-safe.
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Analysis pipeline bound to the configured model
    pub analyzer: Analyzer,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create the state with a Gemini client built from `settings`.
    ///
    /// Fails when no API key is configured.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let api_key = settings
            .gemini_api_key
            .clone()
            .context("GEMINI_API_KEY (or GOOGLE_API_KEY) must be set")?;

        tracing::debug!(
            model = %settings.gemini_model,
            base_url = %settings.gemini_base_url,
            "Creating Gemini client"
        );

        let config = GeminiConfig::new(api_key)
            .with_model(settings.gemini_model.clone())
            .with_base_url(settings.gemini_base_url.clone());
        let gemini = GeminiService::new(config)?;

        Ok(Self::with_model(settings, Arc::new(gemini)))
    }

    /// Create the state around an already-built model client.
    pub fn with_model(settings: Settings, model: Arc<dyn ModelClient>) -> Self {
        let analyzer = Analyzer::new(model);

        tracing::info!(model = %analyzer.model_id(), "Application state initialized");

        Self {
            settings: Arc::new(settings),
            analyzer,
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::model::stub::StubModel;
    use serde_json::json;

    #[test]
    fn test_new_requires_api_key() {
        let err = AppState::new(Settings::default()).err().unwrap();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_new_builds_gemini_analyzer() {
        let settings = Settings {
            gemini_api_key: Some("test-key".to_string()),
            gemini_model: "gemini-2.5-flash".to_string(),
            ..Settings::default()
        };
        let state = AppState::new(settings).unwrap();
        assert_eq!(state.analyzer.model_id(), "gemini-2.5-flash");
    }

    #[test]
    fn test_with_model() {
        let state = AppState::with_model(
            Settings::default(),
            Arc::new(StubModel::replying(json!({}))),
        );
        assert_eq!(state.analyzer.model_id(), "stub-model");
        assert_eq!(state.uptime_seconds(), 0);
    }
}
