//! Services module
//!
//! Contains the hosted-model integrations the analysis pipeline calls.

pub mod gemini;
pub mod model;

pub use gemini::{GeminiConfig, GeminiService};
pub use model::{GenerationRequest, ModelClient, ModelError};
