//! Lunar imagery analysis through a hosted multimodal model

// Public modules
pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;

// Re-export commonly used types
pub use analysis::{AnalysisError, AnalysisKind, Analyzer};
pub use config::Settings;
pub use error::ApiError;
pub use server::App;
