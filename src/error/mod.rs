//! Error handling module

mod types;

pub use types::ApiError;
