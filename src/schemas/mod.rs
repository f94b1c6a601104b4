//! Schema module
//!
//! Wire records: analysis requests and replies, and the Gemini REST shapes.

pub mod analysis;
pub mod gemini;
