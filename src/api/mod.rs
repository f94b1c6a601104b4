//! API endpoint handlers module

pub mod analyses;
pub mod health;
