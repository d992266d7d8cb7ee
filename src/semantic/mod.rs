//! Semantic analysis over a model's schema.
//!
//! Currently this is relationship inference: heuristics that read table
//! metadata and propose joins for the caller to accept or ignore.

pub mod inference;

pub use inference::{infer, InferenceConfig, InferenceEngine, Suggestion};
