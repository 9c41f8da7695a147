//! Core types for reqroute
//!
//! Shared vocabulary for the cascaded pre-classification router: the
//! category and tier tag sets, the per-call classification result, the
//! LLM verdict shape, review-queue entries, and the crate error type.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    ClassificationResult, ClassificationTier, LlmVerdict, RequirementCategory, ReviewEntry,
};
