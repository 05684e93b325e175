//! Error types for the Obra Engine.
//!
//! Input problems are reported before any calculation runs.  Missing
//! catalog entries are split in two: an unknown template is an error,
//! an unknown subcategory is a warning carried in the result.

use crate::models::SubmissionStatus;
use thiserror::Error;

/// Errors raised by the calculators and their collaborators.
///
/// Unresolved subcategories are not errors; they are reported in
/// [`CostEstimation::unresolved`](crate::models::CostEstimation).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("submission not found: {0}")]
    SubmissionNotFound(String),

    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },

    #[error("catalog error: {0}")]
    Catalog(String),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
