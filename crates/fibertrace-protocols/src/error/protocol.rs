//! Top-level error type.

use thiserror::Error;

use super::{ExtractionError, HookError, SelectionError};

/// Top-level fibertrace error type.
#[derive(Debug, Error)]
pub enum FibertraceError {
    #[error("Hook error: {0}")]
    Hook(#[from] HookError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
