//! This module defines the single, unified error type for the entire biotab library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiotabError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid arguments: {0}")]
    InvalidArgument(String),

    #[error("invalid field ID: {0}. Must be numeric.")]
    Validation(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("internal logic error (this is a bug): {0}")]
    Internal(String),

    /// Any downstream encode/decode failure, tagged with the pipeline stage
    /// it occurred in.
    #[error("conversion failed at stage '{stage}': {source}")]
    ConversionFailure {
        stage: String,
        #[source]
        source: Box<BiotabError>,
    },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the Arrow library.
    #[error("Arrow operation failed: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// An error originating from the Parquet reader/writer.
    #[error("Parquet operation failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// An error originating from the underlying I/O subsystem (e.g., file not found
    /// surfaced mid-stream, disk full).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, during config-file deserialization.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl BiotabError {
    /// Wraps this error with the pipeline stage it surfaced in. Semantic errors
    /// (bad arguments, missing files) pass through untouched so callers can
    /// still match on their kind.
    pub fn in_stage(self, stage: &str) -> Self {
        match self {
            e @ (BiotabError::NotFound(_)
            | BiotabError::InvalidArgument(_)
            | BiotabError::Validation(_)
            | BiotabError::Schema(_)) => e,
            other => BiotabError::ConversionFailure {
                stage: stage.to_string(),
                source: Box::new(other),
            },
        }
    }
}
