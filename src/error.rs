//! Typed errors for the memory core.
//!
//! Callers branch on [`MemoryError`] variants instead of matching message
//! strings. Application layers (CLI, server) wrap these in `anyhow`.

use thiserror::Error;

/// Errors produced by the record store, vector index, and memory store.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Empty or whitespace-only text, or an unusable argument such as `k = 0`.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vector whose length differs from the store's fixed dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Search against an index holding zero vectors.
    #[error("memory is empty, nothing to search")]
    EmptyIndex,

    /// No record with the given id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A stored record whose embedding blob no longer decodes.
    #[error("record {id} is corrupt: {reason}")]
    CorruptRecord { id: String, reason: String },

    /// Durable-medium failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Upstream embedding failure, message passed through verbatim.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// Writing an index snapshot failed.
    #[error(transparent)]
    Snapshot(#[from] crate::index::snapshot::SnapshotError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl MemoryError {
    /// Build a [`MemoryError::DimensionMismatch`] if `actual != expected`.
    pub fn check_dimension(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch { expected, actual })
        }
    }

    /// Reject vectors with NaN or infinite components. Such rows would
    /// outrank every real score.
    pub fn check_finite(vector: &[f32]) -> Result<()> {
        if vector.iter().all(|x| x.is_finite()) {
            Ok(())
        } else {
            Err(Self::InvalidInput(
                "embedding contains non-finite values".into(),
            ))
        }
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
