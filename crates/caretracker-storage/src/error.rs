use thiserror::Error;

use caretracker_core::error::CoreError;
use caretracker_scoring::error::ScoringError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {key}")]
    NotFound { key: String },

    #[error("version mismatch (expected {expected}, stored {actual})")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("classification has no selected care services: {key}")]
    Unclassified { key: String },

    /// The mutation is live in memory; only the snapshot write failed.
    #[error("change applied but not persisted: {reason}")]
    NotPersisted { reason: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
}
