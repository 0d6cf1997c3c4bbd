//! Storage Layer
//!
//! In-memory document store for dashboard profiles and alert records.

mod repository;

pub use repository::{ProfileSummary, Repository, DEFAULT_MAX_ALERT_RECORDS};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
