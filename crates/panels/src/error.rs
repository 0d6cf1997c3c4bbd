//! Panel Error Types

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from panel and profile edits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    /// No panel with this id in the collection
    #[error("Panel not found: {0}")]
    NotFound(String),

    /// Source and target of a merge are the same panel
    #[error("Cannot merge panel {0} into itself")]
    SelfMerge(String),

    /// Date range ends before it starts
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    /// Event already selected on the panel
    #[error("Event {0} is already on the panel")]
    DuplicateEvent(u64),

    /// Two panels of a profile share an id
    #[error("Duplicate panel id: {0}")]
    DuplicatePanel(String),
}
