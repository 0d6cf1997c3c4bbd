//! Alerting
//!
//! Alert model, deduplication, variance formatting, and severity mapping
//! for the critical-alerts view.

mod alert;
mod dedup;
mod filter;
mod manager;
mod variance;

pub use alert::{coerce_number, coerce_string, Alert, AlertDetails, SOURCE_NOT_APPLICABLE};
pub use dedup::{deduplicate, normalized_metric, AlertDeduplicator, DedupKey, DedupOutcome, MetricGroup};
pub use filter::AlertFilter;
pub use manager::{AlertClassifier, AlertConfig, AlertSeverity, AlertView, CriticalAlerts, EventSummary};
pub use variance::{format_value, format_variance, variance_percent, NOT_AVAILABLE};
