//! Alert Deduplication
//!
//! Collapses raw alerts into one alert per measurement key. `count` and
//! `successCount` describe the same measurement; when both show up for a key
//! the canonical `count` alert wins, otherwise the first alert seen is kept.

use crate::alert::Alert;
use std::collections::HashMap;
use tracing::debug;

const COUNT: &str = "count";
const SUCCESS_COUNT: &str = "successcount";

/// Normalized category deciding whether two alerts measure the same thing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricGroup {
    /// `count` and `successCount`
    CountOrSuccess,
    /// Any other lower-cased metric name
    Named(String),
    /// No metric name
    Other,
}

impl MetricGroup {
    /// Group for an already lower-cased metric name
    pub fn from_normalized(metric: &str) -> Self {
        match metric {
            COUNT | SUCCESS_COUNT => MetricGroup::CountOrSuccess,
            // A literal "other" metric shares the bucket of a missing one
            "" | "other" => MetricGroup::Other,
            name => MetricGroup::Named(name.to_string()),
        }
    }

    pub fn of(alert: &Alert) -> Self {
        Self::from_normalized(&normalized_metric(alert))
    }
}

/// Lower-cased metric name, empty when absent
pub fn normalized_metric(alert: &Alert) -> String {
    alert
        .details
        .metric
        .as_deref()
        .unwrap_or_default()
        .to_lowercase()
}

/// Deduplication key
///
/// Struct fields instead of a joined string, so values containing a
/// separator never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub event_id: Option<u64>,
    pub pos: Option<u64>,
    pub source: Option<i64>,
    pub metric_group: MetricGroup,
    pub status: String,
}

impl DedupKey {
    pub fn of(alert: &Alert) -> Self {
        Self {
            event_id: alert.event_id,
            pos: alert.pos,
            source: alert.source,
            metric_group: MetricGroup::of(alert),
            status: alert.details.status.clone().unwrap_or_default(),
        }
    }
}

/// What happened to an alert pushed into the deduplicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    /// First alert for its key
    Inserted,
    /// Replaced a stored `successCount` alert with a `count` alert
    Replaced,
    /// Key already covered
    Discarded,
}

/// Order-preserving alert deduplicator
#[derive(Debug, Default)]
pub struct AlertDeduplicator {
    /// Key to position in `alerts`
    index: HashMap<DedupKey, usize>,
    /// Retained alerts in first-insertion order of their keys
    alerts: Vec<Alert>,
}

impl AlertDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one alert
    pub fn push(&mut self, alert: Alert) -> DedupOutcome {
        let key = DedupKey::of(&alert);

        let Some(&slot) = self.index.get(&key) else {
            self.index.insert(key, self.alerts.len());
            self.alerts.push(alert);
            return DedupOutcome::Inserted;
        };

        let stored = &mut self.alerts[slot];
        if normalized_metric(&alert) == COUNT && normalized_metric(stored) == SUCCESS_COUNT {
            debug!(
                "Replacing successCount alert with count alert for event {:?}",
                key.event_id
            );
            *stored = alert;
            DedupOutcome::Replaced
        } else {
            DedupOutcome::Discarded
        }
    }

    /// Number of distinct keys seen
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn into_alerts(self) -> Vec<Alert> {
        self.alerts
    }
}

impl Extend<Alert> for AlertDeduplicator {
    fn extend<I: IntoIterator<Item = Alert>>(&mut self, iter: I) {
        for alert in iter {
            self.push(alert);
        }
    }
}

/// Deduplicate a list of alerts, keeping first-seen order of keys
pub fn deduplicate(alerts: &[Alert]) -> Vec<Alert> {
    let mut dedup = AlertDeduplicator::new();
    dedup.extend(alerts.iter().cloned());
    debug!("Deduplicated {} alerts into {}", alerts.len(), dedup.len());
    dedup.into_alerts()
}
