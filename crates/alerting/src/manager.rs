//! Alert classification and the critical-alerts view

use crate::alert::Alert;
use crate::dedup::deduplicate;
use crate::filter::AlertFilter;
use crate::variance::{format_value, format_variance, variance_percent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Absolute variance (percent) at which an alert is critical (default: 50)
    pub critical_variance_pct: f64,
    /// Threshold used when an alert carries none (default: 20)
    pub default_threshold_pct: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            critical_variance_pct: 50.0,
            default_threshold_pct: 20.0,
        }
    }
}

/// Severity of a single alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Unknown => "unknown",
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// Display row for the critical-alerts table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertView {
    pub event_id: Option<u64>,
    pub pos: Option<u64>,
    pub source: Option<i64>,
    pub platform: Option<u64>,
    pub metric: String,
    pub status: String,
    pub current: String,
    pub expected: String,
    pub variance: String,
    pub severity: AlertSeverity,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Per-event roll-up of a deduplicated alert list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub event_id: Option<u64>,
    pub alert_count: usize,
    pub critical_count: usize,
    pub latest: Option<DateTime<Utc>>,
}

/// Critical-alerts table with its per-event roll-up
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalAlerts {
    /// Alerts that passed the filter, before deduplication
    pub matched: usize,
    pub rows: Vec<AlertView>,
    pub by_event: Vec<EventSummary>,
}

/// Maps alerts to severities and display rows
#[derive(Debug, Clone, Default)]
pub struct AlertClassifier {
    config: AlertConfig,
}

impl AlertClassifier {
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert classifier with config: {:?}", config);
        Self { config }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Get severity level based on variance from the expected baseline
    pub fn severity(&self, alert: &Alert) -> AlertSeverity {
        let details = &alert.details;
        let Some(variance) = variance_percent(details.current_value, details.expected_value)
        else {
            return AlertSeverity::Unknown;
        };

        let threshold = details
            .threshold
            .filter(|t| t.is_finite() && *t > 0.0)
            .unwrap_or(self.config.default_threshold_pct);
        let magnitude = variance.abs();

        if magnitude >= self.config.critical_variance_pct {
            AlertSeverity::Critical
        } else if magnitude >= threshold {
            AlertSeverity::High
        } else if magnitude >= threshold / 2.0 {
            AlertSeverity::Medium
        } else {
            AlertSeverity::Low
        }
    }

    /// Build the display row for one alert
    pub fn view(&self, alert: &Alert) -> AlertView {
        let details = &alert.details;
        AlertView {
            event_id: alert.event_id,
            pos: alert.pos,
            source: alert.source,
            platform: alert.platform,
            metric: details.metric.clone().unwrap_or_default(),
            status: details.status.clone().unwrap_or_default(),
            current: format_value(details.current_value),
            expected: format_value(details.expected_value),
            variance: format_variance(variance_percent(
                details.current_value,
                details.expected_value,
            )),
            severity: self.severity(alert),
            timestamp: details.timestamp,
        }
    }

    /// Filter, deduplicate and format alerts for the critical-alerts table
    pub fn critical_alerts(&self, alerts: &[Alert], filter: &AlertFilter) -> CriticalAlerts {
        let matching: Vec<Alert> = filter.apply(alerts).into_iter().cloned().collect();
        debug!("{} of {} alerts match filter", matching.len(), alerts.len());

        let unique = deduplicate(&matching);
        CriticalAlerts {
            matched: matching.len(),
            rows: unique.iter().map(|alert| self.view(alert)).collect(),
            by_event: self.summarize_by_event(&unique),
        }
    }

    /// Roll alerts up per event, most alerts first
    pub fn summarize_by_event(&self, alerts: &[Alert]) -> Vec<EventSummary> {
        let mut by_event: HashMap<Option<u64>, EventSummary> = HashMap::new();

        for alert in alerts {
            let entry = by_event.entry(alert.event_id).or_insert(EventSummary {
                event_id: alert.event_id,
                alert_count: 0,
                critical_count: 0,
                latest: None,
            });
            entry.alert_count += 1;
            if self.severity(alert) == AlertSeverity::Critical {
                entry.critical_count += 1;
            }
            entry.latest = entry.latest.max(alert.details.timestamp);
        }

        let mut summaries: Vec<_> = by_event.into_values().collect();
        summaries.sort_by(|a, b| {
            b.alert_count
                .cmp(&a.alert_count)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
        summaries
    }
}
