//! Alert Records
//!
//! Typed alert model plus the loosely typed boundary record it is decoded
//! from. Upstream payloads mix numbers, numeric strings and nulls freely, so
//! every field passes through an explicit coercion rule before it reaches
//! [`Alert`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Source id meaning "no source applies to this alert"
pub const SOURCE_NOT_APPLICABLE: i64 = -1;

/// One anomaly detection event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawAlert")]
pub struct Alert {
    pub event_id: Option<u64>,
    pub pos: Option<u64>,
    pub source: Option<i64>,
    pub platform: Option<u64>,
    pub details: AlertDetails,
}

/// Measurement payload attached to an alert
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDetails")]
pub struct AlertDetails {
    /// Free-form metric name, compared case-insensitively
    pub metric: Option<String>,
    /// Status code, kept as text
    pub status: Option<String>,
    pub current_value: Option<f64>,
    pub expected_value: Option<f64>,
    /// Allowed deviation in percent
    pub threshold: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Alert {
    /// Create an alert with empty details
    pub fn new(event_id: u64, pos: u64) -> Self {
        Self {
            event_id: Some(event_id),
            pos: Some(pos),
            source: None,
            platform: None,
            details: AlertDetails::default(),
        }
    }

    pub fn with_source(mut self, source: i64) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_platform(mut self, platform: u64) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.details.metric = Some(metric.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.details.status = Some(status.into());
        self
    }

    pub fn with_values(mut self, current: f64, expected: f64) -> Self {
        self.details.current_value = finite(current);
        self.details.expected_value = finite(expected);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.details.threshold = finite(threshold);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.details.timestamp = Some(timestamp);
        self
    }

    /// Whether the alert is tied to a concrete source
    pub fn source_applicable(&self) -> bool {
        matches!(self.source, Some(s) if s != SOURCE_NOT_APPLICABLE)
    }
}

/// Wire shape of an alert before coercion
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAlert {
    #[serde(alias = "event_id", alias = "event")]
    event_id: Value,
    pos: Value,
    source: Value,
    platform: Value,
    details: Value,
}

/// Wire shape of alert details before coercion
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDetails {
    metric: Value,
    status: Value,
    #[serde(alias = "current_value", alias = "current")]
    current_value: Value,
    #[serde(alias = "expected_value", alias = "expected")]
    expected_value: Value,
    threshold: Value,
    timestamp: Value,
}

impl From<RawAlert> for Alert {
    fn from(raw: RawAlert) -> Self {
        // Anything that is not an object (null, string, array) counts as
        // missing details.
        let details = match raw.details {
            Value::Object(_) => serde_json::from_value::<RawDetails>(raw.details)
                .map(AlertDetails::from)
                .unwrap_or_default(),
            _ => AlertDetails::default(),
        };

        Self {
            event_id: coerce_id(&raw.event_id),
            pos: coerce_id(&raw.pos),
            source: coerce_signed(&raw.source),
            platform: coerce_id(&raw.platform),
            details,
        }
    }
}

impl From<RawDetails> for AlertDetails {
    fn from(raw: RawDetails) -> Self {
        Self {
            metric: coerce_string(&raw.metric),
            status: coerce_string(&raw.status),
            current_value: coerce_number(&raw.current_value),
            expected_value: coerce_number(&raw.expected_value),
            threshold: coerce_number(&raw.threshold),
            timestamp: coerce_timestamp(&raw.timestamp),
        }
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Finite number from a JSON number or numeric string
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().and_then(finite),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(finite),
        _ => None,
    }
}

/// Text form of a scalar; null and containers are absent
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn coerce_signed(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc))
            .or_else(|| s.trim().parse::<i64>().ok().and_then(DateTime::<Utc>::from_timestamp_millis)),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}
