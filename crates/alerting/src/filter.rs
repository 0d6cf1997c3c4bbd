//! Alert query filter

use crate::alert::Alert;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filter applied to alert lists
///
/// Empty id lists match every alert. Time bounds are inclusive; an alert
/// without a timestamp never passes a bounded filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertFilter {
    pub events: Vec<u64>,
    pub pos: Vec<u64>,
    pub platforms: Vec<u64>,
    pub sources: Vec<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn allows<T: PartialEq>(allowed: &[T], value: Option<&T>) -> bool {
    allowed.is_empty() || value.is_some_and(|v| allowed.contains(v))
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        if !allows(&self.events, alert.event_id.as_ref())
            || !allows(&self.pos, alert.pos.as_ref())
            || !allows(&self.platforms, alert.platform.as_ref())
            || !allows(&self.sources, alert.source.as_ref())
        {
            return false;
        }

        if self.from.is_none() && self.to.is_none() {
            return true;
        }

        let Some(ts) = alert.details.timestamp else {
            return false;
        };
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }

    /// Alerts passing the filter, in input order
    pub fn apply<'a>(&self, alerts: &'a [Alert]) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| self.matches(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = AlertFilter::default();
        assert!(filter.matches(&Alert::new(1, 1)));
    }

    #[test]
    fn test_id_lists() {
        let filter = AlertFilter {
            events: vec![1, 2],
            sources: vec![3],
            ..Default::default()
        };
        assert!(filter.matches(&Alert::new(1, 9).with_source(3)));
        assert!(!filter.matches(&Alert::new(5, 9).with_source(3)));
        assert!(!filter.matches(&Alert::new(1, 9)));
    }

    #[test]
    fn test_time_bounds_inclusive() {
        let filter = AlertFilter {
            from: Some(at(8)),
            to: Some(at(10)),
            ..Default::default()
        };
        assert!(filter.matches(&Alert::new(1, 1).with_timestamp(at(8))));
        assert!(filter.matches(&Alert::new(1, 1).with_timestamp(at(10))));
        assert!(!filter.matches(&Alert::new(1, 1).with_timestamp(at(11))));
        assert!(!filter.matches(&Alert::new(1, 1)));
    }

    #[test]
    fn test_apply_keeps_order() {
        let alerts = vec![Alert::new(2, 1), Alert::new(1, 1), Alert::new(2, 5)];
        let filter = AlertFilter {
            events: vec![2],
            ..Default::default()
        };
        let kept = filter.apply(&alerts);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].pos, Some(5));
    }
}
