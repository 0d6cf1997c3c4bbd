//! Repository Implementation

use crate::StorageError;
use alerting::{Alert, AlertFilter};
use panels::Profile;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Default cap on retained alert records
pub const DEFAULT_MAX_ALERT_RECORDS: usize = 50_000;

/// Listing entry for a stored profile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: String,
    pub name: String,
    pub panel_count: usize,
}

/// Repository for dashboard configuration and alert records
pub struct Repository {
    /// Profile documents by id, kept in their serialized form
    profiles: Mutex<HashMap<String, Value>>,
    /// Alert records, oldest first
    alerts: Mutex<VecDeque<Alert>>,
    /// Max alert records
    max_alert_records: usize,
}

fn decode(document: &Value) -> Result<Profile, StorageError> {
    Ok(Profile::deserialize(document)?)
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_MAX_ALERT_RECORDS)
    }

    /// Create a repository keeping at most `max_alert_records` alerts
    pub fn with_retention(max_alert_records: usize) -> Self {
        info!(
            "Creating in-memory repository (alert retention: {})",
            max_alert_records
        );
        Self {
            profiles: Mutex::new(HashMap::new()),
            alerts: Mutex::new(VecDeque::new()),
            max_alert_records: max_alert_records.max(1),
        }
    }

    /// Save a profile document, replacing any previous version
    pub fn save_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let document = serde_json::to_value(profile)?;
        lock(&self.profiles)?.insert(profile.id.clone(), document);
        debug!("Saved profile {}", profile.id);
        Ok(())
    }

    /// Load a profile document
    pub fn get_profile(&self, id: &str) -> Result<Profile, StorageError> {
        let profiles = lock(&self.profiles)?;
        let document = profiles
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        decode(document)
    }

    /// List stored profiles ordered by name
    pub fn list_profiles(&self) -> Result<Vec<ProfileSummary>, StorageError> {
        let profiles = lock(&self.profiles)?;
        let mut summaries = profiles
            .values()
            .map(|doc| {
                let profile = decode(doc)?;
                Ok(ProfileSummary {
                    id: profile.id,
                    name: profile.name,
                    panel_count: profile.panels.len(),
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(summaries)
    }

    pub fn delete_profile(&self, id: &str) -> Result<(), StorageError> {
        if lock(&self.profiles)?.remove(id).is_none() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        info!("Deleted profile {}", id);
        Ok(())
    }

    /// Append alert records, dropping the oldest past the retention cap
    pub fn insert_alerts(&self, records: Vec<Alert>) -> Result<usize, StorageError> {
        let mut alerts = lock(&self.alerts)?;
        let inserted = records.len();

        alerts.extend(records);
        while alerts.len() > self.max_alert_records {
            alerts.pop_front();
        }

        debug!("Inserted {} alerts ({} retained)", inserted, alerts.len());
        Ok(inserted)
    }

    /// Most recent alerts, oldest first
    pub fn get_alerts(&self, limit: usize) -> Result<Vec<Alert>, StorageError> {
        let alerts = lock(&self.alerts)?;
        let skip = alerts.len().saturating_sub(limit);
        Ok(alerts.iter().skip(skip).cloned().collect())
    }

    /// Most recent `limit` alerts passing `filter`, oldest first
    ///
    /// The filter runs over the whole retained log before the limit applies.
    pub fn query_alerts(
        &self,
        filter: &AlertFilter,
        limit: usize,
    ) -> Result<Vec<Alert>, StorageError> {
        let alerts = lock(&self.alerts)?;
        let mut matched: Vec<Alert> = alerts
            .iter()
            .rev()
            .filter(|a| filter.matches(a))
            .take(limit)
            .cloned()
            .collect();
        matched.reverse();
        debug!("Alert query matched {} of {} records", matched.len(), alerts.len());
        Ok(matched)
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.clear();
        }
        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.clear();
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_save_and_load() {
        let repo = Repository::new();
        let mut profile = Profile::new("Checkout");
        profile.add_panel("Errors");

        repo.save_profile(&profile).unwrap();
        let loaded = repo.get_profile(&profile.id).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_missing_profile() {
        let repo = Repository::new();
        assert!(matches!(
            repo.get_profile("nope"),
            Err(StorageError::NotFound(_))
        ));
        assert!(repo.delete_profile("nope").is_err());
    }

    #[test]
    fn test_list_profiles_sorted() {
        let repo = Repository::new();
        repo.save_profile(&Profile::new("Zeta")).unwrap();
        repo.save_profile(&Profile::new("Alpha")).unwrap();

        let names: Vec<_> = repo
            .list_profiles()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_delete_profile() {
        let repo = Repository::new();
        let profile = Profile::new("p");
        repo.save_profile(&profile).unwrap();
        repo.delete_profile(&profile.id).unwrap();
        assert_eq!(repo.profile_count(), 0);
    }

    #[test]
    fn test_alert_retention_limit() {
        let repo = Repository::with_retention(5);
        let alerts: Vec<_> = (0..10).map(|i| Alert::new(i, 1)).collect();

        assert_eq!(repo.insert_alerts(alerts).unwrap(), 10);
        assert_eq!(repo.alert_count(), 5);

        let recent = repo.get_alerts(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event_id, Some(8));
        assert_eq!(recent[1].event_id, Some(9));
    }

    #[test]
    fn test_query_alerts_filters_before_limit() {
        let repo = Repository::new();
        let mut alerts = vec![Alert::new(1, 1), Alert::new(1, 2)];
        alerts.extend((0..20).map(|i| Alert::new(100 + i, 1)));
        repo.insert_alerts(alerts).unwrap();

        let filter = AlertFilter {
            events: vec![1],
            ..Default::default()
        };
        let found = repo.query_alerts(&filter, 5).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].pos, Some(1));
        assert_eq!(found[1].pos, Some(2));

        let newest = repo.query_alerts(&filter, 1).unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].pos, Some(2));

        assert_eq!(repo.query_alerts(&AlertFilter::default(), 3).unwrap().len(), 3);
    }
}
