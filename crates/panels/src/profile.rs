//! Dashboard profiles

use crate::error::PanelError;
use crate::merge::merge_in_collection;
use crate::panel::{DateRange, PanelConfig, PanelFilters};
use chrono::{Days, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Default look-back window for new profiles
const DEFAULT_RANGE_DAYS: u64 = 7;

/// Named collection of panels plus shared filter defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub panels: Vec<PanelConfig>,
    #[serde(default)]
    pub default_filters: PanelFilters,
    pub default_date_range: DateRange,
}

impl Profile {
    /// Create an empty profile covering the last week
    pub fn new(name: impl Into<String>) -> Self {
        let today = Utc::now().date_naive();
        let from = today
            .checked_sub_days(Days::new(DEFAULT_RANGE_DAYS - 1))
            .unwrap_or(today);
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            panels: Vec::new(),
            default_filters: PanelFilters::default(),
            default_date_range: DateRange { from, to: today },
        }
    }

    pub fn panel(&self, id: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.id == id)
    }

    /// Add a panel seeded from the profile defaults
    pub fn add_panel(&mut self, name: impl Into<String>) -> &PanelConfig {
        let panel = PanelConfig::new(name, self.default_filters.clone(), self.default_date_range);
        info!("Profile {}: adding panel {}", self.id, panel.id);
        let index = self.panels.len();
        self.panels.push(panel);
        &self.panels[index]
    }

    /// Replace a panel with an edited copy carrying the same id
    pub fn replace_panel(&mut self, panel: PanelConfig) -> Result<(), PanelError> {
        let slot = self
            .panels
            .iter_mut()
            .find(|p| p.id == panel.id)
            .ok_or_else(|| PanelError::NotFound(panel.id.clone()))?;
        *slot = panel;
        Ok(())
    }

    pub fn remove_panel(&mut self, id: &str) -> Result<PanelConfig, PanelError> {
        let index = self
            .panels
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PanelError::NotFound(id.to_string()))?;
        Ok(self.panels.remove(index))
    }

    /// Check a profile received whole (e.g. from a client) and normalize its filters
    pub fn validate(&mut self) -> Result<(), PanelError> {
        self.default_date_range.validate()?;
        self.default_filters.normalize();

        let mut ids = HashSet::with_capacity(self.panels.len());
        for panel in &mut self.panels {
            if !ids.insert(panel.id.clone()) {
                return Err(PanelError::DuplicatePanel(panel.id.clone()));
            }
            panel.validate()?;
            panel.filters.normalize();
        }
        Ok(())
    }

    /// Profile with `source_id` merged into `target_id`
    pub fn merge_panels(&self, source_id: &str, target_id: &str) -> Result<Profile, PanelError> {
        let panels = merge_in_collection(&self.panels, source_id, target_id).map_err(|e| {
            warn!("Profile {}: merge rejected: {}", self.id, e);
            e
        })?;
        Ok(Profile {
            panels,
            ..self.clone()
        })
    }
}
