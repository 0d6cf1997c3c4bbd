//! Panel configuration

use crate::error::PanelError;
use chrono::NaiveDate;
use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Chart rendering type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    #[default]
    Line,
    Bar,
    Percentage,
    Funnel,
    UserFlow,
}

/// Panel `type` tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// Built directly in the panel builder
    #[default]
    Single,
    /// Result of merging two panels
    Combined,
}

/// Event plotted on a panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelEvent {
    pub id: u64,
    pub name: String,
    pub color: String,
}

impl PanelEvent {
    pub fn new(id: u64, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Filter selections of a panel
///
/// Every list holds unique values once normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelFilters {
    pub events: Vec<u64>,
    pub platforms: Vec<u64>,
    pub pos: Vec<u64>,
    pub sources: Vec<i64>,
    /// Free-text job ids
    pub source_str: Vec<String>,
}

fn sorted_union<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out: Vec<T> = a.iter().chain(b).cloned().collect();
    out.sort();
    out.dedup();
    out
}

impl PanelFilters {
    /// Sort each list and drop repeated values
    pub fn normalize(&mut self) {
        fn tidy<T: Ord>(list: &mut Vec<T>) {
            list.sort();
            list.dedup();
        }
        tidy(&mut self.events);
        tidy(&mut self.platforms);
        tidy(&mut self.pos);
        tidy(&mut self.sources);
        tidy(&mut self.source_str);
    }

    /// Union of both filter sets, each list sorted and unique
    pub fn union(&self, other: &PanelFilters) -> PanelFilters {
        PanelFilters {
            events: sorted_union(&self.events, &other.events),
            platforms: sorted_union(&self.platforms, &other.platforms),
            pos: sorted_union(&self.pos, &other.pos),
            sources: sorted_union(&self.sources, &other.sources),
            source_str: sorted_union(&self.source_str, &other.source_str),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, PanelError> {
        if from > to {
            return Err(PanelError::InvalidDateRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Single-day range
    pub fn day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// Smallest range covering both
    pub fn span(&self, other: &DateRange) -> DateRange {
        DateRange {
            from: self.from.min(other.from),
            to: self.to.max(other.to),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Check a range that did not come through `new`
    pub fn validate(&self) -> Result<(), PanelError> {
        Self::new(self.from, self.to).map(|_| ())
    }

    /// Number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// Visualization toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Visualization {
    pub show_legend: bool,
    pub stacked: bool,
    pub show_percentage: bool,
    pub show_data_labels: bool,
}

impl Default for Visualization {
    fn default() -> Self {
        Self {
            show_legend: true,
            stacked: false,
            show_percentage: false,
            show_data_labels: false,
        }
    }
}

/// One chart panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PanelKind,
    #[serde(default)]
    pub events: Vec<PanelEvent>,
    #[serde(default)]
    pub filters: PanelFilters,
    #[serde(default)]
    pub graph_type: GraphType,
    pub date_range: DateRange,
    #[serde(default)]
    pub visualization: Visualization,
}

impl PanelConfig {
    /// Create a single line-chart panel with a fresh id
    pub fn new(name: impl Into<String>, filters: PanelFilters, date_range: DateRange) -> Self {
        let mut panel = Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind: PanelKind::Single,
            events: Vec::new(),
            filters: PanelFilters::default(),
            graph_type: GraphType::default(),
            date_range,
            visualization: Visualization::default(),
        };
        panel.set_filters(filters);
        panel
    }

    pub fn event(&self, id: u64) -> Option<&PanelEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Add an event to the plotted list
    pub fn add_event(&mut self, event: PanelEvent) -> Result<(), PanelError> {
        if self.event(event.id).is_some() {
            return Err(PanelError::DuplicateEvent(event.id));
        }
        debug!("Panel {}: adding event {}", self.id, event.id);
        self.events.push(event);
        Ok(())
    }

    /// Remove an event, returning it if it was present
    pub fn remove_event(&mut self, id: u64) -> Option<PanelEvent> {
        let index = self.events.iter().position(|e| e.id == id)?;
        Some(self.events.remove(index))
    }

    pub fn set_date_range(&mut self, from: NaiveDate, to: NaiveDate) -> Result<(), PanelError> {
        self.date_range = DateRange::new(from, to)?;
        Ok(())
    }

    pub fn set_graph_type(&mut self, graph_type: GraphType) {
        self.graph_type = graph_type;
    }

    /// Replace the filter set, normalizing its lists
    pub fn set_filters(&mut self, mut filters: PanelFilters) {
        filters.normalize();
        self.filters = filters;
    }

    /// Check a panel built outside the edit methods (e.g. deserialized)
    pub fn validate(&self) -> Result<(), PanelError> {
        self.date_range.validate()?;
        let mut seen = HashSet::with_capacity(self.events.len());
        for event in &self.events {
            if !seen.insert(event.id) {
                return Err(PanelError::DuplicateEvent(event.id));
            }
        }
        Ok(())
    }
}
