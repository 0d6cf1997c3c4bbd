//! Panel merging
//!
//! Folds a source panel into a target panel. The merged panel keeps the
//! target's identity and graph type, unions events and filters, and widens
//! the date range to cover both inputs.

use crate::error::PanelError;
use crate::panel::{PanelConfig, PanelKind};
use tracing::info;

/// Merge `source` into `target`
pub fn merge_panels(source: &PanelConfig, target: &PanelConfig) -> PanelConfig {
    let mut events = target.events.clone();
    for event in &source.events {
        if !events.iter().any(|e| e.id == event.id) {
            events.push(event.clone());
        }
    }

    PanelConfig {
        id: target.id.clone(),
        name: format!("{} + {}", target.name, source.name),
        kind: PanelKind::Combined,
        events,
        filters: target.filters.union(&source.filters),
        graph_type: target.graph_type,
        date_range: target.date_range.span(&source.date_range),
        visualization: target.visualization.clone(),
    }
}

/// Merge two panels of a collection by id
///
/// Returns a new collection with the source removed and the target replaced
/// in place. The input is never modified.
pub fn merge_in_collection(
    panels: &[PanelConfig],
    source_id: &str,
    target_id: &str,
) -> Result<Vec<PanelConfig>, PanelError> {
    if source_id == target_id {
        return Err(PanelError::SelfMerge(source_id.to_string()));
    }

    let source = panels
        .iter()
        .find(|p| p.id == source_id)
        .ok_or_else(|| PanelError::NotFound(source_id.to_string()))?;
    let target = panels
        .iter()
        .find(|p| p.id == target_id)
        .ok_or_else(|| PanelError::NotFound(target_id.to_string()))?;

    let merged = merge_panels(source, target);
    info!("Merged panel {} into {}", source_id, target_id);

    Ok(panels
        .iter()
        .filter(|p| p.id != source_id)
        .map(|p| if p.id == target_id { merged.clone() } else { p.clone() })
        .collect())
}
