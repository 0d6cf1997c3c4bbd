//! Dashboard Panels
//!
//! Panel and profile configuration, builder edits, and panel merging.

mod error;
mod merge;
mod panel;
mod profile;

pub use error::PanelError;
pub use merge::{merge_in_collection, merge_panels};
pub use panel::{DateRange, GraphType, PanelConfig, PanelEvent, PanelFilters, PanelKind, Visualization};
pub use profile::Profile;
