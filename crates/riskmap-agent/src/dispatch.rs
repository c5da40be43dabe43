//! Applies agent actions to the view state.

use std::collections::HashSet;

use riskmap_core::{PropertyRecord, ViewportBounds};
use serde::Serialize;
use tracing::debug;

use crate::protocol::AgentAction;

/// Prefix marking an interpretation written by the agent.
pub const AGENT_MARKER: &str = "🤖 ";

/// View state after every action has been applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResult<'a> {
    pub filtered_locations: Vec<&'a PropertyRecord>,
    pub selected_location: Option<&'a PropertyRecord>,
    pub interpretation: String,
    /// Bounds exactly as the agent sent them.
    pub map_bounds: Option<ViewportBounds>,
    pub suggestions: Vec<String>,
}

/// Fold `actions` left to right over the full record set.
///
/// Later actions overwrite earlier ones. Ids that match no record are
/// ignored.
pub fn dispatch<'a>(
    actions: &[AgentAction],
    records: &'a [PropertyRecord],
    response_text: &str,
    suggestions: Vec<String>,
) -> AgentResult<'a> {
    let mut filtered: Vec<&PropertyRecord> = records.iter().collect();
    let mut selected = None;
    let mut bounds = None;

    for action in actions {
        match action {
            AgentAction::FilterLocations { location_ids } => {
                if let Some(subset) = by_ids(records, location_ids) {
                    filtered = subset;
                }
            }
            AgentAction::HighlightLocations { location_ids } => {
                debug!(count = location_ids.len(), "highlight applied as filter");
                if let Some(subset) = by_ids(records, location_ids) {
                    filtered = subset;
                }
            }
            AgentAction::SelectLocation { location_id } => {
                selected = location_id
                    .as_deref()
                    .and_then(|id| records.iter().find(|r| r.location_id == id));
            }
            AgentAction::ZoomMap { bounds: b } => bounds = Some(*b),
            AgentAction::ClearFilters => filtered = records.iter().collect(),
            AgentAction::Unknown => debug!("ignoring unknown agent action"),
        }
    }

    AgentResult {
        filtered_locations: filtered,
        selected_location: selected,
        interpretation: format!("{AGENT_MARKER}{response_text}"),
        map_bounds: bounds,
        suggestions,
    }
}

/// Records whose id is listed, in record order. `None` for an empty list.
fn by_ids<'a>(records: &'a [PropertyRecord], ids: &[String]) -> Option<Vec<&'a PropertyRecord>> {
    if ids.is_empty() {
        return None;
    }
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    Some(
        records
            .iter()
            .filter(|r| wanted.contains(r.location_id.as_str()))
            .collect(),
    )
}
