//! Wire types for the remote agent and normalization of its replies.
//!
//! The agent has answered in three shapes over time: a JSON document encoded
//! as a string under `response`, a `metadata` object, or the bare object.
//! [`normalize`] folds all of them into one [`AgentResponse`] and never fails.

use std::borrow::Cow;

use riskmap_core::{PropertyRecord, ViewportBounds};
use riskmap_rules::ActiveFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// One instruction from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    FilterLocations {
        #[serde(default)]
        location_ids: Vec<String>,
    },
    SelectLocation {
        #[serde(default)]
        location_id: Option<String>,
    },
    ZoomMap {
        bounds: ViewportBounds,
    },
    ClearFilters,
    HighlightLocations {
        #[serde(default)]
        location_ids: Vec<String>,
    },
    /// Unrecognised `type`, or an entry that did not parse.
    #[serde(other)]
    Unknown,
}

/// Agent reply after normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub response_text: String,
    pub actions: Vec<AgentAction>,
    pub follow_up_suggestions: Vec<String>,
}

/// Request body posted to the agent endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRequest {
    pub agent_id: String,
    /// JSON-encoded [`AgentMessage`].
    pub message: String,
    pub thread_id: i64,
}

/// Query context sent inside [`AgentRequest::message`].
#[derive(Debug, Serialize)]
pub struct AgentMessage<'a> {
    pub query: &'a str,
    pub portfolio: Vec<LocationDigest<'a>>,
    pub selected_location_id: Option<&'a str>,
    pub current_filters: &'a [ActiveFilter],
}

/// The slice of a record the agent needs to reason about it.
#[derive(Debug, Serialize)]
pub struct LocationDigest<'a> {
    pub location_id: &'a str,
    pub account_name: &'a str,
    pub address: &'a str,
    pub city: &'a str,
    pub state: &'a str,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub total_tiv: f64,
    pub construction_type: &'a str,
    pub year_built: Option<i32>,
    pub sprinkler_status: &'a str,
    pub hurricane: Option<u8>,
    pub earthquake: Option<u8>,
    pub flood_score: Option<u8>,
    pub wildfire: Option<u8>,
    pub total_claims: u32,
    pub data_quality_issues: &'a [String],
}

impl<'a> From<&'a PropertyRecord> for LocationDigest<'a> {
    fn from(rec: &'a PropertyRecord) -> Self {
        let (lat, lon) = rec.coordinates().unzip();
        Self {
            location_id: &rec.location_id,
            account_name: &rec.account_name,
            address: &rec.address,
            city: &rec.city,
            state: &rec.state,
            lat,
            lon,
            total_tiv: rec.total_tiv,
            construction_type: &rec.construction_type,
            year_built: rec.year_built,
            sprinkler_status: &rec.sprinkler_status,
            hurricane: rec.hurricane,
            earthquake: rec.earthquake,
            flood_score: rec.flood_score,
            wildfire: rec.wildfire,
            total_claims: rec.total_claims,
            data_quality_issues: &rec.data_quality_issues,
        }
    }
}

impl<'a> AgentMessage<'a> {
    pub fn new(
        query: &'a str,
        records: &'a [PropertyRecord],
        selected_location_id: Option<&'a str>,
        current_filters: &'a [ActiveFilter],
    ) -> Self {
        Self {
            query,
            portfolio: records.iter().map(LocationDigest::from).collect(),
            selected_location_id,
            current_filters,
        }
    }
}

/// Normalize any agent payload shape into an [`AgentResponse`].
pub fn normalize(payload: &Value) -> AgentResponse {
    let body: Cow<'_, Value> = match payload.get("response") {
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(decoded) => Cow::Owned(decoded),
            Err(e) => {
                warn!(error = %e, "agent response is not valid JSON, ignoring it");
                Cow::Owned(Value::Object(Default::default()))
            }
        },
        Some(inner @ Value::Object(_)) => Cow::Borrowed(inner),
        _ => match payload.get("metadata") {
            Some(meta @ Value::Object(_)) => Cow::Borrowed(meta),
            _ => Cow::Borrowed(payload),
        },
    };

    let response_text = body
        .get("response_text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let actions = body
        .get("actions")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(parse_action).collect())
        .unwrap_or_default();

    let follow_up_suggestions = body
        .get("follow_up_suggestions")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    AgentResponse {
        response_text,
        actions,
        follow_up_suggestions,
    }
}

fn parse_action(entry: &Value) -> AgentAction {
    if !entry.is_object() {
        debug!(entry = %entry, "agent action is not an object");
        return AgentAction::Unknown;
    }
    AgentAction::deserialize(entry).unwrap_or_else(|e| {
        debug!(error = %e, "unparseable agent action");
        AgentAction::Unknown
    })
}
