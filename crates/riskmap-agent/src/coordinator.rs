//! Chooses between the agent and the keyword interpreter for each query.
//!
//! Agent-mode queries go to the remote agent under a hard timeout. Any
//! failure on that path (transport error, non-success status, bad body,
//! timeout) falls back once to the keyword interpreter, and the
//! interpretation says so. Each call takes a sequence number so that a
//! caller issuing overlapping queries can drop stale answers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use riskmap_core::viewport::MAX_FIT_ZOOM;
use riskmap_core::{MapView, Portfolio, PropertyRecord, fit_records};
use riskmap_rules::{ActiveFilter, interpret};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{AgentConfig, AgentError, AgentTransport};
use crate::dispatch::dispatch;
use crate::protocol::{AgentMessage, AgentRequest, normalize};

/// Prefix of the interpretation when the agent could not be used.
pub const FALLBACK_MARKER: &str = "⚠️ AI unavailable, using keyword search: ";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("search {sequence} superseded by search {latest}")]
    Superseded { sequence: u64, latest: u64 },
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub agent_id: String,
    pub thread_id: i64,
    /// Upper bound on one agent round trip.
    pub timeout: Duration,
    /// Minimum time a keyword-mode search takes.
    pub keyword_latency: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for CoordinatorConfig {
    fn from(agent: &AgentConfig) -> Self {
        Self {
            agent_id: agent.agent_id.clone(),
            thread_id: agent.thread_id,
            timeout: agent.timeout,
            keyword_latency: Duration::from_millis(300),
        }
    }
}

/// One query from the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchRequest<'q> {
    pub query: &'q str,
    pub use_agent: bool,
    pub selected_location_id: Option<&'q str>,
    pub current_filters: &'q [ActiveFilter],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Keyword,
    Agent,
    /// Agent requested but unavailable; keyword result returned.
    Fallback,
}

/// Everything the presentation layer needs after one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome<'a> {
    pub sequence: u64,
    pub mode: SearchMode,
    pub locations: Vec<&'a PropertyRecord>,
    pub selected: Option<&'a PropertyRecord>,
    pub filters: Vec<ActiveFilter>,
    pub interpretation: String,
    pub suggestions: Vec<String>,
    pub view: MapView,
}

pub struct Coordinator<T> {
    transport: T,
    config: CoordinatorConfig,
    sequence: AtomicU64,
}

impl<T: AgentTransport> Coordinator<T> {
    pub fn new(transport: T, config: CoordinatorConfig) -> Self {
        Self {
            transport,
            config,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Sequence number of the most recent search.
    pub fn latest(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Whether no search was started after `sequence`.
    pub fn is_current(&self, sequence: u64) -> bool {
        self.latest() == sequence
    }

    /// Run one search.
    ///
    /// Returns [`CoordinatorError::Superseded`] when another search started
    /// while this one was in flight.
    pub async fn coordinate<'a>(
        &self,
        portfolio: &'a Portfolio,
        request: SearchRequest<'_>,
    ) -> Result<SearchOutcome<'a>, CoordinatorError> {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(sequence, use_agent = request.use_agent, "search started");

        let outcome = if request.use_agent {
            self.agent_search(sequence, portfolio, &request).await
        } else {
            tokio::time::sleep(self.config.keyword_latency).await;
            keyword_search(sequence, portfolio.records(), request.query, SearchMode::Keyword)
        };

        let latest = self.latest();
        if latest != sequence {
            debug!(sequence, latest, "discarding stale search result");
            return Err(CoordinatorError::Superseded { sequence, latest });
        }
        Ok(outcome)
    }

    async fn agent_search<'a>(
        &self,
        sequence: u64,
        portfolio: &'a Portfolio,
        request: &SearchRequest<'_>,
    ) -> SearchOutcome<'a> {
        let records = portfolio.records();
        let payload = match self.call_agent(records, request).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "agent unavailable, falling back to keyword search");
                let mut outcome =
                    keyword_search(sequence, records, request.query, SearchMode::Fallback);
                outcome.interpretation = format!("{FALLBACK_MARKER}{}", outcome.interpretation);
                return outcome;
            }
        };

        let response = normalize(&payload);
        let result = dispatch(
            &response.actions,
            records,
            &response.response_text,
            response.follow_up_suggestions,
        );
        let view = match result.map_bounds {
            Some(bounds) => MapView::Bounds {
                bounds: bounds.padded(),
                max_zoom: MAX_FIT_ZOOM,
            },
            None => fit_records(result.filtered_locations.iter().copied()),
        };
        info!(
            sequence,
            actions = response.actions.len(),
            count = result.filtered_locations.len(),
            "agent search complete"
        );

        SearchOutcome {
            sequence,
            mode: SearchMode::Agent,
            locations: result.filtered_locations,
            selected: result.selected_location,
            filters: Vec::new(),
            interpretation: result.interpretation,
            suggestions: result.suggestions,
            view,
        }
    }

    async fn call_agent(
        &self,
        records: &[PropertyRecord],
        request: &SearchRequest<'_>,
    ) -> Result<Value, AgentError> {
        let message = AgentMessage::new(
            request.query,
            records,
            request.selected_location_id,
            request.current_filters,
        );
        let body = AgentRequest {
            agent_id: self.config.agent_id.clone(),
            message: serde_json::to_string(&message)?,
            thread_id: self.config.thread_id,
        };
        tokio::time::timeout(self.config.timeout, self.transport.send(&body))
            .await
            .map_err(|_| AgentError::Timeout(self.config.timeout))?
    }
}

fn keyword_search<'a>(
    sequence: u64,
    records: &'a [PropertyRecord],
    query: &str,
    mode: SearchMode,
) -> SearchOutcome<'a> {
    let result = interpret(query, records);
    let view = fit_records(result.locations.iter().copied());
    info!(sequence, count = result.locations.len(), "keyword search complete");
    SearchOutcome {
        sequence,
        mode,
        locations: result.locations,
        selected: None,
        filters: result.filters,
        interpretation: result.interpretation,
        suggestions: Vec::new(),
        view,
    }
}
