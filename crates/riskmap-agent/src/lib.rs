pub mod client;
pub mod coordinator;
pub mod dispatch;
pub mod protocol;

pub use client::{AgentClient, AgentConfig, AgentError, AgentTransport, OfflineTransport};
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorError, FALLBACK_MARKER, SearchMode, SearchOutcome,
    SearchRequest,
};
pub use dispatch::{AGENT_MARKER, AgentResult, dispatch};
pub use protocol::{AgentAction, AgentRequest, AgentResponse, normalize};
