//! riskmap CLI: explore a property portfolio by keyword or through the agent.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use riskmap_agent::{
    AgentClient, AgentConfig, Coordinator, CoordinatorConfig, OfflineTransport, SearchRequest,
};
use riskmap_core::Portfolio;
use riskmap_rules::interpret;

mod display;

#[derive(Parser)]
#[command(name = "riskmap", version, about = "Property portfolio risk explorer")]
struct Cli {
    /// Portfolio JSON file: a full export document or a bare locations array.
    #[arg(
        long,
        global = true,
        env = "RISKMAP_PORTFOLIO",
        default_value = "portfolio.json"
    )]
    portfolio: PathBuf,

    /// Print results as JSON instead of cards.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show portfolio totals.
    Summary,

    /// Keyword search, e.g. `riskmap search florida hurricane risk`.
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Ask the agent. Falls back to keyword search when it is unavailable.
    Ask {
        #[arg(required = true)]
        query: Vec<String>,

        /// Location currently selected on the map.
        #[arg(long)]
        selected: Option<String>,

        /// Keyword query whose filters are sent as the active filter context.
        #[arg(long)]
        within: Option<String>,

        #[command(flatten)]
        agent: AgentArgs,
    },
}

#[derive(Args)]
struct AgentArgs {
    /// Agent chat endpoint.
    #[arg(
        long,
        env = "RISKMAP_AGENT_URL",
        default_value = "http://localhost:8000/api/agent/chat"
    )]
    agent_url: String,

    #[arg(long, env = "RISKMAP_AGENT_ID", default_value = "portfolio-assistant")]
    agent_id: String,

    /// Conversation thread on the agent side.
    #[arg(long, env = "RISKMAP_THREAD_ID", default_value_t = 1)]
    thread_id: i64,

    /// Seconds to wait for the agent before falling back.
    #[arg(long, env = "RISKMAP_AGENT_TIMEOUT", default_value_t = 30)]
    timeout_secs: u64,
}

impl From<AgentArgs> for AgentConfig {
    fn from(args: AgentArgs) -> Self {
        Self {
            url: args.agent_url,
            agent_id: args.agent_id,
            thread_id: args.thread_id,
            timeout: Duration::from_secs(args.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    tracing::info!("riskmap v{}", env!("CARGO_PKG_VERSION"));

    let portfolio = Portfolio::load(&cli.portfolio)
        .with_context(|| format!("failed to load portfolio {}", cli.portfolio.display()))?;

    match cli.command {
        Commands::Summary => display::print_summary(&portfolio, cli.json)?,

        Commands::Search { query } => {
            let coordinator = Coordinator::new(OfflineTransport, CoordinatorConfig::default());
            let query = query.join(" ");
            let request = SearchRequest {
                query: &query,
                ..Default::default()
            };
            let outcome = coordinator.coordinate(&portfolio, request).await?;
            display::print_outcome(&outcome, cli.json)?;
        }

        Commands::Ask {
            query,
            selected,
            within,
            agent,
        } => {
            if let Some(id) = selected.as_deref() {
                if portfolio.get(id).is_none() {
                    tracing::warn!(location_id = id, "selected location is not in the portfolio");
                }
            }
            let current_filters = within
                .as_deref()
                .map(|q| interpret(q, portfolio.records()).filters)
                .unwrap_or_default();

            let config = AgentConfig::from(agent);
            let coordinator = Coordinator::new(AgentClient::new(&config.url), CoordinatorConfig::from(&config));
            let query = query.join(" ");
            let request = SearchRequest {
                query: &query,
                use_agent: true,
                selected_location_id: selected.as_deref(),
                current_filters: &current_filters,
            };
            let outcome = coordinator.coordinate(&portfolio, request).await?;
            display::print_outcome(&outcome, cli.json)?;
        }
    }

    Ok(())
}
