//! Session Graph - Main Server
//!
//! Serves the session API, or runs a single refresh from the command line.

use anyhow::Result;
use clap::{Parser, Subcommand};
use session_graph::{AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "session-graph")]
#[command(about = "Session-scoped social and on-chain relationship graph")]
struct Cli {
    /// Path to the YAML config file (default: ./config.yaml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP + WebSocket server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Refresh an actor from the social API and add it to a session
    RefreshActor {
        /// Actor handle (screen name)
        handle: String,

        /// Session to add the actor to
        #[arg(short, long)]
        session: String,
    },

    /// Refresh an address from the holdings provider and add it to a session
    RefreshAddress {
        address: String,

        #[arg(short, long)]
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,session_graph=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            session_graph::start_server(config).await
        }
        Commands::RefreshActor { handle, session } => {
            let state = AppState::new(config).await?;
            let outcome = state.manager.refresh_actor(&handle, &session).await?;
            tracing::info!(
                "Actor {} ({}) in session {}: refreshed={}, {} common connections",
                handle,
                outcome.actor_id,
                session,
                outcome.refreshed,
                outcome.common_connections
            );
            Ok(())
        }
        Commands::RefreshAddress { address, session } => {
            let state = AppState::new(config).await?;
            let outcome = state.manager.refresh_address(&address, &session).await?;
            tracing::info!(
                "Address {} in session {}: {} entities ingested",
                outcome.address,
                session,
                outcome.entities
            );
            Ok(())
        }
    }
}
