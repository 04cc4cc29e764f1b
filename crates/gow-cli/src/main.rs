use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gow_agents::{GowResponse, TurnRequest, UserContext};
use gow_config::{AppConfig, ConfigLoader};
use gow_db::SeedData;
use gow_gateway::{AppState, GatewayServer, build_agent, open_store, open_store_or_degrade};
use gow_security::RedactingWriter;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gow")]
#[command(about = "Conversational assistant for a services marketplace", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config.yml (default: ~/.gow/config.yml)
    #[arg(long, global = true, env = "GOW_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single message and print the response as JSON
    Chat {
        message: String,

        /// Marketplace user id; enables profile lookup and interaction logging
        #[arg(long)]
        user_id: Option<String>,

        /// Caller context as JSON, e.g. '{"userType":"freelancer"}'
        #[arg(long)]
        context_json: Option<String>,
    },

    /// Serve the HTTP API
    Serve,

    /// Delete logged interactions older than the retention window
    Purge {
        /// Retention window in days (default: database.retention_days)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Load profiles and projects from a JSON seed file
    Seed { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(RedactingWriter::stderr())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Chat {
            message,
            user_id,
            context_json,
        } => {
            let context = parse_context(context_json.as_deref())?;
            let response = run_chat(&config, message, user_id, context).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Serve => {
            let agent = build_agent(&config, open_store_or_degrade(&config.database))?;
            let state = Arc::new(AppState::new(agent));
            GatewayServer::new(config.gateway.clone(), state).run().await?;
        }
        Commands::Purge { days } => {
            let days = days.unwrap_or(config.database.retention_days);
            let store = open_store(&config.database).context("failed to open context store")?;
            let removed = store.purge_interactions_older_than(days)?;
            println!("removed {removed} interactions older than {days} days");
        }
        Commands::Seed { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read seed file {}", file.display()))?;
            let seed: SeedData = serde_json::from_str(&raw)
                .with_context(|| format!("invalid seed file {}", file.display()))?;
            let store = open_store(&config.database).context("failed to open context store")?;
            store.apply_seed(&seed)?;
            info!("seeded {}", config.database.path.display());
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    loader
        .load()
        .with_context(|| format!("failed to load config from {}", loader.path().display()))
}

async fn run_chat(
    config: &AppConfig,
    message: String,
    user_id: Option<String>,
    context: UserContext,
) -> Result<GowResponse> {
    let agent = build_agent(config, open_store_or_degrade(&config.database))?;

    let mut request = TurnRequest::new(message).with_context(context);
    if let Some(user_id) = user_id {
        request = request.with_user(user_id);
    }
    Ok(agent.respond(&request).await)
}

fn parse_context(raw: Option<&str>) -> Result<UserContext> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("invalid --context-json"),
        None => Ok(UserContext::default()),
    }
}
