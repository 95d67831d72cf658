use anyhow::Result;
use clap::{Parser, Subcommand};
use recollect::{cli, config, server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recollect", version, about = "Long-term semantic memory MCP server for AI agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Save a text to memory
    Save {
        text: String,
        /// Session id to tag the memory with
        #[arg(long)]
        session: Option<String>,
    },
    /// Search memory for texts similar to a query
    Query {
        text: String,
        /// Number of results (defaults to retrieval.default_k)
        #[arg(short, long)]
        k: Option<usize>,
        /// Print the JSON response instead of the text listing
        #[arg(long)]
        json: bool,
    },
    /// Show a stored record by id
    Inspect { id: String },
    /// Rebuild the vector index from the record store
    Reindex,
    /// Show record and index statistics
    Stats,
    /// Check database and snapshot health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load config (for log level)
    let config = config::RecollectConfig::load()?;

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Serve => server::serve_stdio(config).await?,
        Command::Save { text, session } => {
            cli::save::save(&config, &text, session.as_deref()).await?
        }
        Command::Query { text, k, json } => cli::query::query(&config, &text, k, json).await?,
        Command::Inspect { id } => cli::inspect::inspect(&config, &id)?,
        Command::Reindex => cli::reindex::reindex(&config).await?,
        Command::Stats => cli::stats::stats(&config).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
