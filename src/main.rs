use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use wikigraph::api::HttpWikiApi;
use wikigraph::config::{load_config, ExplorerConfig};
use wikigraph::error::{Result, WikiGraphError};
use wikigraph::graph::{crawl, GraphStore};
use wikigraph::observability::init_logging;
use wikigraph::server::run_server;

#[derive(Parser)]
#[command(name = "wikigraph", version, about = "Explore Wikipedia as an incrementally expanded graph")]
struct Cli {
    /// Explicit config file (highest-priority YAML layer).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the explorer and serve the JSON API
    Serve {
        /// Bind address, overriding `server.addr`
        #[arg(long)]
        addr: Option<String>,

        /// Start with the "Graph theory" demonstration graph
        #[arg(long)]
        demo: bool,
    },

    /// Fetch and print the outbound links of an article
    Links { title: String },

    /// Search article titles
    Search {
        query: String,

        /// Maximum results, overriding `search.limit`
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Expand an article (and its children down to --depth) and print the graph
    Expand {
        title: String,

        #[arg(long, default_value_t = 1)]
        depth: usize,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mut config = load_config(cli.config.as_deref(), Some(&cwd))?;

    match cli.command {
        Command::Serve { addr, demo } => {
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            let addr = config.server.socket_addr()?;
            run_server(&config, addr, demo).await
        }
        Command::Links { title } => {
            let api = HttpWikiApi::from_config(&config.api)?;
            print_json(&api.links(&title).await?)
        }
        Command::Search { query, limit } => {
            let api = HttpWikiApi::from_config(&config.api)?;
            let limit = limit.unwrap_or(config.search.limit);
            print_json(&api.search(&query, limit).await?)
        }
        Command::Expand { title, depth } => expand(&config, &title, depth).await,
        Command::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

async fn expand(config: &ExplorerConfig, title: &str, depth: usize) -> Result<()> {
    if depth == 0 {
        return Err(WikiGraphError::Other("--depth must be at least 1".into()));
    }
    let api = HttpWikiApi::from_config(&config.api)?;
    let mut store = GraphStore::new(config.graph.limits());
    let report = crawl(&mut store, &api, title, depth).await?;
    tracing::info!(
        expanded = report.expanded,
        fetched = report.fetched,
        resets = report.resets,
        "expansion finished"
    );
    print_json(&store.snapshot())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
