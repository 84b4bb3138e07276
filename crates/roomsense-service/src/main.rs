//! RoomSense Service - Background collector and HTTP API.
//!
//! Run with: `cargo run -p roomsense-service`

use std::fs::File;
use std::io::{self, BufReader};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use roomsense_service::{AppState, Collector, Config, api, replay};
use roomsense_store::Store;

/// RoomSense Service - Background collector and HTTP REST API.
#[derive(Parser, Debug)]
#[command(name = "roomsense-service")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long, global = true)]
    bind: Option<String>,

    /// Database path (overrides config).
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Device JSON endpoint (overrides config).
    #[arg(long, global = true)]
    device_url: Option<String>,

    /// Disable background collector (API only mode).
    #[arg(long, global = true)]
    no_collector: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the service in the foreground (default behavior).
    Run,

    /// Process recorded payloads (JSON lines) and print the results.
    Replay {
        /// Input file, or `-` for stdin.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Command::Replay { file }) => run_replay(&file),
        Some(Command::Run) | None => run_server(args).await,
    }
}

fn run_replay(file: &Path) -> anyhow::Result<()> {
    let report = |line: usize, err: &roomsense_types::ParseError| {
        eprintln!("line {}: {}", line, err);
    };
    let stdout = io::stdout().lock();

    let summary = if file.as_os_str() == "-" {
        replay(io::stdin().lock(), stdout, report)?
    } else {
        let input = File::open(file).with_context(|| format!("Failed to open {:?}", file))?;
        replay(BufReader::new(input), stdout, report)?
    };

    if summary.skipped > 0 {
        eprintln!(
            "Processed {} reading(s), skipped {} invalid line(s)",
            summary.processed, summary.skipped
        );
    }
    Ok(())
}

async fn run_server(args: Args) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomsense_service=info".parse()?)
                .add_directive("roomsense_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_else(|e| {
            warn!("Ignoring unreadable default config: {}", e);
            Config::default()
        }),
    };

    // Override config with CLI args
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(db_path) = args.database {
        config.storage.path = db_path;
    }
    if let Some(url) = args.device_url {
        config.device.url = url;
    }
    config.validate()?;

    // Open the database
    info!("Opening database at {:?}", config.storage.path);
    let mut store = Store::open(&config.storage.path)?;
    store.set_max_records(config.storage.max_records)?;

    // Create application state
    let addr: SocketAddr = config.server.bind.parse()?;
    let state = AppState::new(store, config);

    // Start the background collector
    if !args.no_collector {
        Collector::new(Arc::clone(&state)).start().await?;
    } else {
        info!("Background collector disabled");
    }

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
