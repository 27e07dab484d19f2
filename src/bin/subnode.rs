use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subnode::{Config, Tracker, run_with_shutdown};

#[derive(Parser)]
#[command(name = "subnode")]
#[command(about = "Track the subdomains of your projects and get told when they change")]
struct Cli {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Override the SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "subnode=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.api.bind_address = bind;
    }
    if let Some(database) = cli.database {
        config.persistence.database_path = database;
    }

    let tracker = Arc::new(Tracker::new(config).await?);
    let api = tracker.spawn_api_server();

    tokio::select! {
        result = api => {
            // The server only returns on failure
            match result {
                Ok(Err(e)) => tracing::error!(error = %e, "API server failed"),
                Err(e) => tracing::error!(error = %e, "API server task panicked"),
                Ok(Ok(())) => {}
            }
            tracker.shutdown().await;
        }
        _ = run_with_shutdown(&tracker) => {}
    }

    Ok(())
}
