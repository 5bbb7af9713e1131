#![forbid(unsafe_code)]
//! Serves the FileChain ledger over HTTP.

use clap::Parser;
use filechain::api::{run_api_server, Node};
use filechain::config::{load_config, StorageBackend, DEFAULT_CONFIG_PATH};
use filechain::persistence::{load_or_create_chain, open_storage, Persistence};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    port: Option<u16>,
    /// Keep everything in memory (nothing is written to disk)
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?.server;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.ephemeral {
        config.storage.backend = StorageBackend::Memory;
    }

    let persistence: Arc<dyn Persistence> = Arc::from(open_storage(&config.storage)?);
    let blockchain = load_or_create_chain(persistence.as_ref())?;
    info!(
        blocks = blockchain.len(),
        backend = ?config.storage.backend,
        valid = blockchain.is_valid(),
        "Ledger loaded"
    );

    let host: IpAddr = config
        .host
        .parse()
        .map_err(|e| format!("Invalid server.host '{}': {}", config.host, e))?;
    let node = Arc::new(Node::new(blockchain, persistence));
    run_api_server(node, SocketAddr::new(host, config.port)).await?;
    Ok(())
}
