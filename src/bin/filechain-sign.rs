#![forbid(unsafe_code)]
//! Signs a ledger block and prints the `/sign_block` payload as JSON.

use clap::Parser;
use colored::*;
use filechain::config::{load_config, SignerConfig, DEFAULT_CONFIG_PATH};
use filechain::signer;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file; missing means defaults
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// File whose hash should match the block's file_hash
    #[arg(long)]
    file: Option<PathBuf>,
    /// Ledger server base URL, e.g. http://localhost:5000
    #[arg(long)]
    server: Option<String>,
    #[arg(long)]
    private_key: Option<PathBuf>,
    #[arg(long)]
    public_key: Option<PathBuf>,
    #[arg(long)]
    signer_id: Option<String>,
    #[arg(long)]
    block_index: Option<u64>,
    /// POST the payload to /sign_block after printing it
    #[arg(long)]
    submit: bool,
    /// Fail on file-hash or key-pair mismatches instead of warning
    #[arg(long)]
    strict: bool,
}

impl Cli {
    fn apply(self, mut signer: SignerConfig) -> SignerConfig {
        if let Some(file) = self.file {
            signer.file_path = file;
        }
        if let Some(server) = self.server {
            signer.server_url = server;
        }
        if let Some(path) = self.private_key {
            signer.private_key_path = path;
        }
        if let Some(path) = self.public_key {
            signer.public_key_path = path;
        }
        if let Some(id) = self.signer_id {
            signer.signer_id = id;
        }
        if let Some(index) = self.block_index {
            signer.block_index = index;
        }
        signer.submit |= self.submit;
        signer.strict |= self.strict;
        signer
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli.config)?;
    let signer_config = cli.apply(config.signer);

    let outcome = signer::run(&signer_config).await?;
    println!("{}", outcome.payload.to_json()?);

    if let Some(response) = outcome.submission {
        eprintln!("{}", "Response from ledger:".bright_green());
        eprintln!("{}", serde_json::to_string_pretty(&response)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries the JSON payload only
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".bright_red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
