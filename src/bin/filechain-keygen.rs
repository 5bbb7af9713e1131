#![forbid(unsafe_code)]
//! Generates the RSA key pair used by `filechain-sign`.

use clap::Parser;
use colored::*;
use filechain::crypto::{KeyPair, DEFAULT_KEY_BITS};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for private_key.pem and public_key.pem
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
    bits: usize,
    /// Overwrite existing key files
    #[arg(long)]
    force: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let private_path = cli.out_dir.join("private_key.pem");
    let public_path = cli.out_dir.join("public_key.pem");
    if !cli.force && (private_path.exists() || public_path.exists()) {
        return Err(format!(
            "{} or {} already exists (use --force to overwrite)",
            private_path.display(),
            public_path.display()
        )
        .into());
    }

    println!("{}", format!("🔑 Generating {}-bit RSA key pair...", cli.bits).bright_cyan());
    let keypair = KeyPair::generate(cli.bits)?;

    fs::create_dir_all(&cli.out_dir)?;
    fs::write(&private_path, keypair.private_key_pem()?)?;
    restrict_permissions(&private_path)?;
    fs::write(&public_path, keypair.public_key_pem()?)?;

    println!("{} {}", "Private key:".bright_green(), private_path.display());
    println!("{} {}", "Public key: ".bright_green(), public_path.display());
    println!("{}", "Keep the private key secret.".yellow());
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}
