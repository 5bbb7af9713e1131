#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "FileChain CLI".bright_cyan().bold());
    println!("{}", "-------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but all functionality is in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!("  - {}  {}", "filechain-server".bright_white(), "serve the ledger API".dimmed());
    println!("  - {}    {}", "filechain-sign".bright_white(), "sign a block and print the payload".dimmed());
    println!("  - {}  {}", "filechain-keygen".bright_white(), "create private_key.pem / public_key.pem".dimmed());
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!(
        "{}",
        "  cargo run --bin filechain-sign -- --file scan.png --signer-id user123 --block-index 1".italic()
    );
}
