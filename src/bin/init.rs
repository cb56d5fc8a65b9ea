//! keeper_init - One-time database initialization tool
//!
//! Creates a fresh keeper database, optionally seeded with a roster.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

/// keeper database initialization tool
#[derive(Parser, Debug)]
#[command(name = "keeper_init", version, about = "Initialize a new keeper database")]
struct Args {
    /// Path to SQLite database file to create (must not exist)
    #[arg(short, long)]
    database: PathBuf,

    /// JSON file with an array of characters to seed
    #[arg(long)]
    roster: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    keeper::init_tracing("keeper=info");

    // Parse CLI arguments
    let args = Args::parse();

    let characters = match &args.roster {
        Some(path) => {
            if !path.exists() {
                bail!("Roster file not found: {}", path.display());
            }
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            keeper::init::parse_roster(&json)?
        }
        None => Vec::new(),
    };

    // Initialize the database
    keeper::init::init_database(&args.database, &characters).await?;

    Ok(())
}
