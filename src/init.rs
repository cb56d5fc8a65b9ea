//! Database initialization module
//!
//! Provides one-time database setup for the keeper_init tool.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::combat::Character;
use crate::db::Database;
use crate::store::{SqliteStore, Store};

/// Parse a JSON array of character seeds
///
/// Seeds accept the loose shapes a table uses by hand: `"hp": 45` or
/// `"hp": {"current": 30, "max": 45}`, with missing vitals defaulted.
pub fn parse_roster(json: &str) -> Result<Vec<Character>> {
    serde_json::from_str(json).context("Invalid roster file")
}

/// Initialize a new keeper database
///
/// # Arguments
/// * `path` - Path to the SQLite database file (must not exist)
/// * `characters` - Characters to seed, with their consumables
///
/// # Errors
/// * Database file already exists
/// * Database creation fails
pub async fn init_database(path: &Path, characters: &[Character]) -> Result<()> {
    // Fail if database already exists
    if path.exists() {
        bail!(
            "Database file already exists: {}. Remove it first or use a different path.",
            path.display()
        );
    }

    let path_str = path
        .to_str()
        .with_context(|| format!("Non UTF-8 database path: {}", path.display()))?;

    info!("Creating new database at {}", path.display());

    // Create the database (runs migrations)
    let db = Database::new(Some(path_str)).await?;
    let store = SqliteStore::new(db.pool().clone());

    if !characters.is_empty() {
        info!("Seeding {} characters...", characters.len());
        for character in characters {
            store.save_character(character).await?;
            info!(
                "  {} ({}, {} consumables)",
                character.name,
                character.kind(),
                character.consumables().len()
            );
        }
    }

    db.close().await;
    info!("Database initialization complete");
    Ok(())
}
