//! keeper - tabletop RPG combat assistant
//!
//! Tracks characters, their hit points, conditions and consumables, runs an
//! initiative tracker, and persists everything to SQLite so a table can pick
//! up where it left off.

pub mod combat;
pub mod db;
pub mod ids;
pub mod init;
pub mod session;
pub mod store;

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default config file looked up in the working directory
pub const CONFIG_FILE: &str = "keeper.toml";

/// Default SQLite file, next to the config file
pub const DB_FILE: &str = "keeper.db";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file; `None` keeps everything in memory
    pub db_path: Option<String>,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: Some(DB_FILE.to_string()),
            log_filter: "keeper=info".to_string(),
        }
    }
}

impl Config {
    /// Layered sources: defaults, then the TOML file, then `KEEPER_*` env vars
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("KEEPER_"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }
}

/// Install the global subscriber; `RUST_LOG` wins over `default_filter`
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
