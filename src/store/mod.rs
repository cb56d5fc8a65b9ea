//! Persistence boundary
//!
//! The core entities never touch the database. Orchestration code holds a
//! [`Store`] and moves whole snapshots across it: load, mutate in memory,
//! save.

mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{Character, Combat, ResetCondition};

pub use sqlite::SqliteStore;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid {table} row: {reason}")]
    InvalidRow { table: &'static str, reason: String },

    #[error("{0} is not a {1} condition")]
    WrongResetType(ResetCondition, &'static str),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A campaign session with an in-game clock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Assigned by the store on first save
    pub id: Option<i64>,
    pub name: String,
    pub is_active: bool,
    /// Unix seconds when play started
    pub start_time: Option<i64>,
    /// In-game seconds elapsed
    pub elapsed_time: i64,
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            is_active: false,
            start_time: None,
            elapsed_time: 0,
        }
    }

    /// Mark active and stamp the wall-clock start
    pub fn start(&mut self) {
        self.is_active = true;
        self.start_time = Some(chrono::Utc::now().timestamp());
    }

    pub fn advance(&mut self, seconds: i64) {
        self.elapsed_time = self.elapsed_time.saturating_add(seconds.max(0));
    }
}

/// Load/save operations the core relies on
#[async_trait]
pub trait Store: Send + Sync {
    /// Upsert a character and replace its consumables
    async fn save_character(&self, character: &Character) -> Result<()>;

    async fn load_character(&self, id: &str) -> Result<Option<Character>>;

    /// Every stored character, ordered by name
    async fn load_all_characters(&self) -> Result<Vec<Character>>;

    async fn delete_character(&self, id: &str) -> Result<bool>;

    /// Reassign a stored consumable to another character
    async fn move_consumable(
        &self,
        consumable_id: &str,
        from_character_id: &str,
        to_character_id: &str,
    ) -> Result<bool>;

    /// Upsert a combat and replace its participant list
    async fn save_combat(&self, combat: &Combat) -> Result<()>;

    async fn load_combat(&self, id: &str) -> Result<Option<Combat>>;

    async fn load_active_combat(&self) -> Result<Option<Combat>>;

    async fn delete_combat(&self, id: &str) -> Result<bool>;

    /// Save a scenario, returning its id
    async fn save_scenario(&self, scenario: &Scenario) -> Result<i64>;

    async fn load_active_scenario(&self) -> Result<Option<Scenario>>;

    async fn deactivate_all_scenarios(&self) -> Result<()>;

    /// Recover every stored consumable reset by `rest`; returns rows touched
    async fn trigger_rest(&self, rest: ResetCondition) -> Result<u64>;

    /// Recover every stored consumable reset by `time`; returns rows touched
    async fn trigger_time_recovery(&self, time: ResetCondition) -> Result<u64>;
}
