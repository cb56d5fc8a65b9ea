//! Database module - SQLite schema for characters, consumables and combats

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

#[cfg(test)]
pub mod test_utils;

/// Schema version stamped into `db_metadata`
pub const SCHEMA_VERSION: i64 = 1;

/// Database handle wrapping SQLite connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    /// If path is None, uses in-memory database (for testing)
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let (conn_str, max_connections) = match path {
            Some(p) => (format!("sqlite:{}?mode=rwc", p), 5),
            // A single connection keeps every query on the same in-memory database
            None => ("sqlite::memory:".to_string(), 1),
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create tables and stamp the schema version
    async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        // Scenarios (at most one active)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scenarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                start_time INTEGER,
                elapsed_time INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS characters (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('pc', 'enemy', 'lair')),
                ac INTEGER,
                hp_current INTEGER,
                hp_max INTEGER,
                conditions TEXT NOT NULL DEFAULT '[]',
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS consumables (
                id TEXT PRIMARY KEY,
                character_id TEXT REFERENCES characters(id) ON DELETE CASCADE,
                position INTEGER NOT NULL DEFAULT 0,
                name TEXT NOT NULL,
                current_charges INTEGER NOT NULL,
                max_charges INTEGER NOT NULL,
                reset_condition TEXT NOT NULL
                    CHECK (reset_condition IN ('long_rest', 'short_rest', 'dawn', 'dusk', 'never')),
                recovery_type TEXT NOT NULL DEFAULT 'full',
                recovery_amount INTEGER,
                description TEXT NOT NULL DEFAULT '',
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS combats (
                id TEXT PRIMARY KEY,
                name TEXT,
                current_round INTEGER NOT NULL DEFAULT 0,
                current_turn_index INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS combat_participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                combat_id TEXT NOT NULL REFERENCES combats(id) ON DELETE CASCADE,
                character_id TEXT NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
                initiative INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                joined_round INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(combat_id, character_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS db_metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Create indexes
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_scenarios_active ON scenarios(is_active) WHERE is_active = 1",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_combats_active ON combats(is_active) WHERE is_active = 1",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_consumables_character ON consumables(character_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_participants_combat ON combat_participants(combat_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT OR REPLACE INTO db_metadata (key, value) VALUES ('version', ?)")
            .bind(SCHEMA_VERSION.to_string())
            .execute(&self.pool)
            .await?;

        info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read the stamped schema version
    pub async fn schema_version(&self) -> Result<Option<i64>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM db_metadata WHERE key = 'version'")
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((value,)) => Ok(Some(value.parse()?)),
            None => Ok(None),
        }
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}
