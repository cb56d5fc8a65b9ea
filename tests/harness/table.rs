//! TestTable - a fresh database seeded with the fellowship and an ambush
//!
//! Creates a standard test environment with:
//! - Aragorn, Legolas and Gandalf (pcs) with consumables
//! - An Orc Chieftain (enemy) and Cave Collapse (lair)

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use keeper::combat::{Character, CharacterKind, Consumable, RecoveryType, ResetCondition};
use keeper::db::Database;
use keeper::session::Session;
use keeper::store::{SqliteStore, Store};
use tempfile::TempDir;

/// Pre-seeded on-disk table
pub struct TestTable {
    pub store: Arc<SqliteStore>,
    /// Path to the database file
    pub db_path: PathBuf,
    pub aragorn_id: String,
    pub legolas_id: String,
    pub gandalf_id: String,
    pub orc_id: String,
    pub lair_id: String,
    db: Database,
    /// Temp directory for the database (cleaned up on drop)
    _temp_dir: TempDir,
}

impl TestTable {
    /// Create the database and seed the party
    pub async fn start() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("keeper.db");
        let db = Database::new(db_path.to_str()).await?;
        let store = Arc::new(SqliteStore::new(db.pool().clone()));

        let aragorn = Character::new("Aragorn", CharacterKind::Pc)
            .with_hp(58)
            .with_ac(18);

        let mut legolas = Character::new("Legolas", CharacterKind::Pc)
            .with_hp(45)
            .with_ac(16);
        legolas.add_consumable(
            Consumable::new("Hunter's Mark", 1).resets_on(ResetCondition::ShortRest),
        );

        let mut gandalf = Character::new("Gandalf", CharacterKind::Pc)
            .with_hp(38)
            .with_ac(15);
        gandalf.add_consumable(Consumable::new("Spell Slots", 3));
        gandalf.add_consumable(
            Consumable::new("Staff Charges", 10)
                .resets_on(ResetCondition::Dawn)
                .recovers(RecoveryType::Dice),
        );
        gandalf.add_condition("Blessed");

        let orc = Character::new("Orc Chieftain", CharacterKind::Enemy)
            .with_hp(85)
            .with_ac(15);
        let lair = Character::new("Cave Collapse", CharacterKind::Lair);

        for character in [&aragorn, &legolas, &gandalf, &orc, &lair] {
            store.save_character(character).await?;
        }

        Ok(Self {
            store,
            db_path,
            aragorn_id: aragorn.id().to_string(),
            legolas_id: legolas.id().to_string(),
            gandalf_id: gandalf.id().to_string(),
            orc_id: orc.id().to_string(),
            lair_id: lair.id().to_string(),
            db,
            _temp_dir: temp_dir,
        })
    }

    /// A new session over this table's store
    pub fn session(&self) -> Session {
        Session::new(self.store.clone())
    }

    /// Reopen the same file through a brand-new connection pool
    pub async fn reopen(&self) -> Result<Arc<SqliteStore>> {
        let db = Database::new(self.db_path.to_str()).await?;
        Ok(Arc::new(SqliteStore::new(db.pool().clone())))
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.db.pool()
    }
}
