//! SQLite-backed store
//!
//! Child collections (a character's consumables, a combat's participants)
//! are replaced wholesale inside one transaction, so the stored set always
//! matches the in-memory set that was saved.

use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{Result, Scenario, Store, StoreError};
use crate::combat::{
    Character, CharacterKind, Combat, Consumable, Participant, Pool, RecoveryType, ResetCondition,
    ResetType,
};

/// Store implementation over a SQLite pool created by [`crate::db::Database`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_consumables(&self, character_id: &str) -> Result<Vec<Consumable>> {
        let rows: Vec<ConsumableRow> = sqlx::query_as(
            r#"
            SELECT id, name, current_charges, max_charges, reset_condition,
                   recovery_type, recovery_amount, description, notes
            FROM consumables WHERE character_id = ?
            ORDER BY position, name
            "#,
        )
        .bind(character_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ConsumableRow::into_consumable).collect()
    }

    async fn hydrate(&self, row: CharacterRow) -> Result<Character> {
        let mut character = row.into_character()?;
        for consumable in self.load_consumables(character.id()).await? {
            character.add_consumable(consumable);
        }
        Ok(character)
    }

    /// Apply each stored consumable's recovery policy for one condition
    async fn recover_stored(&self, condition: ResetCondition) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE consumables
            SET current_charges = CASE
                WHEN recovery_type = 'full' THEN max_charges
                WHEN recovery_type = 'dice'
                    THEN MIN(max_charges, current_charges + (max_charges + 1) / 2)
                WHEN recovery_type GLOB '[0-9]*'
                    THEN MIN(max_charges, current_charges + CAST(recovery_type AS INTEGER))
                ELSE current_charges
            END
            WHERE reset_condition = ? AND character_id IS NOT NULL
            "#,
        )
        .bind(condition.as_str())
        .execute(&self.pool)
        .await?;

        info!(
            "Stored {} recovery touched {} consumables",
            condition,
            result.rows_affected()
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn save_character(&self, character: &Character) -> Result<()> {
        let conditions = serde_json::to_string(&character.conditions().collect::<Vec<_>>())?;
        let hp = character.hp();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO characters (id, name, type, ac, hp_current, hp_max, conditions, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                ac = excluded.ac,
                hp_current = excluded.hp_current,
                hp_max = excluded.hp_max,
                conditions = excluded.conditions,
                notes = excluded.notes
            "#,
        )
        .bind(character.id())
        .bind(&character.name)
        .bind(character.kind().as_str())
        .bind(character.ac().map(i64::from))
        .bind(hp.map(|hp| i64::from(hp.current())))
        .bind(hp.map(|hp| i64::from(hp.max())))
        .bind(&conditions)
        .bind(&character.notes)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM consumables WHERE character_id = ?")
            .bind(character.id())
            .execute(&mut *tx)
            .await?;

        for (position, consumable) in character.consumables().iter().enumerate() {
            // Upsert: the row may still belong to a character that gave it away
            sqlx::query(
                r#"
                INSERT INTO consumables
                    (id, character_id, position, name, current_charges, max_charges,
                     reset_condition, recovery_type, recovery_amount, description, notes)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    character_id = excluded.character_id,
                    position = excluded.position,
                    name = excluded.name,
                    current_charges = excluded.current_charges,
                    max_charges = excluded.max_charges,
                    reset_condition = excluded.reset_condition,
                    recovery_type = excluded.recovery_type,
                    recovery_amount = excluded.recovery_amount,
                    description = excluded.description,
                    notes = excluded.notes
                "#,
            )
            .bind(&consumable.id)
            .bind(character.id())
            .bind(position as i64)
            .bind(&consumable.name)
            .bind(i64::from(consumable.charges.current()))
            .bind(i64::from(consumable.charges.max()))
            .bind(consumable.reset_condition.as_str())
            .bind(consumable.recovery.to_string())
            .bind(consumable.recovery_amount.map(i64::from))
            .bind(&consumable.description)
            .bind(&consumable.notes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            "Saved character {} ({}) with {} consumables",
            character.name,
            character.id(),
            character.consumables().len()
        );
        Ok(())
    }

    async fn load_character(&self, id: &str) -> Result<Option<Character>> {
        let row: Option<CharacterRow> = sqlx::query_as(
            r#"
            SELECT id, name, type, ac, hp_current, hp_max, conditions, notes
            FROM characters WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(self.hydrate(r).await?)),
            None => Ok(None),
        }
    }

    async fn load_all_characters(&self) -> Result<Vec<Character>> {
        let rows: Vec<CharacterRow> = sqlx::query_as(
            r#"
            SELECT id, name, type, ac, hp_current, hp_max, conditions, notes
            FROM characters ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut characters = Vec::with_capacity(rows.len());
        for row in rows {
            characters.push(self.hydrate(row).await?);
        }
        Ok(characters)
    }

    async fn delete_character(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        // Unseat first so each combat's turn stays with the same actor
        let seated: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT combat_id FROM combat_participants WHERE character_id = ?",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        for (combat_id,) in seated {
            if let Some(mut combat) = fetch_combat(&mut tx, &combat_id).await? {
                combat.remove_character(id);
                write_combat(&mut tx, &combat).await?;
            }
        }

        let result = sqlx::query("DELETE FROM characters WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn move_consumable(
        &self,
        consumable_id: &str,
        from_character_id: &str,
        to_character_id: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE consumables
            SET character_id = ?,
                position = (SELECT COALESCE(MAX(position), -1) + 1
                            FROM consumables WHERE character_id = ?)
            WHERE id = ? AND character_id = ?
            "#,
        )
        .bind(to_character_id)
        .bind(to_character_id)
        .bind(consumable_id)
        .bind(from_character_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_combat(&self, combat: &Combat) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        write_combat(&mut tx, combat).await?;
        tx.commit().await?;

        debug!(
            "Saved combat {} (round {}, turn {}, {} participants)",
            combat.id(),
            combat.current_round(),
            combat.current_turn_index(),
            combat.participants().len()
        );
        Ok(())
    }

    async fn load_combat(&self, id: &str) -> Result<Option<Combat>> {
        let mut conn = self.pool.acquire().await?;
        fetch_combat(&mut conn, id).await
    }

    async fn load_active_combat(&self) -> Result<Option<Combat>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM combats WHERE is_active = 1 LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((id,)) => self.load_combat(&id).await,
            None => Ok(None),
        }
    }

    async fn delete_combat(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM combats WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_scenario(&self, scenario: &Scenario) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        if scenario.is_active {
            sqlx::query("UPDATE scenarios SET is_active = 0 WHERE is_active = 1 AND id IS NOT ?")
                .bind(scenario.id)
                .execute(&mut *tx)
                .await?;
        }

        let id = match scenario.id {
            Some(id) => {
                sqlx::query(
                    r#"
                    INSERT INTO scenarios (id, name, is_active, start_time, elapsed_time)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        is_active = excluded.is_active,
                        start_time = excluded.start_time,
                        elapsed_time = excluded.elapsed_time
                    "#,
                )
                .bind(id)
                .bind(&scenario.name)
                .bind(scenario.is_active)
                .bind(scenario.start_time)
                .bind(scenario.elapsed_time)
                .execute(&mut *tx)
                .await?;
                id
            }
            None => sqlx::query(
                r#"
                INSERT INTO scenarios (name, is_active, start_time, elapsed_time)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&scenario.name)
            .bind(scenario.is_active)
            .bind(scenario.start_time)
            .bind(scenario.elapsed_time)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        tx.commit().await?;
        Ok(id)
    }

    async fn load_active_scenario(&self) -> Result<Option<Scenario>> {
        let row: Option<ScenarioRow> = sqlx::query_as(
            r#"
            SELECT id, name, is_active, start_time, elapsed_time
            FROM scenarios WHERE is_active = 1 LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ScenarioRow::into_scenario))
    }

    async fn deactivate_all_scenarios(&self) -> Result<()> {
        sqlx::query("UPDATE scenarios SET is_active = 0")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn trigger_rest(&self, rest: ResetCondition) -> Result<u64> {
        if rest.reset_type() != ResetType::Rest {
            return Err(StoreError::WrongResetType(rest, "rest"));
        }
        self.recover_stored(rest).await
    }

    async fn trigger_time_recovery(&self, time: ResetCondition) -> Result<u64> {
        if time.reset_type() != ResetType::Time {
            return Err(StoreError::WrongResetType(time, "time"));
        }
        self.recover_stored(time).await
    }
}

/// Upsert a combat and replace its participant list on `conn`
async fn write_combat(conn: &mut SqliteConnection, combat: &Combat) -> Result<()> {
    if combat.is_active() {
        sqlx::query("UPDATE combats SET is_active = 0 WHERE is_active = 1 AND id != ?")
            .bind(combat.id())
            .execute(&mut *conn)
            .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO combats (id, name, current_round, current_turn_index, is_active)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            current_round = excluded.current_round,
            current_turn_index = excluded.current_turn_index,
            is_active = excluded.is_active
        "#,
    )
    .bind(combat.id())
    .bind(&combat.name)
    .bind(i64::from(combat.current_round()))
    .bind(combat.current_turn_index() as i64)
    .bind(combat.is_active())
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM combat_participants WHERE combat_id = ?")
        .bind(combat.id())
        .execute(&mut *conn)
        .await?;

    for participant in combat.participants() {
        sqlx::query(
            r#"
            INSERT INTO combat_participants
                (combat_id, character_id, initiative, is_active, joined_round)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(combat.id())
        .bind(&participant.character_id)
        .bind(participant.initiative)
        .bind(participant.is_active)
        .bind(i64::from(participant.joined_round))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_combat(conn: &mut SqliteConnection, id: &str) -> Result<Option<Combat>> {
    let row: Option<CombatRow> = sqlx::query_as(
        r#"
        SELECT id, name, current_round, current_turn_index, is_active
        FROM combats WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    // Insertion order (cp.id) breaks initiative ties
    let participants: Vec<ParticipantRow> = sqlx::query_as(
        r#"
        SELECT cp.character_id, cp.initiative, cp.is_active, cp.joined_round
        FROM combat_participants cp
        JOIN characters c ON cp.character_id = c.id
        WHERE cp.combat_id = ?
        ORDER BY cp.initiative DESC, cp.id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let participants = participants
        .into_iter()
        .map(ParticipantRow::into_participant)
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(row.into_combat(participants)?))
}

fn to_u32(table: &'static str, field: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidRow {
        table,
        reason: format!("{} out of range: {}", field, value),
    })
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct CharacterRow {
    id: String,
    name: String,
    #[sqlx(rename = "type")]
    kind: String,
    ac: Option<i64>,
    hp_current: Option<i64>,
    hp_max: Option<i64>,
    conditions: String,
    notes: String,
}

impl CharacterRow {
    fn into_character(self) -> Result<Character> {
        let kind: CharacterKind = self.kind.parse().map_err(|e: crate::combat::ParseError| {
            StoreError::InvalidRow {
                table: "characters",
                reason: e.to_string(),
            }
        })?;

        let ac = self.ac.map(|v| to_u32("characters", "ac", v)).transpose()?;
        let current = self
            .hp_current
            .map(|v| to_u32("characters", "hp_current", v))
            .transpose()?;
        let max = self
            .hp_max
            .map(|v| to_u32("characters", "hp_max", v))
            .transpose()?;
        let hp = match (current, max) {
            (None, None) => None,
            (current, max) => Some(Pool::from_parts(current, max)),
        };

        let mut character = Character::restore(&self.id, &self.name, kind, ac, hp, &self.notes);
        let conditions: Vec<String> = serde_json::from_str(&self.conditions)?;
        for condition in &conditions {
            character.add_condition(condition);
        }
        Ok(character)
    }
}

#[derive(sqlx::FromRow)]
struct ConsumableRow {
    id: String,
    name: String,
    current_charges: i64,
    max_charges: i64,
    reset_condition: String,
    recovery_type: String,
    recovery_amount: Option<i64>,
    description: String,
    notes: String,
}

impl ConsumableRow {
    fn into_consumable(self) -> Result<Consumable> {
        let invalid = |e: crate::combat::ParseError| StoreError::InvalidRow {
            table: "consumables",
            reason: e.to_string(),
        };
        let reset_condition: ResetCondition = self.reset_condition.parse().map_err(invalid)?;
        let recovery: RecoveryType = self.recovery_type.parse().map_err(invalid)?;
        let charges = Pool::new(
            to_u32("consumables", "current_charges", self.current_charges)?,
            to_u32("consumables", "max_charges", self.max_charges)?,
        );

        let mut consumable = Consumable::new(&self.name, charges.max())
            .with_charges(charges)
            .resets_on(reset_condition)
            .recovers(recovery);
        consumable.id = self.id;
        consumable.recovery_amount = self
            .recovery_amount
            .map(|v| to_u32("consumables", "recovery_amount", v))
            .transpose()?;
        consumable.description = self.description;
        consumable.notes = self.notes;
        Ok(consumable)
    }
}

#[derive(sqlx::FromRow)]
struct CombatRow {
    id: String,
    name: Option<String>,
    current_round: i64,
    current_turn_index: i64,
    is_active: bool,
}

impl CombatRow {
    fn into_combat(self, participants: Vec<Participant>) -> Result<Combat> {
        let round = to_u32("combats", "current_round", self.current_round)?;
        let turn = to_u32("combats", "current_turn_index", self.current_turn_index)?;
        Ok(Combat::restore(
            &self.id,
            self.name,
            participants,
            round,
            turn as usize,
            self.is_active,
        ))
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    character_id: String,
    initiative: i64,
    is_active: bool,
    joined_round: i64,
}

impl ParticipantRow {
    fn into_participant(self) -> Result<Participant> {
        let initiative = i32::try_from(self.initiative).map_err(|_| StoreError::InvalidRow {
            table: "combat_participants",
            reason: format!("initiative out of range: {}", self.initiative),
        })?;
        Ok(Participant {
            character_id: self.character_id,
            initiative,
            is_active: self.is_active,
            joined_round: to_u32("combat_participants", "joined_round", self.joined_round)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ScenarioRow {
    id: i64,
    name: String,
    is_active: bool,
    start_time: Option<i64>,
    elapsed_time: i64,
}

impl ScenarioRow {
    fn into_scenario(self) -> Scenario {
        Scenario {
            id: Some(self.id),
            name: self.name,
            is_active: self.is_active,
            start_time: self.start_time,
            elapsed_time: self.elapsed_time,
        }
    }
}
