//! Table session: the in-memory working set plus the store behind it
//!
//! A session loads characters and (optionally) a combat, lets the caller
//! mutate them through [`Session::roster_mut`] and [`Session::combat_mut`],
//! and writes everything back with [`Session::save`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::combat::{trigger_rest, trigger_time_recovery, Combat, ResetCondition, Roster};
use crate::store::{Result, Store};

pub struct Session {
    store: Arc<dyn Store>,
    roster: Roster,
    combat: Option<Combat>,
}

impl Session {
    /// Create an empty session over an injected store
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            roster: Roster::new(),
            combat: None,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn combat(&self) -> Option<&Combat> {
        self.combat.as_ref()
    }

    pub fn combat_mut(&mut self) -> Option<&mut Combat> {
        self.combat.as_mut()
    }

    /// Load every stored character into the roster
    pub async fn load_roster(&mut self) -> Result<usize> {
        let characters = self.store.load_all_characters().await?;
        let count = characters.len();
        for character in characters {
            self.roster.insert(character);
        }
        info!("Loaded {} characters", count);
        Ok(count)
    }

    /// Make `id` the session's combat, loading any participant not yet in the roster
    pub async fn resume_combat(&mut self, id: &str) -> Result<bool> {
        match self.store.load_combat(id).await? {
            Some(combat) => {
                self.adopt(combat).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Resume whichever combat is flagged active in the store
    pub async fn resume_active_combat(&mut self) -> Result<bool> {
        match self.store.load_active_combat().await? {
            Some(combat) => {
                self.adopt(combat).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn adopt(&mut self, combat: Combat) -> Result<()> {
        for participant in combat.participants() {
            if self.roster.contains(&participant.character_id) {
                continue;
            }
            match self.store.load_character(&participant.character_id).await? {
                Some(character) => {
                    self.roster.insert(character);
                }
                None => warn!(
                    "Combat {} references missing character {}",
                    combat.id(),
                    participant.character_id
                ),
            }
        }
        info!(
            "Resumed combat {} at round {}",
            combat.id(),
            combat.current_round()
        );
        self.combat = Some(combat);
        Ok(())
    }

    /// Replace the session's combat with a fresh, empty one
    pub fn begin_combat(&mut self, name: &str) -> &mut Combat {
        self.combat.insert(Combat::named(name))
    }

    /// End the current combat, if any; it stays attached until saved
    pub fn end_combat(&mut self) -> bool {
        match self.combat.as_mut() {
            Some(combat) if combat.is_active() => {
                combat.end();
                true
            }
            _ => false,
        }
    }

    /// Write every roster character, then the combat
    pub async fn save(&self) -> Result<()> {
        for character in self.roster.iter() {
            self.store.save_character(character).await?;
        }
        if let Some(combat) = &self.combat {
            self.store.save_combat(combat).await?;
        }
        Ok(())
    }

    /// Rest everyone: stored characters first, then the in-memory roster,
    /// whose state then overwrites its stored rows
    pub async fn rest(&mut self, rest: ResetCondition) -> Result<usize> {
        self.store.trigger_rest(rest).await?;
        let recovered = trigger_rest(self.roster.iter_mut(), rest);
        self.save().await?;
        info!("{}: {} consumables recovered in session", rest, recovered);
        Ok(recovered)
    }

    /// Time-of-day recovery, kept consistent the same way as [`Session::rest`]
    pub async fn time_passes(&mut self, time: ResetCondition) -> Result<usize> {
        self.store.trigger_time_recovery(time).await?;
        let recovered = trigger_time_recovery(self.roster.iter_mut(), time);
        self.save().await?;
        info!("{}: {} consumables recovered in session", time, recovered);
        Ok(recovered)
    }
}
