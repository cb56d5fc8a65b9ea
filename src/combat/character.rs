//! Characters: player characters, enemies and lair-action pseudo-actors
//!
//! A character owns its conditions and consumables. Lair actors never carry
//! hit points or armor class, so damage and healing never touch them.

use std::str::FromStr;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::consumable::{Consumable, ResetCondition, ResetType};
use super::error::ParseError;
use super::pool::Pool;
use crate::ids::generate_id;

/// Unique character identifier
pub type CharacterId = String;

/// Default armor class for a new pc or enemy
pub const DEFAULT_AC: u32 = 10;

/// Display colors keyed by character type
pub const PC_COLOR: &str = "#4CAF50";
pub const ENEMY_COLOR: &str = "#F44336";
pub const LAIR_COLOR: &str = "#FF9800";
pub const UNKNOWN_COLOR: &str = "#757575";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    #[default]
    Pc,
    Enemy,
    Lair,
}

impl CharacterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterKind::Pc => "pc",
            CharacterKind::Enemy => "enemy",
            CharacterKind::Lair => "lair",
        }
    }

    pub fn display_color(&self) -> &'static str {
        match self {
            CharacterKind::Pc => PC_COLOR,
            CharacterKind::Enemy => ENEMY_COLOR,
            CharacterKind::Lair => LAIR_COLOR,
        }
    }
}

impl FromStr for CharacterKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc" | "player" => Ok(CharacterKind::Pc),
            "enemy" | "npc" => Ok(CharacterKind::Enemy),
            "lair" => Ok(CharacterKind::Lair),
            _ => Err(ParseError::CharacterKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A combat actor with vitals, conditions and owned consumables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CharacterSeed")]
pub struct Character {
    id: CharacterId,
    pub name: String,
    #[serde(rename = "type")]
    kind: CharacterKind,
    ac: Option<u32>,
    hp: Option<Pool>,
    conditions: IndexSet<String>,
    consumables: Vec<Consumable>,
    pub notes: String,
}

/// Loose input form; missing vitals fall back to the defaults
#[derive(Deserialize)]
struct CharacterSeed {
    #[serde(default = "generate_id")]
    id: CharacterId,
    name: String,
    #[serde(default, rename = "type")]
    kind: CharacterKind,
    #[serde(default)]
    ac: Option<u32>,
    #[serde(default)]
    hp: Option<Pool>,
    #[serde(default)]
    conditions: Vec<String>,
    #[serde(default)]
    consumables: Vec<Consumable>,
    #[serde(default)]
    notes: String,
}

impl From<CharacterSeed> for Character {
    fn from(seed: CharacterSeed) -> Self {
        let mut character = Character::new(&seed.name, seed.kind);
        character.id = seed.id;
        character.notes = seed.notes;
        if let Some(ac) = seed.ac {
            character = character.with_ac(ac);
        }
        if let Some(hp) = seed.hp {
            character = character.with_hp_pool(hp);
        }
        for condition in &seed.conditions {
            character.add_condition(condition);
        }
        for consumable in seed.consumables {
            character.add_consumable(consumable);
        }
        character
    }
}

impl Character {
    /// Create a character with 1/1 hp and AC 10 (none for lair actors)
    pub fn new(name: &str, kind: CharacterKind) -> Self {
        let (ac, hp) = match kind {
            CharacterKind::Lair => (None, None),
            _ => (Some(DEFAULT_AC), Some(Pool::full(1))),
        };
        Self {
            id: generate_id(),
            name: name.to_string(),
            kind,
            ac,
            hp,
            conditions: IndexSet::new(),
            consumables: Vec::new(),
            notes: String::new(),
        }
    }

    /// Rebuild a character exactly as stored, keeping absent vitals absent
    pub fn restore(
        id: &str,
        name: &str,
        kind: CharacterKind,
        ac: Option<u32>,
        hp: Option<Pool>,
        notes: &str,
    ) -> Self {
        let lair = kind == CharacterKind::Lair;
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            ac: if lair { None } else { ac },
            hp: if lair { None } else { hp },
            conditions: IndexSet::new(),
            consumables: Vec::new(),
            notes: notes.to_string(),
        }
    }

    /// Full hit points at `max`
    pub fn with_hp(self, max: u32) -> Self {
        self.with_hp_pool(Pool::full(max))
    }

    pub fn with_hp_pool(mut self, hp: Pool) -> Self {
        if self.kind != CharacterKind::Lair {
            self.hp = Some(hp);
        }
        self
    }

    pub fn with_ac(mut self, ac: u32) -> Self {
        if self.kind != CharacterKind::Lair {
            self.ac = Some(ac);
        }
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> CharacterKind {
        self.kind
    }

    pub fn ac(&self) -> Option<u32> {
        self.ac
    }

    pub fn hp(&self) -> Option<Pool> {
        self.hp
    }

    pub fn take_damage(&mut self, amount: u32) {
        if let Some(hp) = self.hp.as_mut() {
            hp.drain(amount);
            debug!("{} takes {} damage ({})", self.name, amount, hp);
        }
    }

    pub fn heal(&mut self, amount: u32) {
        if let Some(hp) = self.hp.as_mut() {
            hp.restore(amount);
            debug!("{} heals {} ({})", self.name, amount, hp);
        }
    }

    /// Lair actors are never down
    pub fn is_down(&self) -> bool {
        self.hp.is_some_and(|hp| hp.is_empty())
    }

    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(String::as_str)
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.contains(condition)
    }

    pub fn add_condition(&mut self, condition: &str) {
        self.conditions.insert(condition.to_string());
    }

    pub fn remove_condition(&mut self, condition: &str) {
        self.conditions.shift_remove(condition);
    }

    pub fn consumables(&self) -> &[Consumable] {
        &self.consumables
    }

    pub fn add_consumable(&mut self, consumable: Consumable) {
        self.consumables.push(consumable);
    }

    /// Detach a consumable by id, handing it back if it was present
    pub fn remove_consumable(&mut self, consumable_id: &str) -> Option<Consumable> {
        let index = self
            .consumables
            .iter()
            .position(|c| c.id == consumable_id)?;
        Some(self.consumables.remove(index))
    }

    /// Find a consumable by exact id, falling back to exact name
    pub fn get_consumable(&self, identifier: &str) -> Option<&Consumable> {
        let index = self.consumable_index(identifier)?;
        self.consumables.get(index)
    }

    pub fn get_consumable_mut(&mut self, identifier: &str) -> Option<&mut Consumable> {
        let index = self.consumable_index(identifier)?;
        self.consumables.get_mut(index)
    }

    fn consumable_index(&self, identifier: &str) -> Option<usize> {
        self.consumables
            .iter()
            .position(|c| c.id == identifier)
            .or_else(|| self.consumables.iter().position(|c| c.name == identifier))
    }

    /// Spend charges from a consumable; an unknown consumable counts as failure
    pub fn use_consumable(&mut self, identifier: &str, amount: u32) -> bool {
        match self.get_consumable_mut(identifier) {
            Some(consumable) => consumable.use_charges(amount),
            None => false,
        }
    }

    /// Recover every rest-based consumable reset by `rest`
    pub fn rest(&mut self, rest: ResetCondition) -> usize {
        self.recover_matching(ResetType::Rest, rest)
    }

    /// Recover every time-based consumable reset by `time`
    pub fn time_recovery(&mut self, time: ResetCondition) -> usize {
        self.recover_matching(ResetType::Time, time)
    }

    fn recover_matching(&mut self, reset_type: ResetType, condition: ResetCondition) -> usize {
        let mut recovered = 0;
        for consumable in &mut self.consumables {
            if consumable.reset_type() == reset_type && consumable.reset_condition == condition {
                consumable.recover();
                recovered += 1;
            }
        }
        if recovered > 0 {
            debug!("{}: {} recovered {} consumables", self.name, condition, recovered);
        }
        recovered
    }

    pub fn consumables_display(&self) -> Vec<String> {
        self.consumables.iter().map(Consumable::display_string).collect()
    }

    pub fn display_color(&self) -> &'static str {
        self.kind.display_color()
    }

    /// `"current/max"`, or `"N/A"` without hit points
    pub fn hp_display(&self) -> String {
        match self.hp {
            Some(hp) => hp.to_string(),
            None => "N/A".to_string(),
        }
    }
}
