//! Roster: the characters currently in scope, keyed by id

use indexmap::IndexMap;

use super::character::{Character, CharacterId};

/// Insertion-ordered set of owned characters
#[derive(Debug, Clone, Default)]
pub struct Roster {
    characters: IndexMap<CharacterId, Character>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a character, returning the one it displaced
    pub fn insert(&mut self, character: Character) -> Option<Character> {
        self.characters.insert(character.id().to_string(), character)
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Character> {
        self.characters.shift_remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.characters.contains_key(id)
    }

    /// Look up by exact id, falling back to the first exact name match
    pub fn find(&self, identifier: &str) -> Option<&Character> {
        self.get(identifier)
            .or_else(|| self.characters.values().find(|c| c.name == identifier))
    }

    pub fn find_mut(&mut self, identifier: &str) -> Option<&mut Character> {
        let id = self.find(identifier)?.id().to_string();
        self.characters.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Character> {
        self.characters.values_mut()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

impl FromIterator<Character> for Roster {
    fn from_iter<I: IntoIterator<Item = Character>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for character in iter {
            roster.insert(character);
        }
        roster
    }
}
