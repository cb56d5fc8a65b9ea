//! Initiative tracker
//!
//! A `Combat` keeps its participants sorted by initiative (highest first,
//! ties in join order) and walks a round/turn cursor over them.
//!
//! The turn cursor follows the acting character, not a slot: when the
//! roster changes mid-combat the index is recomputed so the same character
//! keeps the turn.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::character::{Character, CharacterId, CharacterKind, UNKNOWN_COLOR};
use super::roster::Roster;
use crate::ids::generate_id;

/// A character's seat in a combat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Non-owning reference into a [`Roster`]
    pub character_id: CharacterId,
    pub initiative: i32,
    pub is_active: bool,
    pub joined_round: u32,
}

/// Read-only display row for one participant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitiativeEntry {
    pub character_id: CharacterId,
    pub name: String,
    /// `None` when the character is not in the roster
    #[serde(rename = "type")]
    pub kind: Option<CharacterKind>,
    pub initiative: i32,
    pub hp: String,
    pub conditions: String,
    pub consumables: String,
    /// Participant is flagged active and the character is not down
    pub is_active: bool,
    pub is_current: bool,
    pub color: &'static str,
}

/// Turn-based combat encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CombatSnapshot")]
pub struct Combat {
    id: String,
    pub name: Option<String>,
    participants: Vec<Participant>,
    current_round: u32,
    current_turn_index: usize,
    is_active: bool,
}

/// Serialized form, rebuilt through [`Combat::restore`]
#[derive(Deserialize)]
struct CombatSnapshot {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    participants: Vec<Participant>,
    #[serde(default)]
    current_round: u32,
    #[serde(default)]
    current_turn_index: usize,
    #[serde(default)]
    is_active: bool,
}

impl From<CombatSnapshot> for Combat {
    fn from(snapshot: CombatSnapshot) -> Self {
        Combat::restore(
            &snapshot.id,
            snapshot.name,
            snapshot.participants,
            snapshot.current_round,
            snapshot.current_turn_index,
            snapshot.is_active,
        )
    }
}

impl Default for Combat {
    fn default() -> Self {
        Self::new()
    }
}

impl Combat {
    /// Create an empty, inactive combat
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            name: None,
            participants: Vec::new(),
            current_round: 0,
            current_turn_index: 0,
            is_active: false,
        }
    }

    pub fn named(name: &str) -> Self {
        let mut combat = Self::new();
        combat.name = Some(name.to_string());
        combat
    }

    /// Rebuild a stored combat; participants are re-sorted and an
    /// out-of-range cursor is pulled back to the top of the order
    pub fn restore(
        id: &str,
        name: Option<String>,
        participants: Vec<Participant>,
        current_round: u32,
        current_turn_index: usize,
        is_active: bool,
    ) -> Self {
        let mut combat = Self {
            id: id.to_string(),
            name,
            participants,
            current_round,
            current_turn_index,
            is_active,
        };
        combat.sort_by_initiative();

        if combat.participants.is_empty() {
            if combat.is_active {
                warn!("Combat {} stored as active with no participants", combat.id);
            }
            combat.is_active = false;
            combat.current_turn_index = 0;
        } else if combat.current_turn_index >= combat.participants.len() {
            warn!(
                "Combat {} turn index {} out of range, resetting",
                combat.id, combat.current_turn_index
            );
            combat.current_turn_index = 0;
        }
        combat
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, character_id: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.character_id == character_id)
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Seat a character, or update its initiative if already seated
    pub fn add_character(&mut self, character: &Character, initiative: i32) {
        let acting = self.current_character_id().map(str::to_string);

        match self
            .participants
            .iter_mut()
            .find(|p| p.character_id == character.id())
        {
            Some(existing) => existing.initiative = initiative,
            None => self.participants.push(Participant {
                character_id: character.id().to_string(),
                initiative,
                is_active: true,
                joined_round: self.current_round.max(1),
            }),
        }
        self.sort_by_initiative();

        if let Some(acting) = acting {
            if let Some(index) = self.position_of(&acting) {
                self.current_turn_index = index;
            }
        }
        debug!(
            "Combat {}: {} joins at initiative {}",
            self.id, character.name, initiative
        );
    }

    /// Unseat a character; the character itself is untouched
    pub fn remove_character(&mut self, character_id: &str) -> bool {
        let Some(removed) = self.position_of(character_id) else {
            return false;
        };
        self.participants.remove(removed);

        if self.participants.is_empty() {
            if self.is_active {
                info!("Combat {}: last participant left, ending", self.id);
                self.is_active = false;
            }
            self.current_turn_index = 0;
            return true;
        }

        if !self.is_active {
            self.current_turn_index = 0;
        } else if removed < self.current_turn_index {
            self.current_turn_index -= 1;
        } else if removed == self.current_turn_index
            && self.current_turn_index >= self.participants.len()
        {
            // The last actor of the round left; the next one opens a new round
            self.next_round();
        }
        true
    }

    /// Flag a participant as acting or sitting out
    pub fn set_participant_active(&mut self, character_id: &str, active: bool) -> bool {
        match self
            .participants
            .iter_mut()
            .find(|p| p.character_id == character_id)
        {
            Some(participant) => {
                participant.is_active = active;
                true
            }
            None => false,
        }
    }

    /// Stable: equal initiatives keep their relative order
    fn sort_by_initiative(&mut self) {
        self.participants.sort_by(|a, b| b.initiative.cmp(&a.initiative));
    }

    fn position_of(&self, character_id: &str) -> Option<usize> {
        self.participants
            .iter()
            .position(|p| p.character_id == character_id)
    }

    /// Begin round 1 at the top of the order; refuses an empty combat
    pub fn start(&mut self) -> bool {
        if self.participants.is_empty() {
            return false;
        }
        self.is_active = true;
        self.current_round = 1;
        self.current_turn_index = 0;
        info!(
            "Combat {} started with {} participants",
            self.id,
            self.participants.len()
        );
        true
    }

    pub fn end(&mut self) {
        self.is_active = false;
        info!("Combat {} ended after round {}", self.id, self.current_round);
    }

    /// Advance the cursor, rolling over into the next round
    pub fn next_turn(&mut self) {
        if !self.is_active {
            return;
        }
        self.current_turn_index += 1;
        if self.current_turn_index >= self.participants.len() {
            self.next_round();
        }
    }

    fn next_round(&mut self) {
        self.current_round += 1;
        self.current_turn_index = 0;
        debug!("Combat {}: round {}", self.id, self.current_round);
    }

    pub fn current_participant(&self) -> Option<&Participant> {
        if !self.is_active {
            return None;
        }
        self.participants.get(self.current_turn_index)
    }

    pub fn current_character_id(&self) -> Option<&str> {
        self.current_participant().map(|p| p.character_id.as_str())
    }

    /// The character whose turn it is, resolved through `roster`
    pub fn current_character<'r>(&self, roster: &'r Roster) -> Option<&'r Character> {
        self.current_character_id().and_then(|id| roster.get(id))
    }

    /// Display rows in turn order
    pub fn initiative_order(&self, roster: &Roster) -> Vec<InitiativeEntry> {
        self.participants
            .iter()
            .enumerate()
            .map(|(index, participant)| {
                let is_current = self.is_active && index == self.current_turn_index;
                match roster.get(&participant.character_id) {
                    Some(character) => InitiativeEntry {
                        character_id: participant.character_id.clone(),
                        name: character.name.clone(),
                        kind: Some(character.kind()),
                        initiative: participant.initiative,
                        hp: character.hp_display(),
                        conditions: character.conditions().collect::<Vec<_>>().join(", "),
                        consumables: character.consumables_display().join(", "),
                        is_active: participant.is_active && !character.is_down(),
                        is_current,
                        color: character.display_color(),
                    },
                    None => InitiativeEntry {
                        character_id: participant.character_id.clone(),
                        name: participant.character_id.clone(),
                        kind: None,
                        initiative: participant.initiative,
                        hp: "N/A".to_string(),
                        conditions: String::new(),
                        consumables: String::new(),
                        is_active: participant.is_active,
                        is_current,
                        color: UNKNOWN_COLOR,
                    },
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::Consumable;

    /// Aragorn 17, Legolas 22, Orc 12, Cave Collapse 20
    fn party() -> (Roster, Combat) {
        let aragorn = Character::new("Aragorn", CharacterKind::Pc).with_hp(58).with_ac(18);
        let legolas = Character::new("Legolas", CharacterKind::Pc).with_hp(45).with_ac(16);
        let orc = Character::new("Orc Chieftain", CharacterKind::Enemy)
            .with_hp(85)
            .with_ac(15);
        let lair = Character::new("Cave Collapse", CharacterKind::Lair);

        let mut combat = Combat::named("Cave Ambush");
        combat.add_character(&aragorn, 17);
        combat.add_character(&legolas, 22);
        combat.add_character(&orc, 12);
        combat.add_character(&lair, 20);

        let roster = vec![aragorn, legolas, orc, lair].into_iter().collect();
        (roster, combat)
    }

    fn names(combat: &Combat, roster: &Roster) -> Vec<String> {
        combat
            .initiative_order(roster)
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    fn id_of(roster: &Roster, name: &str) -> String {
        roster.find(name).unwrap().id().to_string()
    }

    #[test]
    fn test_sorted_descending() {
        let (roster, combat) = party();
        let initiatives: Vec<i32> = combat.participants().iter().map(|p| p.initiative).collect();
        assert_eq!(initiatives, vec![22, 20, 17, 12]);
        assert_eq!(
            names(&combat, &roster),
            vec!["Legolas", "Cave Collapse", "Aragorn", "Orc Chieftain"]
        );
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let a = Character::new("A", CharacterKind::Pc);
        let b = Character::new("B", CharacterKind::Pc);
        let c = Character::new("C", CharacterKind::Pc);
        let mut combat = Combat::new();
        combat.add_character(&a, 10);
        combat.add_character(&b, 15);
        combat.add_character(&c, 10);
        let roster: Roster = vec![a, b, c].into_iter().collect();
        assert_eq!(names(&combat, &roster), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_start_requires_participants() {
        let mut combat = Combat::new();
        assert!(!combat.start());
        assert!(!combat.is_active());
        assert_eq!(combat.current_round(), 0);

        let (roster, mut combat) = party();
        assert!(combat.current_character(&roster).is_none());
        assert!(combat.start());
        assert_eq!(combat.current_round(), 1);
        assert_eq!(combat.current_turn_index(), 0);
        assert_eq!(combat.current_character(&roster).unwrap().name, "Legolas");
    }

    #[test]
    fn test_full_cycle_advances_round() {
        let (roster, mut combat) = party();
        combat.start();
        for expected in ["Cave Collapse", "Aragorn", "Orc Chieftain"] {
            combat.next_turn();
            assert_eq!(combat.current_character(&roster).unwrap().name, expected);
            assert_eq!(combat.current_round(), 1);
        }
        combat.next_turn();
        assert_eq!(combat.current_round(), 2);
        assert_eq!(combat.current_turn_index(), 0);
        assert_eq!(combat.current_character(&roster).unwrap().name, "Legolas");

        for _ in 0..combat.participants().len() {
            combat.next_turn();
        }
        assert_eq!(combat.current_round(), 3);
        assert_eq!(combat.current_turn_index(), 0);
    }

    #[test]
    fn test_next_turn_inactive_is_noop() {
        let (_, mut combat) = party();
        combat.next_turn();
        assert_eq!(combat.current_turn_index(), 0);
        assert_eq!(combat.current_round(), 0);

        combat.start();
        combat.next_turn();
        combat.end();
        combat.next_turn();
        assert_eq!(combat.current_turn_index(), 1);
        assert!(combat.current_participant().is_none());
    }

    #[test]
    fn test_restart_after_end() {
        let (roster, mut combat) = party();
        combat.start();
        combat.next_turn();
        combat.end();
        assert!(combat.start());
        assert_eq!(combat.current_round(), 1);
        assert_eq!(combat.current_character(&roster).unwrap().name, "Legolas");
    }

    #[test]
    fn test_add_mid_combat_keeps_current_actor() {
        let (mut roster, mut combat) = party();
        combat.start();
        combat.next_turn();
        combat.next_turn();
        assert_eq!(combat.current_character(&roster).unwrap().name, "Aragorn");

        let troll = Character::new("Troll", CharacterKind::Enemy).with_hp(84);
        combat.add_character(&troll, 25);
        roster.insert(troll);

        assert_eq!(combat.current_turn_index(), 3);
        assert_eq!(combat.current_character(&roster).unwrap().name, "Aragorn");
        assert_eq!(combat.participant(&id_of(&roster, "Troll")).unwrap().joined_round, 1);
    }

    #[test]
    fn test_readd_updates_initiative() {
        let (roster, mut combat) = party();
        let orc = roster.find("Orc Chieftain").unwrap();
        combat.add_character(orc, 30);
        assert_eq!(combat.participants().len(), 4);
        assert_eq!(names(&combat, &roster)[0], "Orc Chieftain");
    }

    #[test]
    fn test_remove_before_current_shifts_cursor() {
        let (roster, mut combat) = party();
        combat.start();
        combat.next_turn();
        combat.next_turn();

        assert!(combat.remove_character(&id_of(&roster, "Legolas")));
        assert_eq!(combat.current_character(&roster).unwrap().name, "Aragorn");
        assert!(roster.find("Legolas").is_some());
    }

    #[test]
    fn test_remove_current_passes_turn() {
        let (roster, mut combat) = party();
        combat.start();
        combat.next_turn();

        combat.remove_character(&id_of(&roster, "Cave Collapse"));
        assert_eq!(combat.current_character(&roster).unwrap().name, "Aragorn");
        assert_eq!(combat.current_round(), 1);

        // Removing the last actor of the round wraps into the next round
        combat.next_turn();
        combat.remove_character(&id_of(&roster, "Orc Chieftain"));
        assert_eq!(combat.current_round(), 2);
        assert_eq!(combat.current_character(&roster).unwrap().name, "Legolas");
    }

    #[test]
    fn test_remove_unknown_and_last() {
        let mut combat = Combat::new();
        let solo = Character::new("Solo", CharacterKind::Pc);
        combat.add_character(&solo, 5);
        combat.start();

        assert!(!combat.remove_character("nobody"));
        assert!(combat.remove_character(solo.id()));
        assert!(!combat.is_active());
        assert!(combat.participants().is_empty());
    }

    #[test]
    fn test_initiative_order_entries() {
        let (mut roster, mut combat) = party();
        combat.start();

        let orc_id = id_of(&roster, "Orc Chieftain");
        let orc = roster.get_mut(&orc_id).unwrap();
        orc.take_damage(85);
        orc.add_condition("Prone");
        orc.add_condition("Frightened");

        let aragorn = roster.find_mut("Aragorn").unwrap();
        aragorn.add_consumable(Consumable::new("Second Wind", 1));

        let order = combat.initiative_order(&roster);
        assert!(order[0].is_current);
        assert_eq!(order[0].color, "#4CAF50");
        assert_eq!(order[1].hp, "N/A");
        assert_eq!(order[1].color, "#FF9800");
        assert!(order[1].is_active);
        assert_eq!(order[2].consumables, "Second Wind (1/1)");
        assert_eq!(order[3].hp, "0/85");
        assert_eq!(order[3].conditions, "Prone, Frightened");
        assert!(!order[3].is_active);
        assert_eq!(order[3].color, "#F44336");
    }

    #[test]
    fn test_initiative_order_unknown_character() {
        let (mut roster, mut combat) = party();
        let orc_id = id_of(&roster, "Orc Chieftain");
        roster.remove(&orc_id);
        combat.set_participant_active(&orc_id, false);

        let order = combat.initiative_order(&roster);
        let missing = order.last().unwrap();
        assert_eq!(missing.kind, None);
        assert_eq!(missing.color, UNKNOWN_COLOR);
        assert!(!missing.is_active);
        assert!(!missing.is_current);
    }

    #[test]
    fn test_restore_normalizes() {
        let participants = vec![
            Participant {
                character_id: "a".into(),
                initiative: 3,
                is_active: true,
                joined_round: 1,
            },
            Participant {
                character_id: "b".into(),
                initiative: 19,
                is_active: true,
                joined_round: 2,
            },
        ];
        let combat = Combat::restore("c1", None, participants, 4, 7, true);
        assert_eq!(combat.participants()[0].character_id, "b");
        assert_eq!(combat.current_turn_index(), 0);
        assert!(combat.is_active());

        let empty = Combat::restore("c2", Some("Empty".into()), Vec::new(), 2, 0, true);
        assert!(!empty.is_active());
    }

    #[test]
    fn test_deserialize_restores_order_and_cursor() {
        let json = r#"{
            "id": "c3",
            "name": "Ford",
            "participants": [
                {"character_id": "a", "initiative": 5, "is_active": true, "joined_round": 1},
                {"character_id": "b", "initiative": 14, "is_active": true, "joined_round": 1}
            ],
            "current_round": 2,
            "current_turn_index": 9,
            "is_active": true
        }"#;
        let combat: Combat = serde_json::from_str(json).unwrap();
        assert_eq!(combat.participants()[0].character_id, "b");
        assert_eq!(combat.current_turn_index(), 0);
        assert_eq!(combat.current_character_id(), Some("b"));

        let round_trip: Combat =
            serde_json::from_str(&serde_json::to_string(&combat).unwrap()).unwrap();
        assert_eq!(round_trip, combat);
    }
}
