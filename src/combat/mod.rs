//! Combat tracker core
//!
//! Implements the table-side bookkeeping for an encounter:
//! - Consumables with rest and time-of-day reset policies
//! - Characters with hit points, armor class and conditions
//! - Initiative order and round/turn advancement
//! - Broadcast recovery sweeps across a set of characters

mod character;
mod consumable;
mod error;
mod pool;
mod recovery;
mod roster;
mod tracker;

pub use character::{Character, CharacterId, CharacterKind, DEFAULT_AC, UNKNOWN_COLOR};
pub use consumable::{Consumable, RecoveryType, ResetCondition, ResetType};
pub use error::ParseError;
pub use pool::Pool;
pub use recovery::{trigger_rest, trigger_time_recovery};
pub use roster::Roster;
pub use tracker::{Combat, InitiativeEntry, Participant};
