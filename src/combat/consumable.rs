//! Consumables: spell slots, per-rest abilities and limited-use items
//!
//! Each consumable is a charge [`Pool`] plus a reset policy describing which
//! rest or time-of-day event refills it, and how much.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ParseError;
use super::pool::Pool;
use crate::ids::generate_id;

/// Event that refills a consumable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetCondition {
    #[default]
    LongRest,
    ShortRest,
    Dawn,
    Dusk,
    Never,
}

/// Category of a reset condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetType {
    Rest,
    Time,
    Never,
}

impl ResetCondition {
    pub const ALL: [ResetCondition; 5] = [
        ResetCondition::LongRest,
        ResetCondition::ShortRest,
        ResetCondition::Dawn,
        ResetCondition::Dusk,
        ResetCondition::Never,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResetCondition::LongRest => "long_rest",
            ResetCondition::ShortRest => "short_rest",
            ResetCondition::Dawn => "dawn",
            ResetCondition::Dusk => "dusk",
            ResetCondition::Never => "never",
        }
    }

    pub fn reset_type(&self) -> ResetType {
        match self {
            ResetCondition::LongRest | ResetCondition::ShortRest => ResetType::Rest,
            ResetCondition::Dawn | ResetCondition::Dusk => ResetType::Time,
            ResetCondition::Never => ResetType::Never,
        }
    }
}

impl FromStr for ResetCondition {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long_rest" | "long" => Ok(ResetCondition::LongRest),
            "short_rest" | "short" => Ok(ResetCondition::ShortRest),
            "dawn" => Ok(ResetCondition::Dawn),
            "dusk" => Ok(ResetCondition::Dusk),
            "never" => Ok(ResetCondition::Never),
            _ => Err(ParseError::ResetCondition(s.to_string())),
        }
    }
}

impl std::fmt::Display for ResetCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many charges a reset restores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RecoveryRepr", into = "RecoveryRepr")]
pub enum RecoveryType {
    /// Back to max
    #[default]
    Full,
    /// Stand-in for a dice roll: recovers half of max, rounded up
    Dice,
    /// A fixed number of charges
    Fixed(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecoveryRepr {
    Amount(u32),
    Named(String),
}

impl TryFrom<RecoveryRepr> for RecoveryType {
    type Error = ParseError;

    fn try_from(repr: RecoveryRepr) -> Result<Self, Self::Error> {
        match repr {
            RecoveryRepr::Amount(n) => Ok(RecoveryType::Fixed(n)),
            RecoveryRepr::Named(s) => s.parse(),
        }
    }
}

impl From<RecoveryType> for RecoveryRepr {
    fn from(recovery: RecoveryType) -> Self {
        match recovery {
            RecoveryType::Fixed(n) => RecoveryRepr::Amount(n),
            other => RecoveryRepr::Named(other.to_string()),
        }
    }
}

impl FromStr for RecoveryType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(RecoveryType::Full),
            "dice" => Ok(RecoveryType::Dice),
            other => other
                .parse::<u32>()
                .map(RecoveryType::Fixed)
                .map_err(|_| ParseError::RecoveryType(s.to_string())),
        }
    }
}

impl std::fmt::Display for RecoveryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryType::Full => f.write_str("full"),
            RecoveryType::Dice => f.write_str("dice"),
            RecoveryType::Fixed(n) => write!(f, "{}", n),
        }
    }
}

/// A named charge pool with a reset policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    #[serde(default = "generate_id")]
    pub id: String,
    pub name: String,
    #[serde(default = "Consumable::default_charges")]
    pub charges: Pool,
    #[serde(default)]
    pub reset_condition: ResetCondition,
    #[serde(default, rename = "recovery_type")]
    pub recovery: RecoveryType,
    /// Extra recovery figure carried for dice or numeric policies
    #[serde(default)]
    pub recovery_amount: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
}

impl Consumable {
    /// Create a full consumable that resets on a long rest
    pub fn new(name: &str, max_charges: u32) -> Self {
        Self {
            id: generate_id(),
            name: name.to_string(),
            charges: Pool::full(max_charges),
            reset_condition: ResetCondition::default(),
            recovery: RecoveryType::default(),
            recovery_amount: None,
            description: String::new(),
            notes: String::new(),
        }
    }

    fn default_charges() -> Pool {
        Pool::full(1)
    }

    pub fn with_charges(mut self, charges: Pool) -> Self {
        self.charges = charges;
        self
    }

    pub fn resets_on(mut self, condition: ResetCondition) -> Self {
        self.reset_condition = condition;
        self
    }

    pub fn recovers(mut self, recovery: RecoveryType) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn reset_type(&self) -> ResetType {
        self.reset_condition.reset_type()
    }

    /// Spend `amount` charges; fails without change when too few remain
    pub fn use_charges(&mut self, amount: u32) -> bool {
        let used = self.charges.spend(amount);
        debug!(
            "Consumable {} use {}: {} ({})",
            self.name,
            amount,
            if used { "ok" } else { "insufficient" },
            self.charges
        );
        used
    }

    pub fn can_use(&self, amount: u32) -> bool {
        self.charges.can_spend(amount)
    }

    /// Restore charges according to the recovery policy
    pub fn recover(&mut self) {
        match self.recovery {
            RecoveryType::Full => self.charges.refill(),
            RecoveryType::Dice => self.charges.restore(self.charges.max().div_ceil(2)),
            RecoveryType::Fixed(n) => self.charges.restore(n),
        }
        debug!("Consumable {} recovered to {}", self.name, self.charges);
    }

    pub fn display_string(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Consumable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.charges)
    }
}
