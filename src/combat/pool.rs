//! Bounded current/max gauge shared by hit points and consumable charges
//!
//! A `Pool` always satisfies `0 <= current <= max` and `max >= 1`. Every
//! mutation clamps instead of failing.

use serde::{Deserialize, Serialize};

/// A current/max pair that can never leave `[0, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PoolRepr")]
pub struct Pool {
    current: u32,
    max: u32,
}

/// Accepted input shapes: a bare number or a `{current, max}` object
#[derive(Deserialize)]
#[serde(untagged)]
enum PoolRepr {
    Scalar(u32),
    Pair {
        #[serde(default)]
        current: Option<u32>,
        #[serde(default)]
        max: Option<u32>,
    },
}

impl From<PoolRepr> for Pool {
    fn from(repr: PoolRepr) -> Self {
        match repr {
            PoolRepr::Scalar(value) => Pool::full(value),
            PoolRepr::Pair { current, max } => Pool::from_parts(current, max),
        }
    }
}

impl From<u32> for Pool {
    fn from(value: u32) -> Self {
        Pool::full(value)
    }
}

impl From<(u32, u32)> for Pool {
    fn from((current, max): (u32, u32)) -> Self {
        Pool::new(current, max)
    }
}

impl Pool {
    /// A full pool: `current = max = value` (at least 1)
    pub fn full(value: u32) -> Self {
        let max = value.max(1);
        Self { current: max, max }
    }

    /// Explicit pair, clamped into range
    pub fn new(current: u32, max: u32) -> Self {
        let max = max.max(1);
        Self {
            current: current.min(max),
            max,
        }
    }

    /// Build from whichever halves are known; a missing half mirrors the
    /// other, and both missing gives `1/1`
    pub fn from_parts(current: Option<u32>, max: Option<u32>) -> Self {
        let current_or_max = current.or(max).unwrap_or(1);
        let max = max.or(current).unwrap_or(1);
        Self::new(current_or_max, max)
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    /// Whether `amount` can be spent without going below zero
    pub fn can_spend(&self, amount: u32) -> bool {
        self.current >= amount
    }

    /// Spend exactly `amount`, or nothing at all
    pub fn spend(&mut self, amount: u32) -> bool {
        if !self.can_spend(amount) {
            return false;
        }
        self.current -= amount;
        true
    }

    /// Remove up to `amount`, stopping at zero
    pub fn drain(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Add up to `amount`, stopping at max
    pub fn restore(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    pub fn refill(&mut self) {
        self.current = self.max;
    }
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}
