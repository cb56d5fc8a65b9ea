//! Out-of-band recovery sweeps ("the party takes a long rest", "dawn breaks")

use tracing::debug;

use super::character::Character;
use super::consumable::ResetCondition;

/// Apply a rest to every character; returns the number of consumables recovered
pub fn trigger_rest<'a, I>(characters: I, rest: ResetCondition) -> usize
where
    I: IntoIterator<Item = &'a mut Character>,
{
    let recovered: usize = characters.into_iter().map(|c| c.rest(rest)).sum();
    debug!("{}: {} consumables recovered", rest, recovered);
    recovered
}

/// Apply a time-of-day event to every character
pub fn trigger_time_recovery<'a, I>(characters: I, time: ResetCondition) -> usize
where
    I: IntoIterator<Item = &'a mut Character>,
{
    let recovered: usize = characters.into_iter().map(|c| c.time_recovery(time)).sum();
    debug!("{}: {} consumables recovered", time, recovered);
    recovered
}
