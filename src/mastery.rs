use crate::error::{Result, TrainerError};
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consecutive correct presses on a key before its letter is hidden
pub const STREAK_TO_HIDE: usize = 3;

/// Which rule decides when keys become masked
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MaskPolicy {
    /// Each key is masked after its own streak of correct presses
    #[default]
    KeyStreak,
    /// A single pointer walks a priority order of keys, forward on hits and back on misses
    GlobalOrder,
}

impl MaskPolicy {
    pub fn build(self, key_count: usize, streak_to_hide: usize) -> Box<dyn MasteryTracker> {
        match self {
            MaskPolicy::KeyStreak => Box::new(KeyStreakTracker::new(streak_to_hide)),
            MaskPolicy::GlobalOrder => Box::new(GlobalOrderTracker::new(key_count)),
        }
    }
}

/// Updates the mask vector after each accepted press
pub trait MasteryTracker: fmt::Debug {
    /// `history` already contains the entry for this press as its last element.
    fn record(
        &mut self,
        mask: &mut [bool],
        history: &[HistoryEntry],
        key_index: usize,
        pressed_letter: char,
    );
}

/// Is the key with `pressed_letter` mastered, judged on its last
/// `streak_to_hide` presses only?
pub fn key_streak_mastered(
    history: &[HistoryEntry],
    pressed_letter: char,
    streak_to_hide: usize,
) -> bool {
    let window: Vec<&HistoryEntry> = history
        .iter()
        .rev()
        .filter(|entry| entry.actual == Some(pressed_letter))
        .take(streak_to_hide)
        .collect();

    window.len() == streak_to_hide && window.iter().all(|entry| entry.is_correct())
}

#[derive(Debug, Clone)]
pub struct KeyStreakTracker {
    streak_to_hide: usize,
}

impl KeyStreakTracker {
    pub fn new(streak_to_hide: usize) -> Self {
        Self { streak_to_hide }
    }
}

impl MasteryTracker for KeyStreakTracker {
    fn record(
        &mut self,
        mask: &mut [bool],
        history: &[HistoryEntry],
        key_index: usize,
        pressed_letter: char,
    ) {
        if let Some(bit) = mask.get_mut(key_index) {
            *bit = key_streak_mastered(history, pressed_letter, self.streak_to_hide);
        }
    }
}

/// Masks a prefix of `order`; the prefix grows on a correct press and
/// shrinks on a miss, whichever key was involved.
#[derive(Debug, Clone)]
pub struct GlobalOrderTracker {
    order: Vec<usize>,
    pointer: usize,
}

impl GlobalOrderTracker {
    /// Use the canonical key order as the priority order.
    pub fn new(key_count: usize) -> Self {
        Self {
            order: (0..key_count).collect(),
            pointer: 0,
        }
    }

    /// `order` must be a permutation of `0..order.len()`.
    pub fn with_order(order: Vec<usize>) -> Result<Self> {
        let mut sorted = order.clone();
        sorted.sort_unstable();
        if sorted.iter().enumerate().any(|(i, &idx)| i != idx) {
            return Err(TrainerError::InvalidConfiguration(format!(
                "priority order {order:?} is not a permutation of the key indices"
            )));
        }
        Ok(Self { order, pointer: 0 })
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }
}

impl MasteryTracker for GlobalOrderTracker {
    fn record(
        &mut self,
        mask: &mut [bool],
        history: &[HistoryEntry],
        _key_index: usize,
        _pressed_letter: char,
    ) {
        let correct = history.last().is_some_and(HistoryEntry::is_correct);
        self.pointer = if correct {
            (self.pointer + 1).min(self.order.len())
        } else {
            self.pointer.saturating_sub(1)
        };

        for (rank, &idx) in self.order.iter().enumerate() {
            if let Some(bit) = mask.get_mut(idx) {
                *bit = rank < self.pointer;
            }
        }
    }
}
