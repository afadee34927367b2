use crate::error::{Result, TrainerError};
use crate::history::{ends_with_masked_streak, HistoryEntry};
use crate::layout::{KeyId, Layout};
use crate::mastery::{MaskPolicy, MasteryTracker, STREAK_TO_HIDE};
use crate::mode::GameMode;

/// Trailing correct presses on masked keys needed to win once every key is masked
pub const STREAK_TO_WIN: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub policy: MaskPolicy,
    pub streak_to_hide: usize,
    pub streak_to_win: usize,
    /// Fixed RNG seed for reproducible layouts and prompts
    pub seed: Option<u64>,
    /// Priority order for the global-order policy; unlisted keys follow in canonical order
    pub priority: Vec<KeyId>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: MaskPolicy::default(),
            streak_to_hide: STREAK_TO_HIDE,
            streak_to_win: STREAK_TO_WIN,
            seed: None,
            priority: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.streak_to_hide == 0 {
            return Err(TrainerError::InvalidConfiguration(
                "streak to hide must be at least 1".into(),
            ));
        }
        if self.streak_to_win == 0 {
            return Err(TrainerError::InvalidConfiguration(
                "streak to win must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Mask-vector indices of `layout` in global-order priority.
    pub fn priority_order(&self, layout: &Layout) -> Vec<usize> {
        let mut order: Vec<usize> = Vec::with_capacity(layout.len());
        let listed = self.priority.iter().filter_map(|key| layout.index_of(*key));
        for idx in listed.chain(0..layout.len()) {
            if !order.contains(&idx) {
                order.push(idx);
            }
        }
        order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No layout yet, waiting for a mode
    Idle,
    Active,
    /// Terminal until a new mode is selected
    Won,
}

/// Everything that belongs to one run over one layout
#[derive(Debug)]
pub struct SessionState {
    pub mode: Option<GameMode>,
    pub letter_pool: Vec<char>,
    pub layout: Layout,
    pub mask: Vec<bool>,
    pub expected: (KeyId, char),
    pub history: Vec<HistoryEntry>,
    pub tracker: Box<dyn MasteryTracker>,
    pub correct: usize,
    pub incorrect: usize,
}

impl SessionState {
    pub fn pressed_letter(&self) -> Option<char> {
        self.history.last().and_then(|entry| entry.actual)
    }

    /// Share of masked keys, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.mask.is_empty() {
            return 0.0;
        }
        self.mask.iter().filter(|&&bit| bit).count() as f64 / self.mask.len() as f64
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            return 0.0;
        }
        ((self.correct as f64 / total as f64) * 100.0).round()
    }
}

/// Every key masked and the last `streak_to_win` presses hit masked keys.
pub fn is_won(mask: &[bool], history: &[HistoryEntry], streak_to_win: usize) -> bool {
    !mask.is_empty()
        && mask.iter().all(|&bit| bit)
        && ends_with_masked_streak(history, streak_to_win)
}
