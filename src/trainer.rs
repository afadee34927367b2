use crate::error::{Result, TrainerError};
use crate::history::{trailing, HistoryEntry};
use crate::layout::{self, KeyId, Layout};
use crate::mastery::{GlobalOrderTracker, MaskPolicy, MasteryTracker};
use crate::mode::GameMode;
use crate::picker;
use crate::session::{is_won, Phase, SessionConfig, SessionState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// What a key press did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// Unmapped key, or no session accepting presses
    Ignored,
    Correct,
    Incorrect,
    /// This press completed the session; reported once
    Won,
}

/// Read-only view handed to the renderer
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: Phase,
    pub mode: Option<GameMode>,
    pub layout: Option<&'a Layout>,
    pub mask: &'a [bool],
    pub expected: Option<char>,
    pub pressed: Option<char>,
    pub history: &'a [HistoryEntry],
    pub progress: f64,
    pub accuracy: f64,
}

impl Snapshot<'_> {
    pub fn won(&self) -> bool {
        self.phase == Phase::Won
    }
}

/// The trial loop: owns the layout, mask, prompt and history of the current run
#[derive(Debug)]
pub struct Trainer {
    pub session_config: SessionConfig,
    phase: Phase,
    state: Option<SessionState>,
    rng: StdRng,
}

impl Trainer {
    pub fn new(session_config: SessionConfig) -> Result<Self> {
        session_config.validate()?;
        let rng = match session_config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            session_config,
            phase: Phase::Idle,
            state: None,
            rng,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.state.as_ref().and_then(|s| s.mode)
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.state.as_ref().map(|s| &s.layout)
    }

    pub fn mask(&self) -> &[bool] {
        self.state.as_ref().map(|s| s.mask.as_slice()).unwrap_or(&[])
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.state.as_ref().map(|s| s.history.as_slice()).unwrap_or(&[])
    }

    /// The prompted key and its letter
    pub fn expected(&self) -> Option<(KeyId, char)> {
        self.state.as_ref().map(|s| s.expected)
    }

    /// The prompted letter, checked against the current layout.
    pub fn expected_letter(&self) -> Result<Option<char>> {
        let Some(state) = &self.state else {
            return Ok(None);
        };
        let (key, letter) = state.expected;
        if state.layout.letter_of(key) != Some(letter) {
            warn!(%key, %letter, "prompt is stale");
            return Err(TrainerError::InconsistentLayout(format!(
                "prompted letter {letter} is not on key {key}"
            )));
        }
        Ok(Some(letter))
    }

    pub fn pressed_letter(&self) -> Option<char> {
        self.state.as_ref().and_then(SessionState::pressed_letter)
    }

    pub fn progress(&self) -> f64 {
        self.state.as_ref().map_or(0.0, SessionState::progress)
    }

    pub fn is_won(&self) -> bool {
        self.phase == Phase::Won
    }

    /// Drop the current session and wait for a new mode.
    pub fn reset(&mut self) {
        debug!("session reset");
        self.state = None;
        self.phase = Phase::Idle;
    }

    /// Start a fresh session on the key set of `mode`.
    pub fn select_mode(&mut self, mode: GameMode) -> Result<()> {
        info!(%mode, "mode selected");
        self.start(Some(mode), &mode.keys(), &mode.letter_pool())
    }

    /// Start a fresh session on an arbitrary key set.
    ///
    /// On error the previous session, if any, is left untouched.
    pub fn start(
        &mut self,
        mode: Option<GameMode>,
        active_keys: &[KeyId],
        letter_pool: &[char],
    ) -> Result<()> {
        let layout = layout::generate(active_keys, letter_pool, &mut self.rng)?;
        self.install(mode, letter_pool.to_vec(), layout)
    }

    /// Shuffle a new layout for the current key set. Mask and history are discarded.
    pub fn regenerate_layout(&mut self) -> Result<()> {
        let (mode, keys, pool) = match &self.state {
            Some(state) => (
                state.mode,
                state.layout.keys().collect::<Vec<_>>(),
                state.letter_pool.clone(),
            ),
            None => {
                return Err(TrainerError::InconsistentLayout(
                    "no layout to regenerate".into(),
                ))
            }
        };
        self.start(mode, &keys, &pool)
    }

    /// Install a layout produced elsewhere. The current prompt is kept if its
    /// key still carries the same letter, otherwise a new one is picked.
    pub fn replace_layout(&mut self, new_layout: Layout) -> Result<()> {
        let (mode, pool, previous) = match &self.state {
            Some(state) => (state.mode, state.letter_pool.clone(), Some(state.expected)),
            None => (None, new_layout.letters().collect(), None),
        };
        // A layout over a different key set no longer belongs to the mode,
        // and neither does the mode's letter pool
        let kept_mode = mode.filter(|m| new_layout.keys().eq(m.keys()));
        let pool_fits = new_layout.letters().all(|c| pool.contains(&c));
        let pool = if kept_mode == mode && pool_fits {
            pool
        } else {
            new_layout.letters().collect()
        };
        self.install(kept_mode, pool, new_layout)?;

        if let (Some(state), Some((key, letter))) = (self.state.as_mut(), previous) {
            if state.layout.letter_of(key) == Some(letter) {
                state.expected = (key, letter);
            }
        }
        Ok(())
    }

    fn install(
        &mut self,
        mode: Option<GameMode>,
        letter_pool: Vec<char>,
        layout: Layout,
    ) -> Result<()> {
        let mask = vec![false; layout.len()];
        let expected = picker::pick(&layout, &mask, None, &mut self.rng)?;
        let tracker = self.build_tracker(&layout)?;

        debug!(keys = layout.len(), expected = %expected.1, "layout installed");
        self.state = Some(SessionState {
            mode,
            letter_pool,
            layout,
            mask,
            expected,
            history: Vec::new(),
            tracker,
            correct: 0,
            incorrect: 0,
        });
        self.phase = Phase::Active;
        Ok(())
    }

    fn build_tracker(&self, layout: &Layout) -> Result<Box<dyn MasteryTracker>> {
        let cfg = &self.session_config;
        match cfg.policy {
            MaskPolicy::GlobalOrder if !cfg.priority.is_empty() => Ok(Box::new(
                GlobalOrderTracker::with_order(cfg.priority_order(layout))?,
            )),
            policy => Ok(policy.build(layout.len(), cfg.streak_to_hide)),
        }
    }

    /// Feed one physical key press into the session.
    pub fn press(&mut self, key: KeyId) -> Result<PressOutcome> {
        if self.phase != Phase::Active {
            return Ok(PressOutcome::Ignored);
        }
        let state = self.state.as_mut().ok_or_else(|| {
            TrainerError::InconsistentLayout("active session without a layout".into())
        })?;

        let Some(key_index) = state.layout.index_of(key) else {
            debug!(%key, "ignoring unmapped key");
            return Ok(PressOutcome::Ignored);
        };
        let actual = state.layout.entries()[key_index].1;
        let (expected_key, expected_letter) = state.expected;
        let Some(expected_index) = state.layout.index_of(expected_key) else {
            warn!(%expected_key, "prompted key missing from layout");
            return Err(TrainerError::InconsistentLayout(format!(
                "prompted key {expected_key} is not in the layout"
            )));
        };

        let masked = state.mask[expected_index];
        state
            .history
            .push(HistoryEntry::new(expected_letter, actual, masked));
        state
            .tracker
            .record(&mut state.mask, &state.history, key_index, actual);

        let correct = actual == expected_letter;
        if correct {
            state.correct += 1;
            state.expected = picker::pick(&state.layout, &state.mask, Some(key), &mut self.rng)?;
        } else {
            state.incorrect += 1;
        }
        debug!(
            %key,
            expected = %expected_letter,
            actual = %actual,
            correct,
            masked = state.mask[key_index],
            "key press"
        );

        if is_won(&state.mask, &state.history, self.session_config.streak_to_win) {
            info!(presses = state.history.len(), "session won");
            self.phase = Phase::Won;
            return Ok(PressOutcome::Won);
        }

        Ok(if correct {
            PressOutcome::Correct
        } else {
            PressOutcome::Incorrect
        })
    }

    /// Render view with at most `history_window` trailing history entries.
    pub fn snapshot(&self, history_window: usize) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            mode: self.mode(),
            layout: self.layout(),
            mask: self.mask(),
            expected: self.expected_letter().unwrap_or(None),
            pressed: self.pressed_letter(),
            history: trailing(self.history(), history_window),
            progress: self.progress(),
            accuracy: self.state.as_ref().map_or(0.0, SessionState::accuracy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn seeded(seed: u64) -> Trainer {
        Trainer::new(SessionConfig {
            seed: Some(seed),
            ..SessionConfig::default()
        })
        .unwrap()
    }

    fn keys10() -> Vec<KeyId> {
        ["K1", "K2", "K3", "K4", "K5", "K6", "K7", "K8", "K9", "K10"]
            .into_iter()
            .map(KeyId::new)
            .collect()
    }

    fn letters10() -> Vec<char> {
        ('a'..='j').collect()
    }

    /// Key that is currently prompted
    fn expected_key(trainer: &Trainer) -> KeyId {
        trainer.expected().unwrap().0
    }

    /// Some mapped key other than the prompted one
    fn wrong_key(trainer: &Trainer) -> KeyId {
        let expected = expected_key(trainer);
        trainer
            .layout()
            .unwrap()
            .keys()
            .find(|k| *k != expected)
            .unwrap()
    }

    #[test]
    fn test_new_trainer_is_idle() {
        let trainer = seeded(1);
        assert_eq!(trainer.phase(), Phase::Idle);
        assert!(trainer.layout().is_none());
        assert!(trainer.mask().is_empty());
        assert_eq!(trainer.expected_letter(), Ok(None));
        assert_eq!(trainer.progress(), 0.0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = Trainer::new(SessionConfig {
            streak_to_win: 0,
            ..SessionConfig::default()
        })
        .unwrap_err();
        assert_matches!(err, TrainerError::InvalidConfiguration(_));
    }

    #[test]
    fn test_press_while_idle_is_ignored() {
        let mut trainer = seeded(1);
        assert_eq!(trainer.press(KeyId::new("KeyA")), Ok(PressOutcome::Ignored));
        assert_eq!(trainer.phase(), Phase::Idle);
    }

    #[test]
    fn test_select_mode_enters_active() {
        let mut trainer = seeded(2);
        trainer.select_mode(GameMode::HomeRow).unwrap();

        assert_eq!(trainer.phase(), Phase::Active);
        assert_eq!(trainer.mode(), Some(GameMode::HomeRow));
        assert_eq!(trainer.mask(), &[false; 10]);
        assert!(trainer.history().is_empty());
        let (key, letter) = trainer.expected().unwrap();
        assert_eq!(trainer.layout().unwrap().letter_of(key), Some(letter));
    }

    #[test]
    fn test_start_with_small_pool_stays_idle() {
        let mut trainer = seeded(2);
        let err = trainer.start(None, &keys10(), &['a', 'b']).unwrap_err();
        assert_matches!(err, TrainerError::InvalidConfiguration(_));
        assert_eq!(trainer.phase(), Phase::Idle);
    }

    #[test]
    fn test_start_with_no_keys_is_empty_candidate_set() {
        let mut trainer = seeded(2);
        let err = trainer.start(None, &[], &letters10()).unwrap_err();
        assert_eq!(err, TrainerError::EmptyCandidateSet);
        assert_eq!(trainer.phase(), Phase::Idle);
    }

    #[test]
    fn test_failed_start_keeps_previous_session() {
        let mut trainer = seeded(3);
        trainer.select_mode(GameMode::HomeRow).unwrap();
        let before = trainer.layout().unwrap().clone();

        assert!(trainer.start(None, &keys10(), &['a']).is_err());
        assert_eq!(trainer.phase(), Phase::Active);
        assert_eq!(trainer.layout(), Some(&before));
    }

    #[test]
    fn test_unmapped_key_is_ignored() {
        let mut trainer = seeded(4);
        trainer.select_mode(GameMode::HomeRow).unwrap();
        let expected = trainer.expected();

        assert_eq!(trainer.press(KeyId::new("KeyQ")), Ok(PressOutcome::Ignored));
        assert!(trainer.history().is_empty());
        assert_eq!(trainer.expected(), expected);
    }

    #[test]
    fn test_correct_press_picks_new_prompt() {
        let mut trainer = seeded(5);
        trainer.start(None, &keys10(), &letters10()).unwrap();
        let (key, letter) = trainer.expected().unwrap();

        assert_eq!(trainer.press(key), Ok(PressOutcome::Correct));
        assert_eq!(trainer.history(), &[HistoryEntry::new(letter, letter, false)]);
        assert_eq!(trainer.pressed_letter(), Some(letter));
        // the just-pressed key is excluded from the next pick
        assert_ne!(expected_key(&trainer), key);
    }

    #[test]
    fn test_incorrect_press_keeps_prompt() {
        let mut trainer = seeded(6);
        trainer.start(None, &keys10(), &letters10()).unwrap();
        let expected = trainer.expected().unwrap();
        let wrong = wrong_key(&trainer);
        let wrong_letter = trainer.layout().unwrap().letter_of(wrong).unwrap();

        assert_eq!(trainer.press(wrong), Ok(PressOutcome::Incorrect));
        assert_eq!(trainer.expected(), Some(expected));
        assert_eq!(
            trainer.history(),
            &[HistoryEntry::new(expected.1, wrong_letter, false)]
        );
    }

    #[test]
    fn test_three_correct_presses_mask_only_that_key() {
        let mut trainer = seeded(7);
        trainer.start(None, &keys10(), &letters10()).unwrap();
        let mut hits: std::collections::HashMap<KeyId, usize> = Default::default();

        // Keep answering correctly until some key has been hit three times
        let target = loop {
            let key = expected_key(&trainer);
            trainer.press(key).unwrap();
            let count = hits.entry(key).or_insert(0);
            *count += 1;
            if *count == 3 {
                break key;
            }
        };

        let layout = trainer.layout().unwrap();
        for (idx, key) in layout.keys().enumerate() {
            let expected_bit = hits.get(&key).copied().unwrap_or(0) >= 3;
            assert_eq!(trainer.mask()[idx], expected_bit, "{key}");
        }
        assert!(trainer.mask()[layout.index_of(target).unwrap()]);
        assert_eq!(trainer.mask().iter().filter(|&&b| b).count(), 1);
    }

    #[test]
    fn test_miss_on_mastered_key_unmasks_it() {
        let mut trainer = seeded(8);
        trainer.start(None, &keys10(), &letters10()).unwrap();

        let mut hits: std::collections::HashMap<KeyId, usize> = Default::default();
        let target = loop {
            let key = expected_key(&trainer);
            trainer.press(key).unwrap();
            let count = hits.entry(key).or_insert(0);
            *count += 1;
            if *count == 3 {
                break key;
            }
        };
        let idx = trainer.layout().unwrap().index_of(target).unwrap();
        assert!(trainer.mask()[idx]);

        // The next prompt is never the key just pressed, so pressing it is a miss
        assert_eq!(trainer.press(target), Ok(PressOutcome::Incorrect));
        assert!(!trainer.mask()[idx]);
    }

    #[test]
    fn test_history_entry_records_mask_of_expected_key() {
        let mut trainer = seeded(9);
        trainer.start(None, &keys10(), &letters10()).unwrap();

        // Master keys until the prompt lands on a masked one
        let mut guard = 0;
        while !trainer.mask()[trainer
            .layout()
            .unwrap()
            .index_of(expected_key(&trainer))
            .unwrap()]
        {
            let key = expected_key(&trainer);
            trainer.press(key).unwrap();
            guard += 1;
            assert!(guard < 10_000);
        }

        let wrong = wrong_key(&trainer);
        trainer.press(wrong).unwrap();
        let last = trainer.history().last().unwrap();
        assert!(last.masked);
        assert!(!last.is_correct());
    }

    #[test]
    fn test_reaches_won_and_reports_once() {
        let mut trainer = seeded(10);
        trainer.start(None, &keys10(), &letters10()).unwrap();

        let mut won_reports = 0;
        for _ in 0..10_000 {
            let key = expected_key(&trainer);
            match trainer.press(key).unwrap() {
                PressOutcome::Won => won_reports += 1,
                PressOutcome::Ignored => break,
                _ => {}
            }
        }

        assert_eq!(won_reports, 1);
        assert!(trainer.is_won());
        assert!(trainer.mask().iter().all(|&b| b));
        assert!(crate::history::ends_with_masked_streak(trainer.history(), 10));
        let len = trainer.history().len();
        assert_eq!(trainer.press(expected_key(&trainer)), Ok(PressOutcome::Ignored));
        assert_eq!(trainer.history().len(), len);
    }

    #[test]
    fn test_select_mode_twice_gives_fresh_sessions() {
        let mut trainer = seeded(11);
        trainer.select_mode(GameMode::HomeRow).unwrap();
        for _ in 0..20 {
            let key = expected_key(&trainer);
            trainer.press(key).unwrap();
        }
        assert!(!trainer.history().is_empty());

        trainer.select_mode(GameMode::HomeRow).unwrap();
        assert_eq!(trainer.phase(), Phase::Active);
        assert!(trainer.history().is_empty());
        assert_eq!(trainer.mask(), &[false; 10]);
        assert_eq!(trainer.state().unwrap().correct, 0);
    }

    #[test]
    fn test_select_mode_after_win_restarts() {
        let mut trainer = seeded(12);
        trainer.start(None, &keys10(), &letters10()).unwrap();
        while !trainer.is_won() {
            let key = expected_key(&trainer);
            trainer.press(key).unwrap();
        }

        trainer.select_mode(GameMode::Full).unwrap();
        assert_eq!(trainer.phase(), Phase::Active);
        assert_eq!(trainer.mask().len(), 30);
        assert!(trainer.history().is_empty());
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut trainer = seeded(19);
        trainer.select_mode(GameMode::HomeRow).unwrap();
        trainer.reset();

        assert_eq!(trainer.phase(), Phase::Idle);
        assert!(trainer.layout().is_none());
        assert_eq!(trainer.press(KeyId::new("KeyA")), Ok(PressOutcome::Ignored));
    }

    #[test]
    fn test_regenerate_layout_resets_progress() {
        let mut trainer = seeded(13);
        assert!(trainer.regenerate_layout().is_err());

        trainer.select_mode(GameMode::HomeRow).unwrap();
        for _ in 0..15 {
            let key = expected_key(&trainer);
            trainer.press(key).unwrap();
        }
        trainer.regenerate_layout().unwrap();

        assert_eq!(trainer.mode(), Some(GameMode::HomeRow));
        assert!(trainer.history().is_empty());
        assert_eq!(trainer.mask(), &[false; 10]);
        let (key, letter) = trainer.expected().unwrap();
        assert_eq!(trainer.layout().unwrap().letter_of(key), Some(letter));
    }

    #[test]
    fn test_replace_layout_heals_stale_prompt() {
        let mut trainer = seeded(14);
        let keys = keys10();
        trainer.start(None, &keys, &letters10()).unwrap();

        // A layout that shares no letters with the old one
        let fresh: Vec<char> = ('k'..='t').collect();
        trainer
            .replace_layout(Layout::from_pairs(&keys, &fresh).unwrap())
            .unwrap();

        let (key, letter) = trainer.expected().unwrap();
        assert!(fresh.contains(&letter));
        assert_eq!(trainer.layout().unwrap().letter_of(key), Some(letter));
        assert!(trainer.history().is_empty());
    }

    #[test]
    fn test_replace_layout_keeps_valid_prompt() {
        let mut trainer = seeded(15);
        let keys = keys10();
        trainer.start(None, &keys, &letters10()).unwrap();
        let layout = trainer.layout().unwrap().clone();
        let expected = trainer.expected();

        trainer.replace_layout(layout).unwrap();
        assert_eq!(trainer.expected(), expected);
    }

    #[test]
    fn test_replace_layout_with_other_keys_drops_mode() {
        let mut trainer = seeded(18);
        trainer.select_mode(GameMode::HomeRow).unwrap();

        let keys = [KeyId::new("KeyQ"), KeyId::new("KeyW"), KeyId::new("KeyE")];
        let layout = Layout::from_pairs(&keys, &['x', 'y', 'z']).unwrap();
        trainer.replace_layout(layout).unwrap();
        assert_eq!(trainer.mode(), None);
        assert_eq!(trainer.snapshot(5).mode, None);

        trainer.regenerate_layout().unwrap();
        let layout = trainer.layout().unwrap();
        assert_eq!(layout.keys().collect::<Vec<_>>(), keys);
        assert!(layout.letters().all(|c| ['x', 'y', 'z'].contains(&c)));
    }

    #[test]
    fn test_replace_layout_on_same_keys_keeps_mode() {
        let mut trainer = seeded(19);
        trainer.select_mode(GameMode::HomeRow).unwrap();

        let keys = GameMode::HomeRow.keys();
        let letters: Vec<char> = ('k'..='t').collect();
        trainer
            .replace_layout(Layout::from_pairs(&keys, &letters).unwrap())
            .unwrap();
        assert_eq!(trainer.mode(), Some(GameMode::HomeRow));
    }

    #[test]
    fn test_expected_letter_reports_stale_prompt() {
        let mut trainer = seeded(20);
        trainer.start(None, &keys10(), &letters10()).unwrap();
        assert_matches!(trainer.expected_letter(), Ok(Some(_)));

        if let Some(state) = trainer.state.as_mut() {
            state.expected = (KeyId::new("K1"), 'z');
        }
        assert_matches!(
            trainer.expected_letter(),
            Err(TrainerError::InconsistentLayout(_))
        );
        assert_eq!(trainer.snapshot(5).expected, None);
    }

    #[test]
    fn test_global_order_policy() {
        let mut trainer = Trainer::new(SessionConfig {
            policy: MaskPolicy::GlobalOrder,
            seed: Some(16),
            priority: vec![KeyId::new("K10")],
            ..SessionConfig::default()
        })
        .unwrap();
        trainer.start(None, &keys10(), &letters10()).unwrap();

        let key = expected_key(&trainer);
        trainer.press(key).unwrap();
        // first correct press masks the highest-priority key, whichever was pressed
        assert!(trainer.mask()[9]);
        assert_eq!(trainer.mask().iter().filter(|&&b| b).count(), 1);

        let wrong = wrong_key(&trainer);
        trainer.press(wrong).unwrap();
        assert!(trainer.mask().iter().all(|&b| !b));
    }

    #[test]
    fn test_snapshot() {
        let mut trainer = seeded(17);
        let idle = trainer.snapshot(5);
        assert_eq!(idle.phase, Phase::Idle);
        assert!(idle.layout.is_none());
        assert!(!idle.won());

        trainer.select_mode(GameMode::HomeRow).unwrap();
        for _ in 0..8 {
            let key = expected_key(&trainer);
            trainer.press(key).unwrap();
        }
        let snap = trainer.snapshot(5);
        assert_eq!(snap.history.len(), 5);
        assert_eq!(snap.history, &trainer.history()[3..]);
        assert_eq!(Ok(snap.expected), trainer.expected_letter());
        assert_eq!(snap.pressed, trainer.pressed_letter());
        assert_eq!(snap.accuracy, 100.0);
        assert_eq!(snap.mode, Some(GameMode::HomeRow));
    }

    #[test]
    fn test_seeded_trainers_agree() {
        let mut a = seeded(18);
        let mut b = seeded(18);
        a.select_mode(GameMode::Full).unwrap();
        b.select_mode(GameMode::Full).unwrap();
        assert_eq!(a.layout(), b.layout());
        assert_eq!(a.expected(), b.expected());
    }
}
