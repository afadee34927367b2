/// One accepted key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub expected: char,
    pub actual: Option<char>,
    /// Whether the expected key was masked when the press happened
    pub masked: bool,
}

impl HistoryEntry {
    pub fn new(expected: char, actual: char, masked: bool) -> Self {
        Self {
            expected,
            actual: Some(actual),
            masked,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.actual == Some(self.expected)
    }
}

/// The last `n` entries (fewer if the history is shorter), oldest first.
pub fn trailing(history: &[HistoryEntry], n: usize) -> &[HistoryEntry] {
    &history[history.len().saturating_sub(n)..]
}

/// True when the last `n` entries exist and were all correct presses on
/// masked keys.
pub fn ends_with_masked_streak(history: &[HistoryEntry], n: usize) -> bool {
    history.len() >= n
        && trailing(history, n)
            .iter()
            .all(|entry| entry.is_correct() && entry.masked)
}
