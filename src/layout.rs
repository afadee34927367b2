use crate::error::{Result, TrainerError};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// Physical key identifier, named after `KeyboardEvent.code` ("KeyA", "Semicolon", ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(&'static str);

impl KeyId {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn code(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A randomized bijection from the active keys to letters.
///
/// Entries keep the order of the active key set, which is also the order of
/// the mask vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    entries: Vec<(KeyId, char)>,
}

impl Layout {
    /// Pair `keys` with `letters` index by index.
    pub fn from_pairs(keys: &[KeyId], letters: &[char]) -> Result<Self> {
        if keys.len() != letters.len() {
            return Err(TrainerError::InvalidConfiguration(format!(
                "{} keys paired with {} letters",
                keys.len(),
                letters.len()
            )));
        }
        ensure_distinct(keys, "key")?;
        ensure_distinct(letters, "letter")?;

        Ok(Self {
            entries: keys.iter().copied().zip(letters.iter().copied()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(KeyId, char)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.iter().map(|(_, letter)| *letter)
    }

    pub fn letter_of(&self, key: KeyId) -> Option<char> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, letter)| *letter)
    }

    pub fn key_of(&self, letter: char) -> Option<KeyId> {
        self.entries
            .iter()
            .find(|(_, l)| *l == letter)
            .map(|(key, _)| *key)
    }

    pub fn index_of(&self, key: KeyId) -> Option<usize> {
        self.entries.iter().position(|(k, _)| *k == key)
    }

    pub fn index_of_letter(&self, letter: char) -> Option<usize> {
        self.entries.iter().position(|(_, l)| *l == letter)
    }

    pub fn contains_letter(&self, letter: char) -> bool {
        self.index_of_letter(letter).is_some()
    }
}

fn ensure_distinct<T: Eq + std::hash::Hash + fmt::Debug>(items: &[T], what: &str) -> Result<()> {
    match items.iter().duplicates().next() {
        Some(dup) => Err(TrainerError::InvalidConfiguration(format!(
            "duplicate {what} {dup:?}"
        ))),
        None => Ok(()),
    }
}

/// Shuffle `letter_pool`, truncate it to the number of keys and pair the
/// result with `active_keys` in their given order.
pub fn generate<R: Rng + ?Sized>(
    active_keys: &[KeyId],
    letter_pool: &[char],
    rng: &mut R,
) -> Result<Layout> {
    if letter_pool.len() < active_keys.len() {
        return Err(TrainerError::InvalidConfiguration(format!(
            "letter pool has {} letters for {} keys",
            letter_pool.len(),
            active_keys.len()
        )));
    }
    ensure_distinct(letter_pool, "letter")?;

    // SliceRandom::shuffle is a Fisher-Yates shuffle
    let mut pool = letter_pool.to_vec();
    pool.shuffle(rng);
    pool.truncate(active_keys.len());

    Layout::from_pairs(active_keys, &pool)
}
