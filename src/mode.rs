use crate::layout::KeyId;
use serde::{Deserialize, Serialize};

static TOP_ROW: [KeyId; 10] = [
    KeyId::new("KeyQ"),
    KeyId::new("KeyW"),
    KeyId::new("KeyE"),
    KeyId::new("KeyR"),
    KeyId::new("KeyT"),
    KeyId::new("KeyY"),
    KeyId::new("KeyU"),
    KeyId::new("KeyI"),
    KeyId::new("KeyO"),
    KeyId::new("KeyP"),
];

static HOME_ROW: [KeyId; 10] = [
    KeyId::new("KeyA"),
    KeyId::new("KeyS"),
    KeyId::new("KeyD"),
    KeyId::new("KeyF"),
    KeyId::new("KeyG"),
    KeyId::new("KeyH"),
    KeyId::new("KeyJ"),
    KeyId::new("KeyK"),
    KeyId::new("KeyL"),
    KeyId::new("Semicolon"),
];

static BOTTOM_ROW: [KeyId; 10] = [
    KeyId::new("KeyZ"),
    KeyId::new("KeyX"),
    KeyId::new("KeyC"),
    KeyId::new("KeyV"),
    KeyId::new("KeyB"),
    KeyId::new("KeyN"),
    KeyId::new("KeyM"),
    KeyId::new("Comma"),
    KeyId::new("Period"),
    KeyId::new("Slash"),
];

/// Left hand, index reach, right hand
const ROW_GROUPS: [usize; 3] = [4, 2, 4];

/// Named key-set configurations offered on the mode screen
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    /// All three letter rows
    Full,
    /// The ten home-row keys only
    #[default]
    #[value(name = "homerow")]
    HomeRow,
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::Full, GameMode::HomeRow];

    /// Active keys in canonical order, top row first
    pub fn keys(self) -> Vec<KeyId> {
        self.key_rows().concat()
    }

    pub fn key_rows(self) -> Vec<&'static [KeyId]> {
        match self {
            GameMode::Full => vec![&TOP_ROW[..], &HOME_ROW[..], &BOTTOM_ROW[..]],
            GameMode::HomeRow => vec![&HOME_ROW[..]],
        }
    }

    /// Visual grouping of each row, as key counts
    pub fn group_lengths(self) -> &'static [usize] {
        &ROW_GROUPS
    }

    /// Letters the layout is drawn from
    pub fn letter_pool(self) -> Vec<char> {
        let alphabet = 'a'..='z';
        match self {
            GameMode::HomeRow => alphabet.collect(),
            GameMode::Full => alphabet.chain([';', ',', '.', '/']).collect(),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GameMode::Full => "Full Keyboard",
            GameMode::HomeRow => "Home Row Only",
        }
    }
}
