use crate::layout::KeyId;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Physical key that produces `c` on a US QWERTY keyboard, shifted or not.
pub fn key_id_for_char(c: char) -> Option<KeyId> {
    let code = match c.to_ascii_lowercase() {
        'a' => "KeyA",
        'b' => "KeyB",
        'c' => "KeyC",
        'd' => "KeyD",
        'e' => "KeyE",
        'f' => "KeyF",
        'g' => "KeyG",
        'h' => "KeyH",
        'i' => "KeyI",
        'j' => "KeyJ",
        'k' => "KeyK",
        'l' => "KeyL",
        'm' => "KeyM",
        'n' => "KeyN",
        'o' => "KeyO",
        'p' => "KeyP",
        'q' => "KeyQ",
        'r' => "KeyR",
        's' => "KeyS",
        't' => "KeyT",
        'u' => "KeyU",
        'v' => "KeyV",
        'w' => "KeyW",
        'x' => "KeyX",
        'y' => "KeyY",
        'z' => "KeyZ",
        ';' | ':' => "Semicolon",
        ',' | '<' => "Comma",
        '.' | '>' => "Period",
        '/' | '?' => "Slash",
        _ => return None,
    };
    Some(KeyId::new(code))
}

/// Resolve a terminal key event to a physical key.
///
/// Control/Alt chords are never trainer input.
pub fn key_id_for(key: &KeyEvent) -> Option<KeyId> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Char(c) => key_id_for_char(c),
        _ => None,
    }
}
