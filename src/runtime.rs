use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::keymap::key_id_for;
use crate::layout::KeyId;
use crate::mode::GameMode;
use crate::session::Phase;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum TrainerEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// What the main loop should do with a key event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Back to the mode screen
    ModeMenu,
    SelectMode(GameMode),
    /// Reshuffle the layout of the current mode
    Regenerate,
    Press(KeyId),
    Nothing,
}

impl Command {
    /// Interpret `key` for a trainer currently in `phase`.
    pub fn from_key(key: &KeyEvent, phase: Phase) -> Self {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Command::Quit,
            KeyCode::Char('c') if ctrl => return Command::Quit,
            KeyCode::Char('r') if ctrl => {
                return match phase {
                    Phase::Idle => Command::Nothing,
                    _ => Command::Regenerate,
                }
            }
            KeyCode::Tab => return Command::ModeMenu,
            _ => {}
        }

        match phase {
            Phase::Idle => match key.code {
                KeyCode::Char('1') | KeyCode::Char('f') => Command::SelectMode(GameMode::Full),
                KeyCode::Char('2') | KeyCode::Char('h') => Command::SelectMode(GameMode::HomeRow),
                _ => Command::Nothing,
            },
            Phase::Active => key_id_for(key).map_or(Command::Nothing, Command::Press),
            Phase::Won => match key.code {
                KeyCode::Enter => Command::Regenerate,
                _ => Command::Nothing,
            },
        }
    }
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait TrainerEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a helper thread
pub struct CrosstermEventSource {
    rx: Receiver<TrainerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Release/repeat events would count as extra presses
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(TrainerEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(TrainerEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    tracing::error!("terminal event read failed: {e}");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-backed event source for headless tests
pub struct TestEventSource {
    rx: Receiver<TrainerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TrainerEvent>) -> Self {
        Self { rx }
    }
}

impl TrainerEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the application one event at a time, yielding `Tick` when idle
pub struct Runner<E: TrainerEventSource> {
    event_source: E,
    tick: Duration,
}

impl<E: TrainerEventSource> Runner<E> {
    pub fn new(event_source: E, tick: Duration) -> Self {
        Self { event_source, tick }
    }

    pub fn step(&self) -> TrainerEvent {
        match self.event_source.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                TrainerEvent::Tick
            }
        }
    }
}
