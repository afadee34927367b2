// Library surface for the binary and headless/integration tests.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod history;
pub mod keymap;
pub mod layout;
pub mod mastery;
pub mod mode;
pub mod picker;
pub mod runtime;
pub mod session;
pub mod trainer;
pub mod ui;

pub use error::TrainerError;
pub use layout::{KeyId, Layout};
pub use mastery::MaskPolicy;
pub use mode::GameMode;
pub use session::{Phase, SessionConfig};
pub use trainer::{PressOutcome, Snapshot, Trainer};
