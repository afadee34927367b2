use thiserror::Error;

/// Failures raised by the trainer core.
///
/// Unmapped key presses are not errors; they surface as
/// [`crate::trainer::PressOutcome::Ignored`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrainerError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no candidate keys to pick a letter from")]
    EmptyCandidateSet,

    #[error("inconsistent layout: {0}")]
    InconsistentLayout(String),
}

pub type Result<T> = std::result::Result<T, TrainerError>;
