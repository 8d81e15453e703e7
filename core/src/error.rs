use crate::types::{FieldId, Xp};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Action rejected: {0}")]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A player action that cannot run in the current state.
/// Raising one of these never mutates the game state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    #[error("You need {need} XP in {} to initiate the vote (have {have})", .field.label())]
    InsufficientExpertise { field: FieldId, have: Xp, need: Xp },

    #[error("{} is already deployed", .field.label())]
    AlreadyDeployed { field: FieldId },

    #[error("No quiz question is available right now")]
    NoQuestionAvailable,

    #[error("Answer already graded; waiting for the next question")]
    AwaitingNextQuestion,

    #[error("No question transition is pending")]
    NoPendingAdvance,

    #[error("The game is over")]
    GameOver,
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// The precondition behind this error, if it is a rejected action.
    pub fn as_precondition(&self) -> Option<&PreconditionError> {
        match self {
            Self::Precondition(p) => Some(p),
            _ => None,
        }
    }
}
