use uuid::Uuid;

use crate::{game::hints::HintKind, question::models::Level};

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Hint {0} has already been used in this game")]
    HintAlreadyUsed(HintKind),

    #[error("Nothing to bank before the first question is answered")]
    NothingToBank,

    #[error("The game is already finished")]
    Finished,

    #[error("No unused question available for level {0}")]
    InsufficientQuestions(Level),

    #[error("Game {0} was modified concurrently")]
    VersionConflict(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to serialize object: {0}")]
    Serialize(#[from] serde_json::Error),
}
