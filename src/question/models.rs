use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::error::GameError;

/// Position on the difficulty ladder, always within `0..=14`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MAX: Level = Level(14);
    pub const COUNT: usize = 15;

    pub fn new(value: u8) -> Result<Self, GameError> {
        if value > Self::MAX.0 {
            return Err(GameError::Validation(format!(
                "Level {} is outside of 0..={}",
                value,
                Self::MAX.0
            )));
        }

        Ok(Self(value))
    }

    pub fn all() -> impl Iterator<Item = Level> {
        (0..=Self::MAX.0).map(Level)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for Level {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bank item. The correct answer is always stored in slot 1 (`answers[0]`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub answers: [String; 4],
    pub level: Level,
}

impl Question {
    pub fn new(text: &str, answers: [String; 4], level: Level) -> Result<Self, GameError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GameError::Validation("Question text is required".into()));
        }

        if answers.iter().any(|a| a.trim().is_empty()) {
            return Err(GameError::Validation(format!(
                "Question '{}' has an empty answer",
                text
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            answers,
            level,
        })
    }

    /// Slot is 1-based, matching the answer mapping.
    pub fn answer(&self, slot: u8) -> &str {
        &self.answers[(slot - 1) as usize]
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: Uuid,
    pub text: String,
    pub answer1: String,
    pub answer2: String,
    pub answer3: String,
    pub answer4: String,
    pub level: i16,
}

impl TryFrom<QuestionRow> for Question {
    type Error = GameError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let level = u8::try_from(row.level)
            .map_err(|_| GameError::Validation(format!("Invalid stored level {}", row.level)))
            .and_then(Level::new)?;

        Ok(Self {
            id: row.id,
            text: row.text,
            answers: [row.answer1, row.answer2, row.answer3, row.answer4],
            level,
        })
    }
}

/// Seed file entry for the in-memory bank. `answers[0]` is the correct one.
#[derive(Debug, Deserialize)]
pub struct SeedQuestion {
    pub text: String,
    pub answers: [String; 4],
    pub level: u8,
}
