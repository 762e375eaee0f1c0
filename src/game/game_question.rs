use core::fmt;
use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    game::error::GameError,
    question::models::{Level, Question},
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Letter {
    A,
    B,
    C,
    D,
}

impl Letter {
    pub const ALL: [Letter; 4] = [Letter::A, Letter::B, Letter::C, Letter::D];

    pub fn as_str(&self) -> &str {
        match self {
            Letter::A => "a",
            Letter::B => "b",
            Letter::C => "c",
            Letter::D => "d",
        }
    }

    fn index(&self) -> usize {
        match self {
            Letter::A => 0,
            Letter::B => 1,
            Letter::C => 2,
            Letter::D => 3,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Letter {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" => Ok(Letter::A),
            "b" => Ok(Letter::B),
            "c" => Ok(Letter::C),
            "d" => Ok(Letter::D),
            other => Err(GameError::Validation(format!(
                "'{}' is not one of a, b, c, d",
                other
            ))),
        }
    }
}

/// Letter to answer-slot permutation. Slots are 1-based and slot 1 holds the
/// correct answer of the bank item.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "[u8; 4]", into = "[u8; 4]")]
pub struct AnswerMapping([u8; 4]);

impl AnswerMapping {
    pub fn new(slots: [u8; 4]) -> Result<Self, GameError> {
        let mut seen = [false; 4];
        for slot in slots {
            if !(1..=4).contains(&slot) {
                return Err(GameError::Validation(format!(
                    "Answer slot {} is outside of 1..=4",
                    slot
                )));
            }

            let idx = (slot - 1) as usize;
            if seen[idx] {
                return Err(GameError::Validation(format!(
                    "Answer slot {} is mapped twice",
                    slot
                )));
            }
            seen[idx] = true;
        }

        Ok(Self(slots))
    }

    /// Uniform over all 24 permutations.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut slots = [1, 2, 3, 4];
        slots.shuffle(rng);
        Self(slots)
    }

    pub fn slot(&self, letter: Letter) -> u8 {
        self.0[letter.index()]
    }

    pub fn slots(&self) -> [u8; 4] {
        self.0
    }

    pub fn correct_letter(&self) -> Letter {
        Letter::ALL
            .into_iter()
            .find(|l| self.slot(*l) == 1)
            .unwrap_or(Letter::A)
    }
}

impl TryFrom<[u8; 4]> for AnswerMapping {
    type Error = GameError;

    fn try_from(slots: [u8; 4]) -> Result<Self, Self::Error> {
        AnswerMapping::new(slots)
    }
}

impl From<AnswerMapping> for [u8; 4] {
    fn from(mapping: AnswerMapping) -> Self {
        mapping.0
    }
}

/// One optional entry per hint type. Entries are only ever added.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct HintState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_help: Option<BTreeMap<Letter, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fifty_fifty: Option<[Letter; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_call: Option<String>,
}

impl HintState {
    pub fn is_empty(&self) -> bool {
        self.audience_help.is_none() && self.fifty_fifty.is_none() && self.friend_call.is_none()
    }
}

/// A bank question bound to one game, with its own shuffled answer order.
#[derive(Debug, Clone, PartialEq)]
pub struct GameQuestion {
    pub id: Uuid,
    pub game_id: Uuid,
    question: Arc<Question>,
    mapping: AnswerMapping,
    pub hints: HintState,
}

impl GameQuestion {
    pub fn new(
        game_id: Uuid,
        question: Arc<Question>,
        mapping: AnswerMapping,
    ) -> Result<Self, GameError> {
        if game_id.is_nil() {
            return Err(GameError::Validation(
                "Game question must belong to a game".into(),
            ));
        }

        if question.id.is_nil() {
            return Err(GameError::Validation(
                "Game question must reference a bank question".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            game_id,
            question,
            mapping,
            hints: HintState::default(),
        })
    }

    pub fn from_parts(
        id: Uuid,
        game_id: Uuid,
        question: Arc<Question>,
        mapping: AnswerMapping,
        hints: HintState,
    ) -> Self {
        Self {
            id,
            game_id,
            question,
            mapping,
            hints,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn mapping(&self) -> AnswerMapping {
        self.mapping
    }

    pub fn text(&self) -> &str {
        &self.question.text
    }

    pub fn level(&self) -> Level {
        self.question.level
    }

    pub fn variants(&self) -> BTreeMap<Letter, &str> {
        Letter::ALL
            .into_iter()
            .map(|l| (l, self.question.answer(self.mapping.slot(l))))
            .collect()
    }

    pub fn correct_answer_key(&self) -> Letter {
        self.mapping.correct_letter()
    }

    pub fn correct_answer(&self) -> &str {
        self.question.answer(1)
    }

    pub fn answer_correct(&self, letter: Letter) -> bool {
        self.correct_answer_key() == letter
    }
}
