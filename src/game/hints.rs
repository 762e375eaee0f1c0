use core::fmt;
use std::collections::BTreeMap;

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::game::game_question::Letter;

static FRIENDS: [&str; 6] = [
    "Vasily Petrovich",
    "Aunt Martha",
    "Professor Ivanov",
    "Your old classmate",
    "Grandpa Joe",
    "Cousin Anna",
];

const FRIEND_ACCURACY: f64 = 0.8;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    AudienceHelp,
    FiftyFifty,
    FriendCall,
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HintKind::AudienceHelp => write!(f, "audience_help"),
            HintKind::FiftyFifty => write!(f, "fifty_fifty"),
            HintKind::FriendCall => write!(f, "friend_call"),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum HintValue {
    AudienceHelp(BTreeMap<Letter, u32>),
    FiftyFifty([Letter; 2]),
    FriendCall(String),
}

impl HintValue {
    pub fn kind(&self) -> HintKind {
        match self {
            HintValue::AudienceHelp(_) => HintKind::AudienceHelp,
            HintValue::FiftyFifty(_) => HintKind::FiftyFifty,
            HintValue::FriendCall(_) => HintKind::FriendCall,
        }
    }
}

/// Generates hint payloads. Knows nothing about sessions or usage flags.
pub struct HintEngine;

impl HintEngine {
    pub fn generate<R: Rng + ?Sized>(kind: HintKind, correct: Letter, rng: &mut R) -> HintValue {
        match kind {
            HintKind::AudienceHelp => HintValue::AudienceHelp(Self::audience_help(rng)),
            HintKind::FiftyFifty => HintValue::FiftyFifty(Self::fifty_fifty(correct, rng)),
            HintKind::FriendCall => HintValue::FriendCall(Self::friend_call(correct, rng)),
        }
    }

    /// Independent votes per letter, not normalized.
    pub fn audience_help<R: Rng + ?Sized>(rng: &mut R) -> BTreeMap<Letter, u32> {
        Letter::ALL
            .into_iter()
            .map(|l| (l, rng.random_range(0..100)))
            .collect()
    }

    pub fn fifty_fifty<R: Rng + ?Sized>(correct: Letter, rng: &mut R) -> [Letter; 2] {
        let other = Self::random_wrong(correct, rng);
        let mut kept = [correct, other];
        kept.sort();
        kept
    }

    pub fn friend_call<R: Rng + ?Sized>(correct: Letter, rng: &mut R) -> String {
        let guess = if rng.random_bool(FRIEND_ACCURACY) {
            correct
        } else {
            Self::random_wrong(correct, rng)
        };

        let friend = FRIENDS.choose(rng).copied().unwrap_or(FRIENDS[0]);
        format!(
            "{} thinks the right answer is {}",
            friend,
            guess.as_str().to_uppercase()
        )
    }

    fn random_wrong<R: Rng + ?Sized>(correct: Letter, rng: &mut R) -> Letter {
        let wrong: Vec<Letter> = Letter::ALL.into_iter().filter(|l| *l != correct).collect();
        wrong.choose(rng).copied().unwrap_or(correct)
    }
}
