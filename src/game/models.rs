use core::fmt;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::config::GameConfig,
    game::{
        game_question::{GameQuestion, HintState, Letter},
        hints::{HintKind, HintValue},
        prize::PrizeTable,
    },
};

pub const DEFAULT_TIME_LIMIT_MINUTES: i64 = 35;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won,
    Fail,
    Timeout,
    Money,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::InProgress => write!(f, "in_progress"),
            GameStatus::Won => write!(f, "won"),
            GameStatus::Fail => write!(f, "fail"),
            GameStatus::Timeout => write!(f, "timeout"),
            GameStatus::Money => write!(f, "money"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameRules {
    pub time_limit: Duration,
    pub prizes: PrizeTable,
    pub fireproof_payout: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            time_limit: Duration::minutes(DEFAULT_TIME_LIMIT_MINUTES),
            prizes: PrizeTable::default(),
            fireproof_payout: false,
        }
    }
}

impl From<&GameConfig> for GameRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            time_limit: Duration::minutes(config.time_limit_minutes),
            prizes: PrizeTable::default(),
            fireproof_payout: config.fireproof_payout,
        }
    }
}

/// One player's run up the fifteen question ladder. Status is never stored,
/// see `GameSession::status`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub id: Uuid,
    pub player_id: Uuid,
    pub(crate) questions: Vec<GameQuestion>,
    pub current_level: u8,
    pub is_failed: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub prize: u64,
    pub created_at: DateTime<Utc>,
    pub audience_help_used: bool,
    pub fifty_fifty_used: bool,
    pub friend_call_used: bool,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    Created(GameSession),
    Existing(GameSession),
}

impl CreateOutcome {
    pub fn session(&self) -> &GameSession {
        match self {
            CreateOutcome::Created(s) | CreateOutcome::Existing(s) => s,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, CreateOutcome::Existing(_))
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AnswerOutcome {
    /// Moved up to `level`, game continues.
    Correct { level: u8 },
    Won { prize: u64 },
    Incorrect { correct: Letter, prize: u64 },
    /// Deadline passed before the answer, game finalized as failed.
    TimedOut { prize: u64 },
    /// Game was already over, nothing changed.
    Finished,
}

impl AnswerOutcome {
    pub fn accepted(&self) -> bool {
        matches!(
            self,
            AnswerOutcome::Correct { .. } | AnswerOutcome::Won { .. } | AnswerOutcome::Incorrect { .. }
        )
    }

    pub fn changed_state(&self) -> bool {
        !matches!(self, AnswerOutcome::Finished)
    }

    /// Amount to credit to the player's balance.
    pub fn payout(&self) -> u64 {
        match self {
            AnswerOutcome::Won { prize }
            | AnswerOutcome::Incorrect { prize, .. }
            | AnswerOutcome::TimedOut { prize } => *prize,
            _ => 0,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TakeMoneyOutcome {
    Banked { prize: u64 },
    TimedOut { prize: u64 },
}

impl TakeMoneyOutcome {
    pub fn payout(&self) -> u64 {
        match self {
            TakeMoneyOutcome::Banked { prize } | TakeMoneyOutcome::TimedOut { prize } => *prize,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HintOutcome {
    Applied { hint: HintValue },
    TimedOut { prize: u64 },
}

/* Responses */

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub level: u8,
    pub text: String,
    pub variants: BTreeMap<Letter, String>,
    pub hints: HintState,
}

#[derive(Debug, Serialize)]
pub struct GameView {
    pub id: Uuid,
    pub status: GameStatus,
    pub current_level: u8,
    pub prize: u64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub audience_help_used: bool,
    pub fifty_fifty_used: bool,
    pub friend_call_used: bool,
    pub question: Option<QuestionView>,
}

impl GameView {
    pub fn from_session(session: &GameSession, now: DateTime<Utc>, rules: &GameRules) -> Self {
        let status = session.status(now, rules);
        let question = match status {
            GameStatus::InProgress => session.current_game_question().map(|q| QuestionView {
                level: q.level().value(),
                text: q.text().to_string(),
                variants: q
                    .variants()
                    .into_iter()
                    .map(|(l, text)| (l, text.to_string()))
                    .collect(),
                hints: q.hints.clone(),
            }),
            _ => None,
        };

        Self {
            id: session.id,
            status,
            current_level: session.current_level,
            prize: session.prize,
            created_at: session.created_at,
            finished_at: session.finished_at,
            audience_help_used: session.audience_help_used,
            fifty_fifty_used: session.fifty_fifty_used,
            friend_call_used: session.friend_call_used,
            question,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct GameSummary {
    pub id: Uuid,
    pub current_level: i16,
    pub is_failed: bool,
    pub prize: i64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct GameSummaryView {
    pub id: Uuid,
    pub status: GameStatus,
    pub current_level: u8,
    pub prize: u64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub letter: String,
}

#[derive(Debug, Deserialize)]
pub struct HintRequest {
    pub help_type: HintKind,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page_num: u16,
}

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    pub existing: bool,
    pub game: GameView,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub outcome: AnswerOutcome,
    pub game: GameView,
}

#[derive(Debug, Serialize)]
pub struct TakeMoneyResponse {
    pub outcome: TakeMoneyOutcome,
    pub game: GameView,
}

#[derive(Debug, Serialize)]
pub struct HintResponse {
    pub outcome: HintOutcome,
    pub game: GameView,
}
