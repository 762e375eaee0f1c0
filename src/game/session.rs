use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    game::{
        error::GameError,
        game_question::{GameQuestion, Letter},
        hints::{HintEngine, HintKind, HintValue},
        models::{
            AnswerOutcome, GameRules, GameSession, GameStatus, GameSummary, GameSummaryView,
            HintOutcome, TakeMoneyOutcome,
        },
    },
    question::models::Level,
};

/// Single source of truth for status, shared by full sessions and summaries.
pub fn derive_status(
    finished_at: Option<DateTime<Utc>>,
    is_failed: bool,
    current_level: u8,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    rules: &GameRules,
) -> GameStatus {
    if finished_at.is_none() {
        return GameStatus::InProgress;
    }

    if is_failed {
        if now - created_at > rules.time_limit {
            GameStatus::Timeout
        } else {
            GameStatus::Fail
        }
    } else if current_level > Level::MAX.value() {
        GameStatus::Won
    } else {
        GameStatus::Money
    }
}

impl GameSession {
    /// Questions must be exactly one per level, in ladder order.
    pub fn new(
        id: Uuid,
        player_id: Uuid,
        questions: Vec<GameQuestion>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        Self::validate_questions(id, &questions)?;

        Ok(Self {
            id,
            player_id,
            questions,
            current_level: 0,
            is_failed: false,
            finished_at: None,
            prize: 0,
            created_at,
            audience_help_used: false,
            fifty_fifty_used: false,
            friend_call_used: false,
            version: 0,
        })
    }

    pub(crate) fn validate_questions(id: Uuid, questions: &[GameQuestion]) -> Result<(), GameError> {
        if questions.len() != Level::COUNT {
            return Err(GameError::Validation(format!(
                "Game {} needs {} questions, got {}",
                id,
                Level::COUNT,
                questions.len()
            )));
        }

        for (idx, question) in questions.iter().enumerate() {
            if question.level().index() != idx {
                return Err(GameError::Validation(format!(
                    "Question at position {} has level {}",
                    idx,
                    question.level()
                )));
            }

            if question.game_id != id {
                return Err(GameError::Validation(format!(
                    "Question {} belongs to game {}, not {}",
                    question.id, question.game_id, id
                )));
            }
        }

        Ok(())
    }

    pub fn questions(&self) -> &[GameQuestion] {
        &self.questions
    }

    pub fn status(&self, now: DateTime<Utc>, rules: &GameRules) -> GameStatus {
        derive_status(
            self.finished_at,
            self.is_failed,
            self.current_level,
            self.created_at,
            now,
            rules,
        )
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn time_exceeded(&self, now: DateTime<Utc>, rules: &GameRules) -> bool {
        now - self.created_at > rules.time_limit
    }

    pub fn current_game_question(&self) -> Option<&GameQuestion> {
        self.questions.get(self.current_level as usize)
    }

    pub fn previous_game_question(&self) -> Option<&GameQuestion> {
        self.previous_level()
            .and_then(|l| self.questions.get(l.index()))
    }

    /// Highest fully answered level.
    pub fn previous_level(&self) -> Option<Level> {
        self.current_level
            .checked_sub(1)
            .and_then(|l| Level::new(l).ok())
    }

    /// Finalizes an unfinished session whose deadline has passed. Returns the
    /// payout when it did.
    pub fn time_out(&mut self, now: DateTime<Utc>, rules: &GameRules) -> Option<u64> {
        if self.is_finished() || !self.time_exceeded(now, rules) {
            return None;
        }

        let prize = self.fail_prize(rules);
        self.finish(now, prize, true);
        info!("Game {} of player {} timed out", self.id, self.player_id);
        Some(prize)
    }

    pub fn answer_current_question(
        &mut self,
        letter: Letter,
        now: DateTime<Utc>,
        rules: &GameRules,
    ) -> AnswerOutcome {
        if self.is_finished() {
            return AnswerOutcome::Finished;
        }

        if let Some(prize) = self.time_out(now, rules) {
            return AnswerOutcome::TimedOut { prize };
        }

        let Some(question) = self.current_game_question() else {
            return AnswerOutcome::Finished;
        };

        if !question.answer_correct(letter) {
            let correct = question.correct_answer_key();
            debug!(
                "Game {} expected {} ('{}'), got {}",
                self.id,
                correct,
                question.correct_answer(),
                letter
            );
            let prize = self.fail_prize(rules);
            self.finish(now, prize, true);
            info!(
                "Game {} failed at level {} with prize {}",
                self.id, self.current_level, prize
            );
            return AnswerOutcome::Incorrect { correct, prize };
        }

        self.current_level += 1;
        if self.current_level > Level::MAX.value() {
            let prize = rules.prizes.top_prize();
            self.finish(now, prize, false);
            info!("Game {} won with prize {}", self.id, prize);
            return AnswerOutcome::Won { prize };
        }

        debug!("Game {} advanced to level {}", self.id, self.current_level);
        AnswerOutcome::Correct {
            level: self.current_level,
        }
    }

    pub fn take_money(
        &mut self,
        now: DateTime<Utc>,
        rules: &GameRules,
    ) -> Result<TakeMoneyOutcome, GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }

        if let Some(prize) = self.time_out(now, rules) {
            return Ok(TakeMoneyOutcome::TimedOut { prize });
        }

        let Some(answered) = self.previous_game_question().map(|q| q.level()) else {
            return Err(GameError::NothingToBank);
        };

        let prize = rules.prizes.prize(answered);
        self.finish(now, prize, false);
        info!("Game {} banked {} at level {}", self.id, prize, answered);
        Ok(TakeMoneyOutcome::Banked { prize })
    }

    pub fn use_hint<R: Rng + ?Sized>(
        &mut self,
        kind: HintKind,
        now: DateTime<Utc>,
        rules: &GameRules,
        rng: &mut R,
    ) -> Result<HintOutcome, GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }

        if let Some(prize) = self.time_out(now, rules) {
            return Ok(HintOutcome::TimedOut { prize });
        }

        if self.hint_used(kind) {
            return Err(GameError::HintAlreadyUsed(kind));
        }

        let level = self.current_level as usize;
        let question = self.questions.get_mut(level).ok_or(GameError::Finished)?;
        let hint = HintEngine::generate(kind, question.correct_answer_key(), rng);

        match &hint {
            HintValue::AudienceHelp(votes) => question.hints.audience_help = Some(votes.clone()),
            HintValue::FiftyFifty(kept) => question.hints.fifty_fifty = Some(*kept),
            HintValue::FriendCall(text) => question.hints.friend_call = Some(text.clone()),
        }
        self.mark_hint_used(kind);

        info!("Game {} used hint {} at level {}", self.id, kind, level);
        Ok(HintOutcome::Applied { hint })
    }

    pub fn hint_used(&self, kind: HintKind) -> bool {
        match kind {
            HintKind::AudienceHelp => self.audience_help_used,
            HintKind::FiftyFifty => self.fifty_fifty_used,
            HintKind::FriendCall => self.friend_call_used,
        }
    }

    fn mark_hint_used(&mut self, kind: HintKind) {
        match kind {
            HintKind::AudienceHelp => self.audience_help_used = true,
            HintKind::FiftyFifty => self.fifty_fifty_used = true,
            HintKind::FriendCall => self.friend_call_used = true,
        }
    }

    /// Unbanked progress is lost unless fireproof payouts are switched on.
    fn fail_prize(&self, rules: &GameRules) -> u64 {
        if rules.fireproof_payout {
            rules.prizes.fireproof_prize(self.previous_level())
        } else {
            self.prize
        }
    }

    fn finish(&mut self, now: DateTime<Utc>, prize: u64, failed: bool) {
        self.finished_at = Some(now);
        self.is_failed = failed;
        self.prize = prize;
    }
}

impl GameSummary {
    pub fn view(&self, now: DateTime<Utc>, rules: &GameRules) -> Result<GameSummaryView, GameError> {
        let current_level = u8::try_from(self.current_level)
            .ok()
            .filter(|l| *l as usize <= Level::COUNT)
            .ok_or_else(|| {
                GameError::Validation(format!(
                    "Game {} has invalid level {}",
                    self.id, self.current_level
                ))
            })?;

        let prize = u64::try_from(self.prize)
            .map_err(|_| GameError::Validation(format!("Game {} has negative prize", self.id)))?;

        Ok(GameSummaryView {
            id: self.id,
            status: derive_status(
                self.finished_at,
                self.is_failed,
                current_level,
                self.created_at,
                now,
                rules,
            ),
            current_level,
            prize,
            created_at: self.created_at,
            finished_at: self.finished_at,
        })
    }
}

impl From<&GameSession> for GameSummary {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            current_level: session.current_level as i16,
            is_failed: session.is_failed,
            prize: session.prize as i64,
            created_at: session.created_at,
            finished_at: session.finished_at,
        }
    }
}
