use std::{collections::HashSet, path::Path, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use rand::seq::IndexedRandom;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    common::models::PagedResponse,
    game::{
        error::GameError,
        game_question::GameQuestion,
        models::{CreateOutcome, GameSession, GameSummary},
        store::{Ledger, QuestionBank, SessionStore},
    },
    question::models::{Level, Question, SeedQuestion},
};

/// Process-local backend. Per-player creation is serialized by the
/// `active` entry lock, per-game saves and their payouts by the `games` shard
/// lock. An `active` slot may briefly point at a finished game, readers skip
/// those.
#[derive(Default)]
pub struct MemoryBackend {
    questions: DashMap<Level, Vec<Arc<Question>>>,
    texts: DashMap<String, Uuid>,
    games: DashMap<Uuid, GameSession>,
    active: DashMap<Uuid, Uuid>,
    balances: DashMap<Uuid, u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GameError::Validation(format!(
                "Failed to read seed file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let seed: Vec<SeedQuestion> = serde_json::from_str(&raw)?;
        let backend = Self::new();
        for item in seed {
            let level = Level::new(item.level)?;
            backend.insert_question(Question::new(&item.text, item.answers, level)?)?;
        }

        info!("Loaded {} questions into memory bank", backend.texts.len());
        Ok(backend)
    }

    /// Rejects texts that already exist, ignoring case.
    pub fn insert_question(&self, question: Question) -> Result<Arc<Question>, GameError> {
        let key = question.text.to_lowercase();
        match self.texts.entry(key) {
            Entry::Occupied(_) => Err(GameError::Validation(format!(
                "Question '{}' already exists",
                question.text
            ))),
            Entry::Vacant(slot) => {
                slot.insert(question.id);
                let question = Arc::new(question);
                self.questions
                    .entry(question.level)
                    .or_default()
                    .push(question.clone());
                Ok(question)
            }
        }
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Points the player's live slot at `game_id` regardless of its state.
    #[cfg(test)]
    pub(crate) fn pin_active(&self, player_id: Uuid, game_id: Uuid) {
        self.active.insert(player_id, game_id);
    }
}

impl QuestionBank for MemoryBackend {
    async fn sample(&self, level: Level, exclude: &[Uuid]) -> Result<Arc<Question>, GameError> {
        let excluded: HashSet<&Uuid> = exclude.iter().collect();
        let candidates: Vec<Arc<Question>> = self
            .questions
            .get(&level)
            .map(|items| {
                items
                    .iter()
                    .filter(|q| !excluded.contains(&q.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        candidates
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(GameError::InsufficientQuestions(level))
    }
}

impl SessionStore for MemoryBackend {
    async fn find_active_by_player(&self, player_id: Uuid) -> Result<Option<GameSession>, GameError> {
        let Some(game_id) = self.active.get(&player_id).map(|g| *g) else {
            return Ok(None);
        };

        Ok(self
            .games
            .get(&game_id)
            .filter(|g| !g.is_finished())
            .map(|g| g.clone()))
    }

    async fn find_by_id(&self, game_id: Uuid) -> Result<Option<GameSession>, GameError> {
        Ok(self.games.get(&game_id).map(|g| g.clone()))
    }

    async fn create_atomic(&self, session: &GameSession) -> Result<CreateOutcome, GameError> {
        match self.active.entry(session.player_id) {
            Entry::Occupied(mut slot) => {
                let live = self
                    .games
                    .get(slot.get())
                    .filter(|g| !g.is_finished())
                    .map(|g| g.clone());

                if let Some(game) = live {
                    return Ok(CreateOutcome::Existing(game));
                }

                debug!("Releasing stale slot {} of player {}", slot.get(), session.player_id);
                self.games.insert(session.id, session.clone());
                slot.insert(session.id);
                Ok(CreateOutcome::Created(session.clone()))
            }
            Entry::Vacant(slot) => {
                self.games.insert(session.id, session.clone());
                slot.insert(session.id);
                debug!("Stored game {} with {} questions", session.id, session.questions().len());
                Ok(CreateOutcome::Created(session.clone()))
            }
        }
    }

    async fn save_atomic(
        &self,
        session: &GameSession,
        question: Option<&GameQuestion>,
        payout: u64,
    ) -> Result<(), GameError> {
        {
            let mut stored = self
                .games
                .get_mut(&session.id)
                .ok_or_else(|| GameError::NotFound(format!("Game {} was not found", session.id)))?;

            if stored.version != session.version {
                return Err(GameError::VersionConflict(session.id));
            }

            let mut next = session.clone();
            if let Some(question) = question {
                if let Some(slot) = next.questions.iter_mut().find(|q| q.id == question.id) {
                    slot.hints = question.hints.clone();
                }
            }
            next.version = session.version + 1;
            *stored = next;

            if payout > 0 {
                *self.balances.entry(session.player_id).or_insert(0) += payout;
            }
        }

        if session.is_finished() {
            self.active
                .remove_if(&session.player_id, |_, game_id| *game_id == session.id);
        }

        Ok(())
    }

    async fn list_by_player(
        &self,
        player_id: Uuid,
        page_num: u16,
        page_size: u16,
    ) -> Result<PagedResponse<GameSummary>, GameError> {
        let mut summaries: Vec<GameSummary> = self
            .games
            .iter()
            .filter(|g| g.player_id == player_id)
            .map(|g| GameSummary::from(g.value()))
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let items = summaries
            .into_iter()
            .skip(page_num as usize * page_size as usize)
            .take(page_size as usize + 1)
            .collect();

        Ok(PagedResponse::from_overfetch(items, page_size))
    }

    async fn health_check(&self) -> Result<(), GameError> {
        Ok(())
    }
}

impl Ledger for MemoryBackend {
    async fn balance(&self, player_id: Uuid) -> Result<u64, GameError> {
        Ok(self.balances.get(&player_id).map(|b| *b).unwrap_or(0))
    }
}
