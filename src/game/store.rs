use std::{future::Future, sync::Arc};

use uuid::Uuid;

use crate::{
    common::models::PagedResponse,
    game::{
        error::GameError,
        game_question::GameQuestion,
        models::{CreateOutcome, GameSession, GameSummary},
    },
    question::models::{Level, Question},
};

/// Read-only source of leveled trivia items.
pub trait QuestionBank {
    /// Random item at `level` whose id is not in `exclude`.
    fn sample(
        &self,
        level: Level,
        exclude: &[Uuid],
    ) -> impl Future<Output = Result<Arc<Question>, GameError>> + Send;
}

/// Persistence of sessions. Enforces one unfinished session per player and
/// version-checked updates.
pub trait SessionStore {
    fn find_active_by_player(
        &self,
        player_id: Uuid,
    ) -> impl Future<Output = Result<Option<GameSession>, GameError>> + Send;

    fn find_by_id(
        &self,
        game_id: Uuid,
    ) -> impl Future<Output = Result<Option<GameSession>, GameError>> + Send;

    /// Stores the session with all its questions, or returns the session that
    /// already holds the player's live slot.
    fn create_atomic(
        &self,
        session: &GameSession,
    ) -> impl Future<Output = Result<CreateOutcome, GameError>> + Send;

    /// Writes session fields (and the question's hint state when given) if the
    /// stored version still equals `session.version`; bumps the stored version.
    /// A non-zero `payout` is credited to the player in the same write, so the
    /// game is never finished without its prize being paid.
    fn save_atomic(
        &self,
        session: &GameSession,
        question: Option<&GameQuestion>,
        payout: u64,
    ) -> impl Future<Output = Result<(), GameError>> + Send;

    fn list_by_player(
        &self,
        player_id: Uuid,
        page_num: u16,
        page_size: u16,
    ) -> impl Future<Output = Result<PagedResponse<GameSummary>, GameError>> + Send;

    /// Connectivity probe for the detailed health check.
    fn health_check(&self) -> impl Future<Output = Result<(), GameError>> + Send;
}

/// Read side of the player balances. Credits go through `save_atomic`.
pub trait Ledger {
    fn balance(&self, player_id: Uuid) -> impl Future<Output = Result<u64, GameError>> + Send;
}

pub trait GameBackend: QuestionBank + SessionStore + Ledger + Send + Sync + 'static {}

impl<T> GameBackend for T where T: QuestionBank + SessionStore + Ledger + Send + Sync + 'static {}
