use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    common::models::PagedResponse,
    game::{
        error::GameError,
        game_question::{AnswerMapping, GameQuestion, Letter},
        hints::HintKind,
        models::{
            AnswerOutcome, CreateOutcome, GameRules, GameSession, GameSummaryView, HintOutcome,
            TakeMoneyOutcome,
        },
        store::GameBackend,
    },
    question::models::Level,
};

/// Runs the session state machine against the storage and ledger
/// collaborators. Every mutation is one load, one transition, one
/// version-checked save.
pub struct GameService<B: GameBackend> {
    backend: B,
    rules: GameRules,
}

impl<B: GameBackend> GameService<B> {
    pub fn new(backend: B, rules: GameRules) -> Self {
        Self { backend, rules }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub async fn create_game_for_player(&self, player_id: Uuid) -> Result<CreateOutcome, GameError> {
        if let Some(existing) = self.backend.find_active_by_player(player_id).await? {
            info!(
                "Player {} already has game {} in progress",
                player_id, existing.id
            );
            return Ok(CreateOutcome::Existing(existing));
        }

        let game_id = Uuid::new_v4();
        let mut drawn: Vec<Uuid> = Vec::with_capacity(Level::COUNT);
        let mut questions = Vec::with_capacity(Level::COUNT);

        for level in Level::all() {
            let question = self.backend.sample(level, &drawn).await?;
            drawn.push(question.id);

            let mapping = AnswerMapping::shuffled(&mut rand::rng());
            questions.push(GameQuestion::new(game_id, question, mapping)?);
        }

        let session = GameSession::new(game_id, player_id, questions, Utc::now())?;
        let outcome = self.backend.create_atomic(&session).await?;

        match &outcome {
            CreateOutcome::Created(s) => info!("Created game {} for player {}", s.id, player_id),
            CreateOutcome::Existing(s) => warn!(
                "Concurrent creation for player {}, returning game {}",
                player_id, s.id
            ),
        }

        Ok(outcome)
    }

    pub async fn get_game(&self, player_id: Uuid, game_id: Uuid) -> Result<GameSession, GameError> {
        let mut session = self.load_owned(player_id, game_id).await?;

        let now = Utc::now();
        if let Some(prize) = session.time_out(now, &self.rules) {
            self.persist(&mut session, None, prize).await?;
            info!(
                "Game {} finalized as {} on read",
                game_id,
                session.status(now, &self.rules)
            );
        }

        Ok(session)
    }

    pub async fn answer(
        &self,
        player_id: Uuid,
        game_id: Uuid,
        letter: Letter,
    ) -> Result<(GameSession, AnswerOutcome), GameError> {
        let mut session = self.load_owned(player_id, game_id).await?;
        let outcome = session.answer_current_question(letter, Utc::now(), &self.rules);
        if !outcome.accepted() {
            warn!("Answer to game {} was not accepted: {:?}", game_id, outcome);
        }

        if outcome.changed_state() {
            self.persist(&mut session, None, outcome.payout()).await?;
        }

        Ok((session, outcome))
    }

    pub async fn take_money(
        &self,
        player_id: Uuid,
        game_id: Uuid,
    ) -> Result<(GameSession, TakeMoneyOutcome), GameError> {
        let mut session = self.load_owned(player_id, game_id).await?;
        let outcome = session.take_money(Utc::now(), &self.rules)?;

        self.persist(&mut session, None, outcome.payout()).await?;
        Ok((session, outcome))
    }

    pub async fn use_hint(
        &self,
        player_id: Uuid,
        game_id: Uuid,
        kind: HintKind,
    ) -> Result<(GameSession, HintOutcome), GameError> {
        let mut session = self.load_owned(player_id, game_id).await?;
        let level = session.current_level as usize;
        let outcome = session.use_hint(kind, Utc::now(), &self.rules, &mut rand::rng())?;

        match &outcome {
            HintOutcome::Applied { hint } => {
                self.persist(&mut session, Some(level), 0).await?;
                info!("Stored {} hint for game {}", hint.kind(), game_id);
            }
            HintOutcome::TimedOut { prize } => self.persist(&mut session, None, *prize).await?,
        }

        Ok((session, outcome))
    }

    pub async fn list_games(
        &self,
        player_id: Uuid,
        page_num: u16,
        page_size: u16,
    ) -> Result<PagedResponse<GameSummaryView>, GameError> {
        let now = Utc::now();
        let page = self
            .backend
            .list_by_player(player_id, page_num, page_size)
            .await?;

        page.try_map(|summary| summary.view(now, &self.rules))
    }

    pub async fn balance(&self, player_id: Uuid) -> Result<u64, GameError> {
        self.backend.balance(player_id).await
    }

    /// Foreign games are reported as missing.
    async fn load_owned(&self, player_id: Uuid, game_id: Uuid) -> Result<GameSession, GameError> {
        match self.backend.find_by_id(game_id).await? {
            Some(session) if session.player_id == player_id => Ok(session),
            Some(_) => {
                warn!("Player {} tried to access game {}", player_id, game_id);
                Err(GameError::NotFound(format!("Game {} was not found", game_id)))
            }
            None => Err(GameError::NotFound(format!("Game {} was not found", game_id))),
        }
    }

    async fn persist(
        &self,
        session: &mut GameSession,
        hinted: Option<usize>,
        payout: u64,
    ) -> Result<(), GameError> {
        let question = hinted.and_then(|idx| session.questions.get(idx));
        self.backend.save_atomic(session, question, payout).await?;
        session.version += 1;

        if payout > 0 {
            info!("Credited {} to player {}", payout, session.player_id);
        }

        Ok(())
    }
}
