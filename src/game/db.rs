use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Transaction, types::Json};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    common::models::PagedResponse,
    game::{
        error::GameError,
        game_question::{AnswerMapping, GameQuestion, HintState},
        models::{CreateOutcome, GameSession, GameSummary},
        store::{Ledger, QuestionBank, SessionStore},
    },
    player,
    question::{
        self,
        models::{Level, Question, QuestionRow},
    },
};

const CREATE_ATTEMPTS: usize = 2;

#[derive(Debug, sqlx::FromRow)]
pub struct GameRow {
    pub id: Uuid,
    pub player_id: Uuid,
    pub current_level: i16,
    pub is_failed: bool,
    pub finished_at: Option<DateTime<Utc>>,
    pub prize: i64,
    pub created_at: DateTime<Utc>,
    pub audience_help_used: bool,
    pub fifty_fifty_used: bool,
    pub friend_call_used: bool,
    pub version: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct GameQuestionRow {
    pub id: Uuid,
    pub game_id: Uuid,
    pub a: i16,
    pub b: i16,
    pub c: i16,
    pub d: i16,
    pub hints: Json<HintState>,
    pub question_id: Uuid,
    pub text: String,
    pub answer1: String,
    pub answer2: String,
    pub answer3: String,
    pub answer4: String,
    pub level: i16,
}

impl GameQuestionRow {
    fn into_game_question(self) -> Result<GameQuestion, GameError> {
        let slots = [self.a, self.b, self.c, self.d].map(|s| u8::try_from(s).unwrap_or(0));
        let mapping = AnswerMapping::new(slots)?;
        let question = Question::try_from(QuestionRow {
            id: self.question_id,
            text: self.text,
            answer1: self.answer1,
            answer2: self.answer2,
            answer3: self.answer3,
            answer4: self.answer4,
            level: self.level,
        })?;

        Ok(GameQuestion::from_parts(
            self.id,
            self.game_id,
            Arc::new(question),
            mapping,
            self.hints.0,
        ))
    }
}

fn assemble_session(row: GameRow, rows: Vec<GameQuestionRow>) -> Result<GameSession, GameError> {
    let questions = rows
        .into_iter()
        .map(GameQuestionRow::into_game_question)
        .collect::<Result<Vec<_>, _>>()?;

    GameSession::validate_questions(row.id, &questions)?;

    let current_level = u8::try_from(row.current_level)
        .ok()
        .filter(|l| *l as usize <= Level::COUNT)
        .ok_or_else(|| {
            GameError::Validation(format!("Game {} has invalid level {}", row.id, row.current_level))
        })?;

    let prize = u64::try_from(row.prize)
        .map_err(|_| GameError::Validation(format!("Game {} has negative prize", row.id)))?;

    Ok(GameSession {
        id: row.id,
        player_id: row.player_id,
        questions,
        current_level,
        is_failed: row.is_failed,
        finished_at: row.finished_at,
        prize,
        created_at: row.created_at,
        audience_help_used: row.audience_help_used,
        fifty_fifty_used: row.fifty_fifty_used,
        friend_call_used: row.friend_call_used,
        version: row.version,
    })
}

pub async fn get_game_row_by_id(
    pool: &Pool<Postgres>,
    game_id: Uuid,
) -> Result<Option<GameRow>, sqlx::Error> {
    sqlx::query_as::<_, GameRow>(
        r#"
        SELECT id, player_id, current_level, is_failed, finished_at, prize, created_at,
            audience_help_used, fifty_fifty_used, friend_call_used, version
        FROM "game"
        WHERE id = $1
        "#,
    )
    .bind(game_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_active_game_row_by_player(
    pool: &Pool<Postgres>,
    player_id: Uuid,
) -> Result<Option<GameRow>, sqlx::Error> {
    sqlx::query_as::<_, GameRow>(
        r#"
        SELECT id, player_id, current_level, is_failed, finished_at, prize, created_at,
            audience_help_used, fifty_fifty_used, friend_call_used, version
        FROM "game"
        WHERE player_id = $1 AND finished_at IS NULL
        "#,
    )
    .bind(player_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_game_questions(
    pool: &Pool<Postgres>,
    game_id: Uuid,
) -> Result<Vec<GameQuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, GameQuestionRow>(
        r#"
        SELECT gq.id, gq.game_id, gq.a, gq.b, gq.c, gq.d, gq.hints,
            q.id AS question_id, q.text, q.answer1, q.answer2, q.answer3, q.answer4, q.level
        FROM "game_question" gq
        JOIN "question" q ON q.id = gq.question_id
        WHERE gq.game_id = $1
        ORDER BY gq.level ASC
        "#,
    )
    .bind(game_id)
    .fetch_all(pool)
    .await
}

pub async fn get_game_page(
    pool: &Pool<Postgres>,
    player_id: Uuid,
    page_num: u16,
    page_size: u16,
) -> Result<PagedResponse<GameSummary>, sqlx::Error> {
    let games = sqlx::query_as::<_, GameSummary>(
        r#"
        SELECT id, current_level, is_failed, prize, created_at, finished_at
        FROM "game"
        WHERE player_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(player_id)
    .bind(page_size as i64 + 1)
    .bind(page_size as i64 * page_num as i64)
    .fetch_all(pool)
    .await?;

    Ok(PagedResponse::from_overfetch(games, page_size))
}

/// Returns false when the player already holds a live game.
pub async fn tx_insert_game(
    tx: &mut Transaction<'_, Postgres>,
    session: &GameSession,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO "game" (id, player_id, current_level, is_failed, finished_at, prize,
            created_at, audience_help_used, fifty_fifty_used, friend_call_used, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (player_id) WHERE finished_at IS NULL DO NOTHING
        "#,
    )
    .bind(session.id)
    .bind(session.player_id)
    .bind(session.current_level as i16)
    .bind(session.is_failed)
    .bind(session.finished_at)
    .bind(session.prize as i64)
    .bind(session.created_at)
    .bind(session.audience_help_used)
    .bind(session.fifty_fifty_used)
    .bind(session.friend_call_used)
    .bind(session.version)
    .execute(&mut **tx)
    .await?;

    Ok(row.rows_affected() == 1)
}

pub async fn tx_insert_game_questions(
    tx: &mut Transaction<'_, Postgres>,
    questions: &[GameQuestion],
) -> Result<(), sqlx::Error> {
    for question in questions {
        let [a, b, c, d] = question.mapping().slots().map(i16::from);
        sqlx::query(
            r#"
            INSERT INTO "game_question" (id, game_id, question_id, level, a, b, c, d, hints)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(question.id)
        .bind(question.game_id)
        .bind(question.question().id)
        .bind(question.level().value() as i16)
        .bind(a)
        .bind(b)
        .bind(c)
        .bind(d)
        .bind(Json(&question.hints))
        .execute(&mut **tx)
        .await?;
    }

    debug!("Inserted {} game questions", questions.len());
    Ok(())
}

/// Version-checked update, returns false if someone else saved first.
pub async fn tx_update_game(
    tx: &mut Transaction<'_, Postgres>,
    session: &GameSession,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE "game"
        SET current_level = $3, is_failed = $4, finished_at = $5, prize = $6,
            audience_help_used = $7, fifty_fifty_used = $8, friend_call_used = $9,
            version = version + 1
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(session.id)
    .bind(session.version)
    .bind(session.current_level as i16)
    .bind(session.is_failed)
    .bind(session.finished_at)
    .bind(session.prize as i64)
    .bind(session.audience_help_used)
    .bind(session.fifty_fifty_used)
    .bind(session.friend_call_used)
    .execute(&mut **tx)
    .await?;

    Ok(row.rows_affected() == 1)
}

pub async fn tx_update_hints(
    tx: &mut Transaction<'_, Postgres>,
    question: &GameQuestion,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE "game_question"
        SET hints = $2
        WHERE id = $1
        "#,
    )
    .bind(question.id)
    .bind(Json(&question.hints))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn health_check(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
    let _ = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: Pool<Postgres>,
}

impl PgBackend {
    pub async fn from_connection_string(connection_string: &str) -> Result<Self, GameError> {
        let pool = Pool::<Postgres>::connect(connection_string).await?;
        Ok(Self { pool })
    }

    async fn load_session(&self, row: GameRow) -> Result<GameSession, GameError> {
        let rows = get_game_questions(&self.pool, row.id).await?;
        assemble_session(row, rows)
    }
}

impl QuestionBank for PgBackend {
    async fn sample(&self, level: Level, exclude: &[Uuid]) -> Result<Arc<Question>, GameError> {
        let row = question::db::get_random_question_by_level(&self.pool, level, exclude)
            .await?
            .ok_or(GameError::InsufficientQuestions(level))?;

        Ok(Arc::new(Question::try_from(row)?))
    }
}

impl SessionStore for PgBackend {
    async fn find_active_by_player(&self, player_id: Uuid) -> Result<Option<GameSession>, GameError> {
        match get_active_game_row_by_player(&self.pool, player_id).await? {
            Some(row) => Ok(Some(self.load_session(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, game_id: Uuid) -> Result<Option<GameSession>, GameError> {
        match get_game_row_by_id(&self.pool, game_id).await? {
            Some(row) => Ok(Some(self.load_session(row).await?)),
            None => Ok(None),
        }
    }

    /// The live game that blocked the insert may finish before it is read
    /// back; the insert is then tried once more.
    async fn create_atomic(&self, session: &GameSession) -> Result<CreateOutcome, GameError> {
        for _ in 0..CREATE_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            if tx_insert_game(&mut tx, session).await? {
                tx_insert_game_questions(&mut tx, session.questions()).await?;
                tx.commit().await?;
                return Ok(CreateOutcome::Created(session.clone()));
            }

            tx.rollback().await?;
            warn!("Player {} already holds a live game", session.player_id);

            if let Some(existing) = self.find_active_by_player(session.player_id).await? {
                return Ok(CreateOutcome::Existing(existing));
            }

            debug!(
                "Live game of player {} finished during creation, retrying",
                session.player_id
            );
        }

        Err(GameError::VersionConflict(session.id))
    }

    async fn save_atomic(
        &self,
        session: &GameSession,
        question: Option<&GameQuestion>,
        payout: u64,
    ) -> Result<(), GameError> {
        let mut tx = self.pool.begin().await?;

        if !tx_update_game(&mut tx, session).await? {
            tx.rollback().await?;
            warn!("Version conflict on game {}", session.id);
            return Err(GameError::VersionConflict(session.id));
        }

        if let Some(question) = question.filter(|q| !q.hints.is_empty()) {
            tx_update_hints(&mut tx, question).await?;
        }

        if payout > 0 {
            player::db::tx_credit_player(&mut tx, session.player_id, payout).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_by_player(
        &self,
        player_id: Uuid,
        page_num: u16,
        page_size: u16,
    ) -> Result<PagedResponse<GameSummary>, GameError> {
        Ok(get_game_page(&self.pool, player_id, page_num, page_size).await?)
    }

    async fn health_check(&self) -> Result<(), GameError> {
        Ok(health_check(&self.pool).await?)
    }
}

impl Ledger for PgBackend {
    async fn balance(&self, player_id: Uuid) -> Result<u64, GameError> {
        player::db::get_player_balance(&self.pool, player_id).await
    }
}
