use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::{app_state::AppState, error::ServerError},
    game::{
        game_question::Letter,
        models::{
            AnswerRequest, AnswerResponse, CreateGameResponse, GameView, HintRequest,
            HintResponse, PageQuery, TakeMoneyResponse,
        },
        store::GameBackend,
    },
    player::models::PlayerId,
};

pub fn game_routes<B: GameBackend>(state: Arc<AppState<B>>) -> Router {
    Router::new()
        .route("/", get(list_games::<B>).post(create_game::<B>))
        .route("/{game_id}", get(get_game::<B>))
        .route("/{game_id}/answer", put(answer::<B>))
        .route("/{game_id}/take-money", put(take_money::<B>))
        .route("/{game_id}/help", put(help::<B>))
        .with_state(state)
}

async fn create_game<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
    Extension(PlayerId(player_id)): Extension<PlayerId>,
) -> Result<impl IntoResponse, ServerError> {
    let service = state.get_service();
    let outcome = service.create_game_for_player(player_id).await?;

    let existing = outcome.is_existing();
    let status = match existing {
        true => StatusCode::OK,
        false => StatusCode::CREATED,
    };

    let game = GameView::from_session(outcome.session(), Utc::now(), service.rules());
    Ok((status, Json(CreateGameResponse { existing, game })))
}

async fn get_game<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
    Extension(PlayerId(player_id)): Extension<PlayerId>,
    Path(game_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let service = state.get_service();
    let session = service.get_game(player_id, game_id).await?;

    let game = GameView::from_session(&session, Utc::now(), service.rules());
    Ok((StatusCode::OK, Json(game)))
}

async fn answer<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
    Extension(PlayerId(player_id)): Extension<PlayerId>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let letter: Letter = request.letter.parse()?;
    let service = state.get_service();
    let (session, outcome) = service.answer(player_id, game_id, letter).await?;

    let game = GameView::from_session(&session, Utc::now(), service.rules());
    Ok((StatusCode::OK, Json(AnswerResponse { outcome, game })))
}

async fn take_money<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
    Extension(PlayerId(player_id)): Extension<PlayerId>,
    Path(game_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let service = state.get_service();
    let (session, outcome) = service.take_money(player_id, game_id).await?;

    let game = GameView::from_session(&session, Utc::now(), service.rules());
    Ok((StatusCode::OK, Json(TakeMoneyResponse { outcome, game })))
}

async fn help<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
    Extension(PlayerId(player_id)): Extension<PlayerId>,
    Path(game_id): Path<Uuid>,
    Json(request): Json<HintRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let service = state.get_service();
    let (session, outcome) = service
        .use_hint(player_id, game_id, request.help_type)
        .await?;

    let game = GameView::from_session(&session, Utc::now(), service.rules());
    Ok((StatusCode::OK, Json(HintResponse { outcome, game })))
}

async fn list_games<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
    Extension(PlayerId(player_id)): Extension<PlayerId>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let page = state
        .get_service()
        .list_games(player_id, query.page_num, state.get_page_size())
        .await?;

    Ok((StatusCode::OK, Json(page)))
}
