use std::sync::Arc;

use axum::{
    Extension, Json, Router, extract::State, http::StatusCode, response::IntoResponse,
    routing::get,
};

use crate::{
    common::{app_state::AppState, error::ServerError},
    game::store::GameBackend,
    player::models::{BalanceResponse, PlayerId},
};

pub fn player_routes<B: GameBackend>(state: Arc<AppState<B>>) -> Router {
    Router::new()
        .route("/balance", get(get_balance::<B>))
        .with_state(state)
}

async fn get_balance<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
    Extension(PlayerId(player_id)): Extension<PlayerId>,
) -> Result<impl IntoResponse, ServerError> {
    let balance = state.get_service().balance(player_id).await?;
    Ok((StatusCode::OK, Json(BalanceResponse { player_id, balance })))
}
