use std::sync::Arc;

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use serde_json::json;
use tracing::error;

use crate::{
    common::{app_state::AppState, error::ServerError},
    game::store::GameBackend,
};

pub fn health_routes<B: GameBackend>(state: Arc<AppState<B>>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/detailed", get(health_detailed::<B>))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    "OK".into_response()
}

async fn health_detailed<B: GameBackend>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<impl IntoResponse, ServerError> {
    let platform = true;

    let db_status = match state.get_backend().health_check().await {
        Ok(_) => true,
        Err(e) => {
            error!("Failed storage health check: {}", e);
            false
        }
    };

    let json = json!({
        "platform": platform,
        "database": db_status,
    });

    Ok((StatusCode::OK, Json(json)))
}
