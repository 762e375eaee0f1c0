use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::game::error::GameError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Api error: {0} - {1}")]
    Api(StatusCode, String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Game(e) => match e {
                GameError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
                GameError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
                GameError::HintAlreadyUsed(_) | GameError::NothingToBank | GameError::Finished => {
                    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
                }
                GameError::VersionConflict(_) => (StatusCode::CONFLICT, e.to_string()),
                GameError::InsufficientQuestions(_) => {
                    error!("{}", e);
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "The question bank cannot fill a new game".into(),
                    )
                }
                GameError::Database(_) | GameError::Serialize(_) => {
                    error!("{}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
                }
            },
            ServerError::Api(status, msg) => {
                warn!("Api error: {} - {}", status, msg);
                (status, msg)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
