use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{common::error::ServerError, player::models::PlayerId};

pub static PLAYER_HEADER: &str = "X-Player-Id";

/// Identity is established upstream; this only lifts the player id into
/// request extensions.
pub async fn player_mw(mut req: Request<Body>, next: Next) -> Result<Response, ServerError> {
    let Some(header) = extract_header(PLAYER_HEADER, req.headers()) else {
        error!("Missing player header");
        return Err(ServerError::Api(
            StatusCode::UNAUTHORIZED,
            "Missing player header".into(),
        ));
    };

    let player_id = to_uuid(header)?;
    debug!("Request by player: {}", player_id);
    req.extensions_mut().insert(PlayerId(player_id));

    Ok(next.run(req).await)
}

fn to_uuid(value: String) -> Result<Uuid, ServerError> {
    value.parse().map_err(|_| {
        ServerError::Api(
            StatusCode::UNAUTHORIZED,
            "Player id is invalid format".into(),
        )
    })
}

fn extract_header(key: &str, header_map: &HeaderMap) -> Option<String> {
    header_map
        .get(key)
        .and_then(|header| header.to_str().ok())
        .map(|s| s.to_owned())
}
