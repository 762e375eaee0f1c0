use std::{str::FromStr, sync::Arc};

use axum::{Router, middleware::from_fn};
use dotenv::dotenv;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::FmtSubscriber;

use crate::{
    common::app_state::AppState,
    config::config::{CONFIG, StorageBackend},
    game::{db::PgBackend, handlers::game_routes, memory::MemoryBackend, store::GameBackend},
    health::handlers::health_routes,
    mw::{player_mw::player_mw, request_mw::request_mw},
    player::handlers::player_routes,
};

mod common;
mod config;
mod game;
mod health;
mod mw;
mod player;
mod question;

#[cfg(test)]
mod tests;

pub fn app<B: GameBackend>(state: Arc<AppState<B>>) -> Router {
    let public_routes = Router::new().nest("/health", health_routes(state.clone()));

    let player_routes = Router::new()
        .nest("/games", game_routes(state.clone()))
        .nest("/player", player_routes(state))
        .layer(from_fn(player_mw));

    Router::new()
        .merge(player_routes)
        .merge(public_routes)
        .layer(from_fn(request_mw))
}

async fn serve(app: Router) {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", CONFIG.server.address, CONFIG.server.port))
            .await
            .unwrap();

    info!(
        "Server listening on address: {}",
        listener.local_addr().unwrap()
    );
    axum::serve(listener, app).await.unwrap();
}

#[tokio::main]
async fn main() {
    // Initialize .env
    dotenv().ok();

    // Initialize logging
    let level = LevelFilter::from_str(&CONFIG.server.log_level).unwrap_or(LevelFilter::DEBUG);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing");

    // Initialize state and routes
    let router = match CONFIG.storage.backend {
        StorageBackend::Postgres => {
            let url = CONFIG
                .database_url
                .as_deref()
                .expect("database_url is required for the postgres backend");

            let backend = PgBackend::from_connection_string(url)
                .await
                .unwrap_or_else(|e| panic!("{}", e));

            app(AppState::from_backend(backend))
        }
        StorageBackend::Memory => {
            let backend = match &CONFIG.storage.seed_path {
                Some(path) => MemoryBackend::from_seed_file(path).unwrap_or_else(|e| panic!("{}", e)),
                None => MemoryBackend::new(),
            };

            app(AppState::from_backend(backend))
        }
    };

    serve(router).await;
}
