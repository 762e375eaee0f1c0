use ::config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub static CONFIG: Lazy<AppConfig> =
    Lazy::new(|| AppConfig::load().unwrap_or_else(|e| panic!("Failed to load config: {}", e)));

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub game: GameConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub page_size: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub seed_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub time_limit_minutes: i64,
    pub fireproof_payout: bool,
}

impl AppConfig {
    /// Defaults, then `config/default.toml`, then `MILLIONAIRE__*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.address", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.page_size", 20)?
            .set_default("server.log_level", "debug")?
            .set_default("storage.backend", "postgres")?
            .set_default("game.time_limit_minutes", 35)?
            .set_default("game.fireproof_payout", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("MILLIONAIRE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
