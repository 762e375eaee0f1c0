use std::sync::Arc;

use crate::{
    config::config::CONFIG,
    game::{models::GameRules, service::GameService, store::GameBackend},
};

pub struct AppState<B: GameBackend> {
    service: GameService<B>,
    page_size: u16,
}

impl<B: GameBackend> AppState<B> {
    pub fn from_backend(backend: B) -> Arc<Self> {
        let rules = GameRules::from(&CONFIG.game);
        Self::with_rules(backend, rules, CONFIG.server.page_size)
    }

    pub fn with_rules(backend: B, rules: GameRules, page_size: u16) -> Arc<Self> {
        Arc::new(Self {
            service: GameService::new(backend, rules),
            page_size,
        })
    }

    pub fn get_service(&self) -> &GameService<B> {
        &self.service
    }

    pub fn get_backend(&self) -> &B {
        self.service.backend()
    }

    pub fn get_page_size(&self) -> u16 {
        self.page_size
    }
}
