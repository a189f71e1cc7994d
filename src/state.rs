use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::repository::BetRepository;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn bets(&self) -> BetRepository {
        BetRepository::new(self.db.clone()).with_limit(self.config.bet_limit())
    }
}
