pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod repository;
pub mod routes;
pub mod state;
pub mod stats;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use axum::Router;
use state::AppState;

pub fn app(state: AppState) -> Router {
    routes::router(state)
}
