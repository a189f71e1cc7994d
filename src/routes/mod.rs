use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub mod bets;
pub mod export;
pub mod stats;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bets", get(bets::list_bets).post(bets::create_bet))
        .route("/bets/stats", get(stats::get_stats))
        .route("/bets/export", get(export::export_bets))
        .route("/bets/:id", put(bets::update_bet).delete(bets::delete_bet))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
