use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::state::AppState;
use crate::stats::{self, StatsReport};

pub async fn get_stats(State(state): State<AppState>) -> AppResult<Json<StatsReport>> {
    let bets = state.bets().all().await?;
    Ok(Json(stats::summarize(&bets)))
}
