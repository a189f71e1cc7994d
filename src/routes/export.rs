use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::error::AppResult;
use crate::export::to_csv;
use crate::state::AppState;

pub async fn export_bets(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let bets = state.bets().all().await?;
    let filename = format!(
        "attachment; filename=\"bettracker-export-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );

    tracing::debug!(rows = bets.len(), "exporting bets");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        to_csv(&bets),
    ))
}
