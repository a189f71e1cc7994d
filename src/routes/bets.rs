use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::error::AppResult;
use crate::repository::BetFilter;
use crate::state::AppState;
use crate::types::{Bet, BetPage, ListBetsQuery, MessageResponse, NewBet, Pagination, SettleBet};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 100;

pub async fn list_bets(
    State(state): State<AppState>,
    Query(query): Query<ListBetsQuery>,
) -> AppResult<Json<BetPage>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let filter = BetFilter {
        sport: query.sport,
        result: query.result,
        limit,
        offset: (page - 1).saturating_mul(limit),
    };

    let (bets, total) = state.bets().list(&filter).await?;
    let pages = (total + i64::from(limit) - 1) / i64::from(limit);

    Ok(Json(BetPage {
        bets,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    }))
}

pub async fn create_bet(
    State(state): State<AppState>,
    Json(payload): Json<NewBet>,
) -> AppResult<(StatusCode, Json<Bet>)> {
    payload.validate()?;
    let bet = state.bets().create(payload).await?;

    Ok((StatusCode::CREATED, Json(bet)))
}

pub async fn update_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<SettleBet>,
) -> AppResult<Json<Bet>> {
    payload.validate()?;
    let bet = state.bets().settle(&id, &payload).await?;
    Ok(Json(bet))
}

pub async fn delete_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.bets().delete(&id).await?;

    Ok(Json(MessageResponse {
        message: "Bet deleted successfully".to_string(),
    }))
}
