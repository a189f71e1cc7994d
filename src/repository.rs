use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::RemoteBets;
use crate::types::{Bet, BetResult, BetRow, NewBet, SettleBet};

const SELECT_BETS: &str = r#"
    SELECT id, sport, team, opponent, bet_type, odds, stake, result, payout, date, notes, created_at
    FROM bets
"#;

#[derive(Debug, Clone, Default)]
pub struct BetFilter {
    pub sport: Option<String>,
    pub result: Option<BetResult>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Clone)]
pub struct BetRepository {
    pool: SqlitePool,
    limit: Option<i64>,
}

impl BetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, limit: None }
    }

    /// Caps the number of stored bets. `None` means unlimited.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        self
    }

    /// Inserts the bet unless the cap is already reached. The count and the
    /// insert run as a single statement.
    pub async fn create(&self, new: NewBet) -> AppResult<Bet> {
        let bet = Bet::from_new(Uuid::new_v4().to_string(), new);

        let res = sqlx::query(
            r#"
            INSERT INTO bets
            (id, sport, team, opponent, bet_type, odds, stake, result, payout, date, notes, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, NULL, ?8, ?9, ?10
            WHERE ?11 IS NULL OR (SELECT COUNT(*) FROM bets) < ?11
            "#,
        )
        .bind(&bet.id)
        .bind(&bet.sport)
        .bind(&bet.team)
        .bind(&bet.opponent)
        .bind(bet.bet_type.as_str())
        .bind(bet.odds)
        .bind(bet.stake)
        .bind(bet.date)
        .bind(&bet.notes)
        // fixed-width timestamps keep text ordering chronological
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(self.limit)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            tracing::warn!(limit = ?self.limit, "bet limit reached");
            return Err(AppError::PlanLimit);
        }

        tracing::info!(id = %bet.id, sport = %bet.sport, stake = bet.stake, "bet created");

        Ok(bet)
    }

    /// Newest first, with the total number of matching rows.
    pub async fn list(&self, filter: &BetFilter) -> AppResult<(Vec<Bet>, i64)> {
        let sport = filter.sport.as_deref();
        let result = filter.result.map(|r| r.as_str());

        let rows: Vec<BetRow> = sqlx::query_as(&format!(
            r#"
            {SELECT_BETS}
            WHERE (?1 IS NULL OR sport = ?1)
              AND (?2 IS NULL OR result = ?2)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?3 OFFSET ?4
            "#
        ))
        .bind(sport)
        .bind(result)
        .bind(i64::from(filter.limit))
        .bind(i64::from(filter.offset))
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM bets
            WHERE (?1 IS NULL OR sport = ?1)
              AND (?2 IS NULL OR result = ?2)
            "#,
        )
        .bind(sport)
        .bind(result)
        .fetch_one(&self.pool)
        .await?;

        let bets = rows
            .into_iter()
            .map(Bet::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((bets, total))
    }

    /// Every bet, newest first.
    pub async fn all(&self) -> AppResult<Vec<Bet>> {
        let rows: Vec<BetRow> = sqlx::query_as(&format!(
            "{SELECT_BETS} ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Bet::try_from).collect()
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<Bet>> {
        let row: Option<BetRow> = sqlx::query_as(&format!("{SELECT_BETS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Bet::try_from).transpose()
    }

    pub async fn count(&self) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn settle(&self, id: &str, patch: &SettleBet) -> AppResult<Bet> {
        let mut bet = self
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Bet".to_string()))?;

        patch.validate_against(&bet)?;
        bet.apply(patch);

        sqlx::query("UPDATE bets SET result = ?, payout = ? WHERE id = ?")
            .bind(bet.result.map(|r| r.as_str()))
            .bind(bet.payout)
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            id = %bet.id,
            result = ?bet.result,
            payout = ?bet.payout,
            "bet settled"
        );

        Ok(bet)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM bets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Bet".to_string()));
        }

        tracing::info!(id = %id, "bet deleted");

        Ok(())
    }
}

impl RemoteBets for BetRepository {
    async fn create(&self, draft: NewBet) -> AppResult<Bet> {
        draft.validate()?;
        BetRepository::create(self, draft).await
    }

    async fn settle(&self, id: &str, patch: SettleBet) -> AppResult<Bet> {
        BetRepository::settle(self, id, &patch).await
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        BetRepository::delete(self, id).await
    }
}
