use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const MAX_SPORT_LEN: usize = 50;
pub const MAX_SIDE_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 500;
pub const MAX_STAKE: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetType {
    Moneyline,
    Spread,
    OverUnder,
    Prop,
}

impl BetType {
    pub const ALL: [BetType; 4] = [
        BetType::Moneyline,
        BetType::Spread,
        BetType::OverUnder,
        BetType::Prop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Moneyline => "moneyline",
            BetType::Spread => "spread",
            BetType::OverUnder => "over_under",
            BetType::Prop => "prop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetResult {
    Win,
    Loss,
    Push,
}

impl BetResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetResult::Win => "win",
            BetResult::Loss => "loss",
            BetResult::Push => "push",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "win" => Some(BetResult::Win),
            "loss" => Some(BetResult::Loss),
            "push" => Some(BetResult::Push),
            _ => None,
        }
    }
}

/// A single tracked wager. `result` and `payout` stay `None` until settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub sport: String,
    pub team: String,
    pub opponent: String,
    pub bet_type: BetType,
    pub odds: f64,
    pub stake: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<BetResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Bet {
    pub fn from_new(id: String, new: NewBet) -> Self {
        Self {
            id,
            sport: new.sport,
            team: new.team,
            opponent: new.opponent,
            bet_type: new.bet_type,
            odds: new.odds,
            stake: new.stake,
            result: None,
            payout: None,
            date: new.date,
            notes: new.notes,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.result.is_some()
    }

    /// Stake and odds are both finite numbers.
    pub fn is_well_formed(&self) -> bool {
        self.stake.is_finite() && self.odds.is_finite()
    }

    /// Realized profit: payout minus stake on a win, minus stake on a loss,
    /// zero for a push or a pending bet.
    pub fn profit(&self) -> f64 {
        match self.result {
            Some(BetResult::Win) => self.payout.unwrap_or(0.0) - self.stake,
            Some(BetResult::Loss) => -self.stake,
            Some(BetResult::Push) | None => 0.0,
        }
    }

    pub fn potential_profit(&self) -> f64 {
        potential_profit(self.stake, self.odds)
    }

    pub fn potential_payout(&self) -> f64 {
        self.stake + self.potential_profit()
    }

    /// Merges a settlement patch. A new result resets the payout to what that
    /// result implies unless the patch carries its own payout.
    pub fn apply(&mut self, patch: &SettleBet) {
        if let Some(result) = patch.result {
            self.result = Some(result);
            match result {
                BetResult::Loss => self.payout = None,
                BetResult::Push => self.payout = Some(self.stake),
                BetResult::Win => {}
            }
        }
        if let Some(payout) = patch.payout {
            self.payout = Some(payout);
        }
    }
}

/// Profit on a winning bet at American odds.
///
/// Positive odds are the profit on a 100 stake, negative odds are the stake
/// needed to win 100.
pub fn potential_profit(stake: f64, odds: f64) -> f64 {
    if odds > 0.0 {
        stake * (odds / 100.0)
    } else {
        stake * (100.0 / odds.abs())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBet {
    pub sport: String,
    pub team: String,
    pub opponent: String,
    pub bet_type: BetType,
    pub odds: f64,
    pub stake: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewBet {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();

        check_len(&mut errors, "sport", &self.sport, MAX_SPORT_LEN);
        check_len(&mut errors, "team", &self.team, MAX_SIDE_LEN);
        check_len(&mut errors, "opponent", &self.opponent, MAX_SIDE_LEN);

        if !self.odds.is_finite() || self.odds == 0.0 {
            errors.push("odds must be a finite, non-zero number".to_string());
        }
        if !self.stake.is_finite() || self.stake <= 0.0 {
            errors.push("stake must be greater than 0".to_string());
        } else if self.stake > MAX_STAKE {
            errors.push(format!("stake must be at most {}", MAX_STAKE));
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                errors.push(format!("notes must be at most {} characters", MAX_NOTES_LEN));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors.join("; ")))
        }
    }
}

fn check_len(errors: &mut Vec<String>, field: &str, value: &str, max: usize) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.push(format!("{} is required", field));
    } else if value.chars().count() > max {
        errors.push(format!("{} must be at most {} characters", field, max));
    }
}

/// Settlement patch. Both fields are optional so a client can send them
/// separately, but the merged record must stay consistent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SettleBet {
    #[serde(default)]
    pub result: Option<BetResult>,
    #[serde(default)]
    pub payout: Option<f64>,
}

impl SettleBet {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(payout) = self.payout {
            if !payout.is_finite() || payout <= 0.0 {
                return Err(AppError::Validation(
                    "payout must be a positive number".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Checks the record that results from applying this patch to `bet`.
    pub fn validate_against(&self, bet: &Bet) -> Result<(), AppError> {
        self.validate()?;

        let mut merged = bet.clone();
        merged.apply(self);

        match (merged.result, merged.payout) {
            (None, Some(_)) => Err(AppError::Validation(
                "payout requires a result".to_string(),
            )),
            (Some(BetResult::Loss), Some(p)) if p > 0.0 => Err(AppError::Validation(
                "a lost bet cannot have a payout".to_string(),
            )),
            (Some(BetResult::Push), Some(p)) if (p - merged.stake).abs() > 1e-9 => {
                Err(AppError::Validation(
                    "a push pays back exactly the stake".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBetsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sport: Option<String>,
    pub result: Option<BetResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BetPage {
    pub bets: Vec<Bet>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Persisted form of a bet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BetRow {
    pub id: String,
    pub sport: String,
    pub team: String,
    pub opponent: String,
    pub bet_type: String,
    pub odds: f64,
    pub stake: f64,
    pub result: Option<String>,
    pub payout: Option<f64>,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BetRow> for Bet {
    type Error = AppError;

    fn try_from(row: BetRow) -> Result<Self, Self::Error> {
        let bet_type = BetType::parse(&row.bet_type)
            .ok_or_else(|| AppError::Internal(format!("unknown bet type {:?}", row.bet_type)))?;
        let result = match row.result.as_deref() {
            Some(r) => Some(
                BetResult::parse(r)
                    .ok_or_else(|| AppError::Internal(format!("unknown result {:?}", r)))?,
            ),
            None => None,
        };

        Ok(Bet {
            id: row.id,
            sport: row.sport,
            team: row.team,
            opponent: row.opponent,
            bet_type,
            odds: row.odds,
            stake: row.stake,
            result,
            payout: row.payout,
            date: row.date,
            notes: row.notes,
        })
    }
}
