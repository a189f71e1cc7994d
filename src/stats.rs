//! Performance statistics over a collection of bets.
//!
//! Every function here is pure: it borrows the caller's slice, skips records
//! whose stake or odds are not finite, and returns freshly built values.
//! Money and percentages are kept at full precision while accumulating and
//! rounded to two decimals only when the output record is built.
//!
//! The headline figures and the per-sport breakdown deliberately use
//! different conventions: the headline win rate counts pushes in its
//! denominator and averages signed odds, while the per-sport win rate
//! excludes pushes and averages absolute odds.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::types::{Bet, BetResult, BetType};

/// Headline totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BettingStats {
    /// Settled bets only.
    pub total_bets: usize,
    pub total_staked: f64,
    /// Payouts of winning bets. Pushes return their stake but are not counted.
    pub total_returns: f64,
    pub net_profit: f64,
    pub roi: f64,
    pub win_rate: f64,
    pub avg_odds: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub total_bets: usize,
    pub settled_bets: usize,
    pub pending_bets: usize,
    pub average_stake: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SportStats {
    pub sport: String,
    pub total_bets: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    pub win_rate: f64,
    pub total_staked: f64,
    pub total_payout: f64,
    pub net_profit: f64,
    pub roi: f64,
    pub average_odds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStats {
    /// `YYYY-MM`
    pub month: String,
    pub total_bets: usize,
    pub net_profit: f64,
    pub win_rate: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetTypeStats {
    pub bet_type: BetType,
    pub total: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub best_win_streak: u32,
    pub best_loss_streak: u32,
    /// Positive for a running win streak, negative for a running loss streak.
    pub current_streak: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
    pub totals: BettingStats,
    pub overview: Overview,
    pub by_sport: Vec<SportStats>,
    pub by_month: Vec<MonthlyStats>,
    pub by_bet_type: Vec<BetTypeStats>,
    pub streaks: Streaks,
}

pub fn summarize(bets: &[Bet]) -> StatsReport {
    StatsReport {
        totals: calculate(bets),
        overview: overview(bets),
        by_sport: by_sport(bets),
        by_month: by_month(bets),
        by_bet_type: by_bet_type(bets),
        streaks: streaks(bets),
    }
}

/// Rounds to two decimals, halves away from zero.
pub fn round2(value: f64) -> f64 {
    // `+ 0.0` folds negative zero into zero.
    (value * 100.0).round() / 100.0 + 0.0
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

fn well_formed(bets: &[Bet]) -> impl Iterator<Item = &Bet> {
    bets.iter().filter(|b| b.is_well_formed())
}

/// Well-formed bets in ascending date order. Ties keep their input order.
fn chronological(bets: &[Bet]) -> Vec<&Bet> {
    let mut sorted: Vec<&Bet> = well_formed(bets).collect();
    sorted.sort_by_key(|b| b.date);
    sorted
}

pub fn calculate(bets: &[Bet]) -> BettingStats {
    let mut total_staked = 0.0;
    let mut total_returns = 0.0;
    let mut odds_sum = 0.0;
    let mut settled = 0usize;
    let mut wins = 0usize;

    for bet in well_formed(bets) {
        total_staked += bet.stake;

        let Some(result) = bet.result else { continue };
        settled += 1;
        odds_sum += bet.odds;
        if result == BetResult::Win {
            wins += 1;
            total_returns += bet.payout.unwrap_or(0.0);
        }
    }

    let net_profit = total_returns - total_staked;
    let avg_odds = if settled > 0 { odds_sum / settled as f64 } else { 0.0 };

    BettingStats {
        total_bets: settled,
        total_staked: round2(total_staked),
        total_returns: round2(total_returns),
        net_profit: round2(net_profit),
        roi: round2(percent(net_profit, total_staked)),
        win_rate: round2(percent(wins as f64, settled as f64)),
        avg_odds: round2(avg_odds),
    }
}

pub fn overview(bets: &[Bet]) -> Overview {
    let mut total = 0usize;
    let mut settled = 0usize;
    let mut staked = 0.0;
    let mut largest_win: f64 = 0.0;
    let mut largest_loss: f64 = 0.0;

    for bet in well_formed(bets) {
        total += 1;
        staked += bet.stake;
        match bet.result {
            Some(BetResult::Win) => {
                settled += 1;
                largest_win = largest_win.max(bet.profit());
            }
            Some(BetResult::Loss) => {
                settled += 1;
                largest_loss = largest_loss.max(bet.stake);
            }
            Some(BetResult::Push) => settled += 1,
            None => {}
        }
    }

    Overview {
        total_bets: total,
        settled_bets: settled,
        pending_bets: total - settled,
        average_stake: round2(if total > 0 { staked / total as f64 } else { 0.0 }),
        largest_win: round2(largest_win),
        largest_loss: round2(largest_loss),
    }
}

#[derive(Default)]
struct SportTally {
    total_bets: usize,
    wins: usize,
    losses: usize,
    pushes: usize,
    staked: f64,
    payout: f64,
    abs_odds: f64,
}

/// One record per sport, most-bet sport first. Sports with equal counts keep
/// the order in which they first appear chronologically.
pub fn by_sport(bets: &[Bet]) -> Vec<SportStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, SportTally> = HashMap::new();

    for bet in chronological(bets) {
        let tally = tallies.entry(bet.sport.as_str()).or_insert_with(|| {
            order.push(bet.sport.as_str());
            SportTally::default()
        });

        tally.total_bets += 1;
        tally.staked += bet.stake;
        tally.abs_odds += bet.odds.abs();

        match bet.result {
            Some(BetResult::Win) => {
                tally.wins += 1;
                tally.payout += bet.payout.unwrap_or(0.0);
            }
            Some(BetResult::Loss) => tally.losses += 1,
            Some(BetResult::Push) => {
                tally.pushes += 1;
                tally.payout += bet.stake;
            }
            None => {}
        }
    }

    let mut out: Vec<SportStats> = order
        .into_iter()
        .filter_map(|sport| {
            let t = tallies.remove(sport)?;
            let net_profit = t.payout - t.staked;
            Some(SportStats {
                sport: sport.to_string(),
                total_bets: t.total_bets,
                wins: t.wins,
                losses: t.losses,
                pushes: t.pushes,
                win_rate: round2(percent(t.wins as f64, (t.wins + t.losses) as f64)),
                total_staked: round2(t.staked),
                total_payout: round2(t.payout),
                net_profit: round2(net_profit),
                roi: round2(percent(net_profit, t.staked)),
                average_odds: round2(t.abs_odds / t.total_bets as f64),
            })
        })
        .collect();

    out.sort_by(|a, b| b.total_bets.cmp(&a.total_bets));
    out
}

#[derive(Default)]
struct MonthTally {
    total_bets: usize,
    net_profit: f64,
    wins: usize,
    losses: usize,
    settled_stake: f64,
}

/// One record per calendar month, oldest first.
pub fn by_month(bets: &[Bet]) -> Vec<MonthlyStats> {
    let mut tallies: BTreeMap<String, MonthTally> = BTreeMap::new();

    for bet in well_formed(bets) {
        let tally = tallies
            .entry(bet.date.format("%Y-%m").to_string())
            .or_default();

        tally.total_bets += 1;
        let Some(result) = bet.result else { continue };

        tally.settled_stake += bet.stake;
        tally.net_profit += bet.profit();
        match result {
            BetResult::Win => tally.wins += 1,
            BetResult::Loss => tally.losses += 1,
            BetResult::Push => {}
        }
    }

    tallies
        .into_iter()
        .map(|(month, t)| MonthlyStats {
            month,
            total_bets: t.total_bets,
            net_profit: round2(t.net_profit),
            win_rate: round2(percent(t.wins as f64, (t.wins + t.losses) as f64)),
            roi: round2(percent(t.net_profit, t.settled_stake)),
        })
        .collect()
}

/// Settled bets grouped by bet type. Pushes count towards `total`.
pub fn by_bet_type(bets: &[Bet]) -> Vec<BetTypeStats> {
    let mut tallies: BTreeMap<BetType, (usize, usize, f64)> = BTreeMap::new();

    for bet in well_formed(bets).filter(|b| b.is_settled()) {
        let (total, wins, profit) = tallies.entry(bet.bet_type).or_default();
        *total += 1;
        if bet.result == Some(BetResult::Win) {
            *wins += 1;
        }
        *profit += bet.profit();
    }

    tallies
        .into_iter()
        .map(|(bet_type, (total, wins, profit))| BetTypeStats {
            bet_type,
            total,
            wins,
            win_rate: round2(percent(wins as f64, total as f64)),
            profit: round2(profit),
        })
        .collect()
}

pub fn streaks(bets: &[Bet]) -> Streaks {
    let mut wins = 0u32;
    let mut losses = 0u32;
    let mut out = Streaks::default();

    for bet in chronological(bets) {
        match bet.result {
            Some(BetResult::Win) => {
                wins += 1;
                losses = 0;
                out.best_win_streak = out.best_win_streak.max(wins);
            }
            Some(BetResult::Loss) => {
                losses += 1;
                wins = 0;
                out.best_loss_streak = out.best_loss_streak.max(losses);
            }
            // pushes and pending bets leave both runs untouched
            Some(BetResult::Push) | None => {}
        }
    }

    out.current_streak = if wins > 0 {
        i64::from(wins)
    } else {
        -i64::from(losses)
    };
    out
}
