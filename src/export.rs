use crate::types::{Bet, BetResult};

const HEADERS: [&str; 11] = [
    "Date",
    "Sport",
    "Team",
    "Opponent",
    "Bet Type",
    "Odds",
    "Stake",
    "Result",
    "Payout",
    "Profit/Loss",
    "Notes",
];

/// Renders bets as CSV with every field quoted.
pub fn to_csv(bets: &[Bet]) -> String {
    let mut lines = Vec::with_capacity(bets.len() + 1);
    lines.push(row(HEADERS.iter().map(|h| h.to_string())));

    for bet in bets {
        let profit = match bet.result {
            Some(BetResult::Win) | Some(BetResult::Loss) => format!("{:.2}", bet.profit()),
            _ => "0.00".to_string(),
        };

        lines.push(row([
            bet.date.to_string(),
            bet.sport.clone(),
            bet.team.clone(),
            bet.opponent.clone(),
            bet.bet_type.as_str().to_string(),
            bet.odds.to_string(),
            bet.stake.to_string(),
            bet.result.map_or("Pending", |r| r.as_str()).to_string(),
            bet.payout.map(|p| p.to_string()).unwrap_or_default(),
            profit,
            bet.notes.clone().unwrap_or_default(),
        ]));
    }

    lines.join("\n")
}

fn row(fields: impl IntoIterator<Item = String>) -> String {
    fields
        .into_iter()
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
