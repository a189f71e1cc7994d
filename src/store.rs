//! Client-side bet collection with optimistic updates.
//!
//! `BetStore` is plain state: every update consumes the store and returns the
//! next one, recomputing the headline stats on the way. Remote mutations go
//! through three steps:
//!
//! 1. `begin_*` applies the change locally and returns a [`Tentative`] that
//!    holds the snapshot taken before the change.
//! 2. The caller runs the remote operation.
//! 3. [`Tentative::commit`] folds the authoritative record back in, or
//!    [`Tentative::rollback`] restores the snapshot.
//!
//! [`apply`] runs all three steps against a [`RemoteBets`] backend.

use std::future::Future;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::stats::{self, BettingStats};
use crate::types::{Bet, BetResult, NewBet, SettleBet};

pub const TEMP_ID_PREFIX: &str = "temp-";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BetStore {
    bets: Vec<Bet>,
    stats: BettingStats,
    next_temp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanUsage {
    pub used: usize,
    pub limit: usize,
    pub is_at_limit: bool,
}

impl BetStore {
    pub fn new(bets: Vec<Bet>) -> Self {
        Self::default().with_bets(bets)
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn stats(&self) -> &BettingStats {
        &self.stats
    }

    pub fn get(&self, id: &str) -> Option<&Bet> {
        self.bets.iter().find(|b| b.id == id)
    }

    pub fn with_bets(mut self, bets: Vec<Bet>) -> Self {
        self.stats = stats::calculate(&bets);
        self.bets = bets;
        self
    }

    /// Newest bets go first.
    pub fn add(mut self, bet: Bet) -> Self {
        self.bets.insert(0, bet);
        self.refresh()
    }

    pub fn update(mut self, id: &str, patch: &SettleBet) -> Self {
        if let Some(bet) = self.bets.iter_mut().find(|b| b.id == id) {
            bet.apply(patch);
        }
        self.refresh()
    }

    /// Swaps the record with id `id` for `bet`, keeping its position.
    pub fn replace(mut self, id: &str, bet: Bet) -> Self {
        match self.bets.iter_mut().find(|b| b.id == id) {
            Some(slot) => *slot = bet,
            None => self.bets.insert(0, bet),
        }
        self.refresh()
    }

    pub fn remove(mut self, id: &str) -> Self {
        self.bets.retain(|b| b.id != id);
        self.refresh()
    }

    fn refresh(mut self) -> Self {
        self.stats = stats::calculate(&self.bets);
        self
    }

    pub fn free_plan_usage(&self, limit: usize) -> PlanUsage {
        let used = self.bets.len();
        PlanUsage {
            used,
            limit,
            is_at_limit: used >= limit,
        }
    }

    /// `None` selects every settled bet.
    pub fn bets_by_status(&self, status: Option<BetResult>) -> Vec<&Bet> {
        self.bets
            .iter()
            .filter(|b| match status {
                Some(s) => b.result == Some(s),
                None => b.is_settled(),
            })
            .collect()
    }

    pub fn bets_by_sport(&self, sport: &str) -> Vec<&Bet> {
        self.bets.iter().filter(|b| b.sport == sport).collect()
    }

    pub fn begin_create(mut self, draft: NewBet) -> (Self, Tentative) {
        let snapshot = self.bets.clone();
        self.next_temp += 1;
        let temp_id = format!("{}{}", TEMP_ID_PREFIX, self.next_temp);

        let store = self.add(Bet::from_new(temp_id.clone(), draft));
        (store, Tentative::new(Change::Create { temp_id }, snapshot))
    }

    pub fn begin_update(self, id: &str, patch: &SettleBet) -> (Self, Tentative) {
        let snapshot = self.bets.clone();
        let store = self.update(id, patch);
        (store, Tentative::new(Change::Update { id: id.to_string() }, snapshot))
    }

    pub fn begin_delete(self, id: &str) -> (Self, Tentative) {
        let snapshot = self.bets.clone();
        let store = self.remove(id);
        (store, Tentative::new(Change::Delete { id: id.to_string() }, snapshot))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Create { temp_id: String },
    Update { id: String },
    Delete { id: String },
}

/// A local change that has not been confirmed by the remote side yet.
#[derive(Debug, Clone)]
#[must_use = "a tentative change must be committed or rolled back"]
pub struct Tentative {
    change: Change,
    snapshot: Vec<Bet>,
}

/// The store after a failed remote call, already restored to its snapshot.
#[derive(Debug)]
pub struct Rollback {
    pub store: BetStore,
    pub error: AppError,
}

impl Tentative {
    fn new(change: Change, snapshot: Vec<Bet>) -> Self {
        Self { change, snapshot }
    }

    pub fn change(&self) -> &Change {
        &self.change
    }

    pub fn commit(self, store: BetStore, authoritative: Option<Bet>) -> BetStore {
        match (self.change, authoritative) {
            (Change::Create { temp_id }, Some(bet)) => store.replace(&temp_id, bet),
            (Change::Update { id }, Some(bet)) => store.replace(&id, bet),
            _ => store,
        }
    }

    pub fn rollback(self, store: BetStore) -> BetStore {
        store.with_bets(self.snapshot)
    }

    pub fn settle(
        self,
        store: BetStore,
        outcome: AppResult<Option<Bet>>,
    ) -> Result<BetStore, Rollback> {
        match outcome {
            Ok(bet) => Ok(self.commit(store, bet)),
            Err(error) => {
                tracing::warn!(change = ?self.change, "remote update failed, rolling back: {}", error);
                Err(Rollback {
                    store: self.rollback(store),
                    error,
                })
            }
        }
    }
}

/// Authoritative bet storage that optimistic changes are confirmed against.
pub trait RemoteBets {
    fn create(&self, draft: NewBet) -> impl Future<Output = AppResult<Bet>> + Send;

    fn settle(&self, id: &str, patch: SettleBet) -> impl Future<Output = AppResult<Bet>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = AppResult<()>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create(NewBet),
    Settle { id: String, patch: SettleBet },
    Delete { id: String },
}

pub async fn apply<R: RemoteBets>(
    store: BetStore,
    remote: &R,
    mutation: Mutation,
) -> Result<BetStore, Rollback> {
    match mutation {
        Mutation::Create(draft) => {
            let (store, tentative) = store.begin_create(draft.clone());
            let outcome = remote.create(draft).await.map(Some);
            tentative.settle(store, outcome)
        }
        Mutation::Settle { id, patch } => {
            let (store, tentative) = store.begin_update(&id, &patch);
            let outcome = remote.settle(&id, patch).await.map(Some);
            tentative.settle(store, outcome)
        }
        Mutation::Delete { id } => {
            let (store, tentative) = store.begin_delete(&id);
            let outcome = remote.delete(&id).await.map(|_| None);
            tentative.settle(store, outcome)
        }
    }
}
