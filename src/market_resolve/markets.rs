use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::bets::{Bet, BetId, BetLedger};
use super::pool::{PoolAccountant, PoolState};
use super::MarketId;
use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};

// ============================================================================
// MARKET
// ============================================================================

/// Binary prediction market with two pari-mutuel pools.
///
/// Lifecycle: Active → Resolved(outcome). Resolution is terminal, and
/// `outcome` is present exactly when `resolved` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub question: String,
    pub creator: String,
    #[serde(flatten)]
    pools: PoolState,
    /// Unix seconds; bets at or after this instant are rejected
    pub end_time: u64,
    pub created_at: u64,
    resolved: bool,
    outcome: Option<bool>,
    resolved_at: Option<u64>,
}

impl Market {
    pub fn pools(&self) -> PoolState {
        self.pools
    }

    pub fn yes_pool(&self) -> u64 {
        self.pools.yes_pool
    }

    pub fn no_pool(&self) -> u64 {
        self.pools.no_pool
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn outcome(&self) -> Option<bool> {
        self.outcome
    }

    pub fn resolved_at(&self) -> Option<u64> {
        self.resolved_at
    }

    /// Whether a bet placed at `now` would be accepted
    pub fn is_open_at(&self, now: u64) -> bool {
        !self.resolved && now < self.end_time
    }

    /// Records the outcome. Only the resolution authority calls this.
    pub(super) fn finalize(&mut self, outcome: bool, at: u64) {
        self.resolved = true;
        self.outcome = Some(outcome);
        self.resolved_at = Some(at);
    }

    fn is_consistent(&self) -> bool {
        self.resolved == self.outcome.is_some()
            && self.resolved == self.resolved_at.is_some()
            && self.pools.yes_pool.checked_add(self.pools.no_pool).is_some()
    }
}

/// Listing filter for `MarketStore::list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketFilter {
    #[default]
    All,
    /// Not yet resolved (expired-but-unresolved markets count as active)
    Active,
    Resolved,
}

impl MarketFilter {
    pub fn matches(&self, market: &Market) -> bool {
        match self {
            MarketFilter::All => true,
            MarketFilter::Active => !market.resolved,
            MarketFilter::Resolved => market.resolved,
        }
    }
}

// ============================================================================
// MARKET SLOT
// ============================================================================

/// One market together with its bets. Everything in a slot is guarded by a
/// single lock, which is what serializes writers per market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSlot {
    pub(super) market: Market,
    #[serde(rename = "bets")]
    pub(super) ledger: BetLedger,
}

impl MarketSlot {
    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn ledger(&self) -> &BetLedger {
        &self.ledger
    }

    /// Validate a bet against the market and commit the new pool totals.
    pub(super) fn apply_bet_to_pools(
        &mut self,
        now: u64,
        is_yes: bool,
        amount: u64,
    ) -> EngineResult<PoolState> {
        if self.market.resolved {
            return Err(EngineError::AlreadyResolved(self.market.id));
        }
        if now >= self.market.end_time {
            return Err(EngineError::MarketExpired {
                market_id: self.market.id,
                end_time: self.market.end_time,
            });
        }

        let pools = PoolAccountant::apply_bet(self.market.pools, is_yes, amount)?;
        self.market.pools = pools;
        Ok(pools)
    }
}

/// Serializable image of the whole store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub next_market_id: MarketId,
    pub next_bet_id: BetId,
    pub markets: Vec<MarketSlot>,
}

// ============================================================================
// MARKET STORE
// ============================================================================

/// Owns every market and its bets.
///
/// The map lock is only held to look up or insert a slot handle; all work on a
/// market happens under that market's own mutex, so markets never contend with
/// each other.
pub struct MarketStore {
    slots: RwLock<BTreeMap<MarketId, Arc<Mutex<MarketSlot>>>>,
    next_market_id: AtomicU64,
    next_bet_id: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl MarketStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: RwLock::new(BTreeMap::new()),
            next_market_id: AtomicU64::new(1),
            next_bet_id: AtomicU64::new(1),
            clock,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Create a market and return its id
    pub fn create(&self, question: &str, end_time: u64, creator: &str) -> EngineResult<MarketId> {
        if question.trim().is_empty() {
            return Err(EngineError::InvalidInput("question must not be empty".into()));
        }
        if creator.trim().is_empty() {
            return Err(EngineError::InvalidInput("creator identity must not be empty".into()));
        }

        let now = self.clock.now();
        if end_time <= now {
            return Err(EngineError::InvalidInput(format!(
                "end time {} is not in the future (now {})",
                end_time, now
            )));
        }

        let mut slots = self.slots.write();
        let id = self.next_market_id.fetch_add(1, Ordering::SeqCst);
        let market = Market {
            id,
            question: question.to_string(),
            creator: creator.to_string(),
            pools: PoolState::default(),
            end_time,
            created_at: now,
            resolved: false,
            outcome: None,
            resolved_at: None,
        };
        slots.insert(id, Arc::new(Mutex::new(MarketSlot { market, ledger: BetLedger::new() })));

        debug!(market_id = id, end_time, "market stored");
        Ok(id)
    }

    pub fn get(&self, id: MarketId) -> EngineResult<Market> {
        self.with_slot(id, |slot| Ok(slot.market.clone()))
    }

    /// Markets matching `filter` and (case-insensitively) `search`, newest first.
    /// The needle is matched as given, surrounding whitespace included.
    pub fn list(&self, filter: MarketFilter, search: Option<&str>) -> Vec<Market> {
        let needle = search.map(str::to_lowercase).filter(|s| !s.is_empty());

        let mut markets = Vec::new();
        for handle in self.handles().into_iter().rev() {
            let slot = handle.lock();
            let market = &slot.market;
            if !filter.matches(market) {
                continue;
            }
            if let Some(needle) = &needle {
                if !market.question.to_lowercase().contains(needle.as_str()) {
                    continue;
                }
            }
            markets.push(market.clone());
        }
        markets
    }

    /// Apply the pool update and append the bet as one step under the market
    /// lock. Validation happens before anything is written, so a failure
    /// leaves both the pools and the ledger untouched.
    pub fn place_bet(
        &self,
        id: MarketId,
        bettor: &str,
        is_yes: bool,
        amount: u64,
    ) -> EngineResult<(Bet, PoolState)> {
        let now = self.clock.now();
        self.with_slot(id, |slot| {
            let pools = slot.apply_bet_to_pools(now, is_yes, amount)?;
            let bet_id = self.next_bet_id.fetch_add(1, Ordering::SeqCst);
            slot.ledger.record(bet_id, id, bettor, is_yes, amount, now);
            let bet = slot
                .ledger
                .get(bet_id)
                .cloned()
                .ok_or_else(|| EngineError::NotFound(format!("bet {}", bet_id)))?;
            Ok((bet, pools))
        })
    }

    /// Bets by `bettor` on one market; empty for unknown markets
    pub fn bets_for(&self, id: MarketId, bettor: &str) -> Vec<Bet> {
        self.with_slot(id, |slot| Ok(slot.ledger.bets_for(bettor)))
            .unwrap_or_default()
    }

    /// Bets by `bettor` across all markets, ordered by bet id
    pub fn all_bets_for(&self, bettor: &str) -> Vec<Bet> {
        let mut bets = Vec::new();
        self.visit(|slot| bets.extend(slot.ledger.bets_for(bettor)));
        bets.sort_by_key(|b| b.id);
        bets
    }

    /// Run `f` with exclusive access to one market
    pub(crate) fn with_slot<R>(
        &self,
        id: MarketId,
        f: impl FnOnce(&mut MarketSlot) -> EngineResult<R>,
    ) -> EngineResult<R> {
        let handle = self
            .slots
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::market_not_found(id))?;
        let mut slot = handle.lock();
        f(&mut slot)
    }

    /// Visit every market in id order, one lock at a time
    pub fn visit(&self, mut f: impl FnMut(&MarketSlot)) {
        for handle in self.handles() {
            let slot = handle.lock();
            f(&slot);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn handles(&self) -> Vec<Arc<Mutex<MarketSlot>>> {
        self.slots.read().values().cloned().collect()
    }

    // ========================================================================
    // SNAPSHOTS
    // ========================================================================

    pub fn snapshot(&self) -> StoreSnapshot {
        let mut markets = Vec::new();
        self.visit(|slot| markets.push(slot.clone()));
        StoreSnapshot {
            next_market_id: self.next_market_id.load(Ordering::SeqCst),
            next_bet_id: self.next_bet_id.load(Ordering::SeqCst),
            markets,
        }
    }

    /// Rebuild a store from a snapshot, rejecting images that break the market
    /// invariants.
    pub fn restore(snapshot: StoreSnapshot, clock: Arc<dyn Clock>) -> EngineResult<Self> {
        let mut slots = BTreeMap::new();
        let mut max_market_id = 0;
        let mut max_bet_id = 0;

        for slot in snapshot.markets {
            let id = slot.market.id;
            if !slot.market.is_consistent() {
                return Err(EngineError::InvalidInput(format!(
                    "snapshot market {} has an inconsistent resolution state",
                    id
                )));
            }
            if slot.ledger.iter().any(|b| b.market_id != id) {
                return Err(EngineError::InvalidInput(format!(
                    "snapshot market {} holds bets of another market",
                    id
                )));
            }
            if slot.ledger.iter().any(|b| b.claimed() != b.payout().is_some()) {
                return Err(EngineError::InvalidInput(format!(
                    "snapshot market {} has bets with a mismatched claim state",
                    id
                )));
            }
            if ledger_pools(&slot.ledger) != Some(slot.market.pools) {
                return Err(EngineError::InvalidInput(format!(
                    "snapshot market {} pools do not match its bets",
                    id
                )));
            }
            max_market_id = max_market_id.max(id);
            max_bet_id = slot.ledger.iter().map(|b| b.id).fold(max_bet_id, u64::max);
            if slots.insert(id, Arc::new(Mutex::new(slot))).is_some() {
                return Err(EngineError::InvalidInput(format!(
                    "snapshot contains market {} twice",
                    id
                )));
            }
        }

        Ok(Self {
            slots: RwLock::new(slots),
            next_market_id: AtomicU64::new(snapshot.next_market_id.max(max_market_id + 1)),
            next_bet_id: AtomicU64::new(snapshot.next_bet_id.max(max_bet_id + 1)),
            clock,
        })
    }
}

/// Pool totals implied by a ledger; `None` when a side overflows
fn ledger_pools(ledger: &BetLedger) -> Option<PoolState> {
    ledger.iter().try_fold(PoolState::default(), |pools, bet| {
        let (yes_pool, no_pool) = if bet.is_yes {
            (pools.yes_pool.checked_add(bet.amount)?, pools.no_pool)
        } else {
            (pools.yes_pool, pools.no_pool.checked_add(bet.amount)?)
        };
        Some(PoolState::new(yes_pool, no_pool))
    })
}

// ============================================================================
// TESTS
// ============================================================================
