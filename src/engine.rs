// Command/query surface of the settlement engine
//
// Commands validate, commit under the target market's lock, and only then
// append to the activity log. Queries go straight to the facade.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::activity::{ActivityEntry, ActivityKind, ActivityLog};
use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::market_resolve::{
    Bet, BetId, MarketFilter, MarketId, MarketStore, PayoutCalculator, PoolAccountant,
    ResolutionAuthority, StoreSnapshot,
};
use crate::query::{LeaderboardEntry, LeaderboardSort, MarketView, QueryFacade, UserStats};

/// Returned by a successful `place_bet`
#[derive(Debug, Clone, Serialize)]
pub struct BetReceipt {
    pub bet_id: BetId,
    pub market_id: MarketId,
    pub bettor: String,
    pub is_yes: bool,
    pub amount: u64,
    pub yes_pool: u64,
    pub no_pool: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub yes_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub no_percentage: Decimal,
}

/// Everything needed to bring an engine back after a restart
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub store: StoreSnapshot,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

pub struct PredictionEngine {
    store: Arc<MarketStore>,
    resolver: ResolutionAuthority,
    payouts: PayoutCalculator,
    queries: QueryFacade,
    activity: ActivityLog,
}

impl PredictionEngine {
    pub fn new(clock: Arc<dyn Clock>, activity_capacity: usize) -> Self {
        Self::assemble(MarketStore::new(clock), ActivityLog::new(activity_capacity))
    }

    pub fn from_snapshot(
        snapshot: EngineSnapshot,
        clock: Arc<dyn Clock>,
        activity_capacity: usize,
    ) -> EngineResult<Self> {
        let store = MarketStore::restore(snapshot.store, clock)?;
        let activity = ActivityLog::with_entries(activity_capacity, snapshot.activity);
        Ok(Self::assemble(store, activity))
    }

    fn assemble(store: MarketStore, activity: ActivityLog) -> Self {
        let store = Arc::new(store);
        Self {
            resolver: ResolutionAuthority::new(store.clone()),
            payouts: PayoutCalculator::new(store.clone()),
            queries: QueryFacade::new(store.clone()),
            store,
            activity,
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            store: self.store.snapshot(),
            activity: self.activity.entries(),
        }
    }

    pub fn store(&self) -> &Arc<MarketStore> {
        &self.store
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    pub fn create_market(&self, question: &str, end_time: u64, caller: &str) -> EngineResult<MarketId> {
        let caller = require_identity(caller)?;
        let id = self.store.create(question, end_time, caller)?;

        info!(market_id = id, creator = caller, end_time, "market created");
        self.activity
            .record(ActivityEntry::new(ActivityKind::Create, id, caller, self.store.now()));
        Ok(id)
    }

    pub fn place_bet(
        &self,
        market_id: MarketId,
        caller: &str,
        is_yes: bool,
        amount: u64,
    ) -> EngineResult<BetReceipt> {
        let caller = require_identity(caller)?;
        let (bet, pools) = self.store.place_bet(market_id, caller, is_yes, amount)?;
        let (yes_percentage, no_percentage) =
            PoolAccountant::percentages(pools.yes_pool, pools.no_pool);

        debug!(market_id, bet_id = bet.id, is_yes, amount, "bet accepted");
        self.activity.record(
            ActivityEntry::new(ActivityKind::Bet, market_id, caller, bet.placed_at)
                .with_amount(amount)
                .with_outcome(is_yes),
        );

        Ok(BetReceipt {
            bet_id: bet.id,
            market_id,
            bettor: bet.bettor,
            is_yes,
            amount,
            yes_pool: pools.yes_pool,
            no_pool: pools.no_pool,
            yes_percentage,
            no_percentage,
        })
    }

    pub fn resolve_market(&self, market_id: MarketId, outcome: bool, caller: &str) -> EngineResult<()> {
        self.resolver.resolve(market_id, outcome, caller)?;

        info!(market_id, outcome, "market resolved");
        self.activity.record(
            ActivityEntry::new(ActivityKind::Resolve, market_id, caller, self.store.now())
                .with_outcome(outcome),
        );
        Ok(())
    }

    pub fn claim_winnings(&self, market_id: MarketId, caller: &str) -> EngineResult<u64> {
        let caller = require_identity(caller)?;
        let amount = self.payouts.claim(market_id, caller)?;

        info!(market_id, bettor = caller, amount, "winnings claimed");
        self.activity.record(
            ActivityEntry::new(ActivityKind::Claim, market_id, caller, self.store.now())
                .with_amount(amount),
        );
        Ok(amount)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn get_markets(&self, filter: MarketFilter, search: Option<&str>) -> Vec<MarketView> {
        self.queries.get_markets(filter, search)
    }

    pub fn get_market(&self, id: MarketId) -> EngineResult<MarketView> {
        self.queries.get_market(id)
    }

    pub fn get_user_bets(&self, market_id: MarketId, identity: &str) -> Vec<Bet> {
        self.queries.get_user_bets(market_id, identity)
    }

    pub fn get_user_stats(&self, identity: &str) -> UserStats {
        self.queries.get_user_stats(identity)
    }

    pub fn leaderboard(&self, sort: LeaderboardSort, limit: Option<usize>) -> Vec<LeaderboardEntry> {
        self.queries.leaderboard(sort, limit)
    }

    pub fn claimable(&self, market_id: MarketId, identity: &str) -> EngineResult<u64> {
        self.payouts.claimable(market_id, identity)
    }

    pub fn history(&self, identity: &str, limit: usize) -> Vec<ActivityEntry> {
        self.activity.history(identity, limit)
    }

    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        self.activity.recent(limit)
    }
}

fn require_identity(identity: &str) -> EngineResult<&str> {
    if identity.trim().is_empty() {
        return Err(EngineError::InvalidInput("caller identity must not be empty".into()));
    }
    Ok(identity)
}
