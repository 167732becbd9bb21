// Read-only views over the market store
//
// Nothing here mutates state. Every aggregate is recomputed from markets and
// bets on each call, so the numbers can never drift from the ledger.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::EngineResult;
use crate::market_resolve::{
    Bet, Market, MarketFilter, MarketId, MarketStore, PoolAccountant, PERCENTAGE_DP,
};

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

// ============================================================================
// VIEWS
// ============================================================================

/// Market plus the numbers a client displays
#[derive(Debug, Clone, Serialize)]
pub struct MarketView {
    #[serde(flatten)]
    pub market: Market,
    pub total_pool: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub yes_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub no_percentage: Decimal,
    pub betting_open: bool,
}

impl MarketView {
    pub fn new(market: Market, now: u64) -> Self {
        let (yes_percentage, no_percentage) =
            PoolAccountant::percentages(market.yes_pool(), market.no_pool());
        Self {
            total_pool: market.pools().total(),
            betting_open: market.is_open_at(now),
            yes_percentage,
            no_percentage,
            market,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub identity: String,
    pub total_bets: u64,
    /// Bets on markets that have not resolved yet
    pub active_bets: u64,
    /// Sum of payouts already claimed
    pub total_winnings: u64,
    /// Percentage of bets on resolved markets that picked the outcome
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
    pub markets_created: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    #[default]
    Winnings,
    Bets,
    WinRate,
    Created,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub stats: UserStats,
}

#[derive(Debug, Default)]
struct Tally {
    total_bets: u64,
    active_bets: u64,
    resolved_bets: u64,
    won_bets: u64,
    total_winnings: u64,
    markets_created: u64,
}

impl Tally {
    fn add_bet(&mut self, market: &Market, bet: &Bet) {
        self.total_bets += 1;
        match market.outcome() {
            None => self.active_bets += 1,
            Some(outcome) => {
                self.resolved_bets += 1;
                if bet.is_yes == outcome {
                    self.won_bets += 1;
                }
            }
        }
        if let Some(payout) = bet.payout() {
            self.total_winnings = self.total_winnings.saturating_add(payout);
        }
    }

    fn into_stats(self, identity: String) -> UserStats {
        let win_rate = if self.resolved_bets == 0 {
            dec!(0)
        } else {
            (Decimal::from(self.won_bets) * dec!(100) / Decimal::from(self.resolved_bets))
                .round_dp(PERCENTAGE_DP)
        };
        UserStats {
            identity,
            total_bets: self.total_bets,
            active_bets: self.active_bets,
            total_winnings: self.total_winnings,
            win_rate,
            markets_created: self.markets_created,
        }
    }
}

// ============================================================================
// QUERY FACADE
// ============================================================================

pub struct QueryFacade {
    store: Arc<MarketStore>,
}

impl QueryFacade {
    pub fn new(store: Arc<MarketStore>) -> Self {
        Self { store }
    }

    pub fn get_markets(&self, filter: MarketFilter, search: Option<&str>) -> Vec<MarketView> {
        let now = self.store.now();
        self.store
            .list(filter, search)
            .into_iter()
            .map(|m| MarketView::new(m, now))
            .collect()
    }

    pub fn get_market(&self, id: MarketId) -> EngineResult<MarketView> {
        let market = self.store.get(id)?;
        Ok(MarketView::new(market, self.store.now()))
    }

    /// The identity's bets on one market; empty when there are none
    pub fn get_user_bets(&self, market_id: MarketId, identity: &str) -> Vec<Bet> {
        self.store.bets_for(market_id, identity)
    }

    pub fn get_user_stats(&self, identity: &str) -> UserStats {
        let mut tally = Tally::default();
        self.store.visit(|slot| {
            let market = slot.market();
            if market.creator == identity {
                tally.markets_created += 1;
            }
            for bet in slot.ledger().iter().filter(|b| b.bettor == identity) {
                tally.add_bet(market, bet);
            }
        });
        tally.into_stats(identity.to_string())
    }

    /// Every identity that bet or created a market, best first
    pub fn leaderboard(&self, sort: LeaderboardSort, limit: Option<usize>) -> Vec<LeaderboardEntry> {
        let limit = limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT);

        let mut tallies: BTreeMap<String, Tally> = BTreeMap::new();
        self.store.visit(|slot| {
            let market = slot.market();
            tallies.entry(market.creator.clone()).or_default().markets_created += 1;
            for bet in slot.ledger().iter() {
                tallies.entry(bet.bettor.clone()).or_default().add_bet(market, bet);
            }
        });

        // BTreeMap iteration gives identity order; the stable sort keeps it for ties
        let mut stats: Vec<UserStats> = tallies
            .into_iter()
            .map(|(identity, tally)| tally.into_stats(identity))
            .collect();
        match sort {
            LeaderboardSort::Winnings => stats.sort_by(|a, b| b.total_winnings.cmp(&a.total_winnings)),
            LeaderboardSort::Bets => stats.sort_by(|a, b| b.total_bets.cmp(&a.total_bets)),
            LeaderboardSort::WinRate => stats.sort_by(|a, b| b.win_rate.cmp(&a.win_rate)),
            LeaderboardSort::Created => stats.sort_by(|a, b| b.markets_created.cmp(&a.markets_created)),
        }

        stats
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, stats)| LeaderboardEntry { rank: i + 1, stats })
            .collect()
    }
}
