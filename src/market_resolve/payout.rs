use std::sync::Arc;

use super::bets::Bet;
use super::markets::{Market, MarketStore};
use super::MarketId;
use crate::error::{EngineError, EngineResult};

/// Settles claims against resolved markets.
///
/// Winning bets are paid `amount * total_pool / winning_pool`, rounded down per
/// bet. The pools are frozen once a market resolves, so every winner is paid
/// against the same totals. Losing bets are settled with a payout of 0.
pub struct PayoutCalculator {
    store: Arc<MarketStore>,
}

impl PayoutCalculator {
    pub fn new(store: Arc<MarketStore>) -> Self {
        Self { store }
    }

    /// Claim everything `bettor` has unclaimed on `market_id`.
    ///
    /// Every processed bet is marked claimed, winner or not, so nothing is
    /// paid twice.
    pub fn claim(&self, market_id: MarketId, bettor: &str) -> EngineResult<u64> {
        self.store.with_slot(market_id, |slot| {
            let outcome = settled_outcome(&slot.market)?;
            let market = slot.market.clone();

            let mut total = 0u64;
            let mut processed = 0usize;
            for bet in slot.ledger.unclaimed_for_mut(bettor) {
                let payout = bet_payout(&market, outcome, bet);
                bet.mark_claimed(payout);
                // payouts of one market never exceed its total pool, itself a u64
                total = total.saturating_add(payout);
                processed += 1;
            }

            if processed == 0 {
                return Err(EngineError::NoClaimableBets {
                    market_id,
                    bettor: bettor.to_string(),
                });
            }
            Ok(total)
        })
    }

    /// What `claim` would pay right now. 0 when there is nothing to claim or
    /// the market is still open.
    pub fn claimable(&self, market_id: MarketId, bettor: &str) -> EngineResult<u64> {
        self.store.with_slot(market_id, |slot| {
            let outcome = match slot.market.outcome() {
                Some(outcome) => outcome,
                None => return Ok(0),
            };
            Ok(slot
                .ledger
                .unclaimed_for(bettor)
                .map(|bet| bet_payout(&slot.market, outcome, bet))
                .fold(0u64, u64::saturating_add))
        })
    }
}

fn settled_outcome(market: &Market) -> EngineResult<bool> {
    match (market.is_resolved(), market.outcome()) {
        (true, Some(outcome)) => Ok(outcome),
        _ => Err(EngineError::MarketNotResolved(market.id)),
    }
}

/// Pari-mutuel share of one bet, in u128 to keep `amount * total` exact
pub fn bet_payout(market: &Market, outcome: bool, bet: &Bet) -> u64 {
    if bet.is_yes != outcome {
        return 0;
    }

    let pools = market.pools();
    let winning_pool = pools.side(outcome) as u128;
    if winning_pool == 0 {
        return 0;
    }

    let share = bet.amount as u128 * pools.total() as u128 / winning_pool;
    share.min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::market_resolve::ResolutionAuthority;

    struct Fixture {
        store: Arc<MarketStore>,
        authority: ResolutionAuthority,
        payouts: PayoutCalculator,
        market: MarketId,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(10));
        let store = Arc::new(MarketStore::new(clock));
        let market = store.create("Will the bridge open?", 50, "maker").unwrap();
        Fixture {
            authority: ResolutionAuthority::new(store.clone()),
            payouts: PayoutCalculator::new(store.clone()),
            store,
            market,
        }
    }

    #[test]
    fn test_even_market_winner_takes_all() {
        let f = fixture();
        f.store.place_bet(f.market, "A", true, 500).unwrap();
        f.store.place_bet(f.market, "B", false, 500).unwrap();
        f.authority.resolve(f.market, true, "maker").unwrap();

        assert_eq!(f.payouts.claim(f.market, "A").unwrap(), 1000);
        assert_eq!(f.payouts.claim(f.market, "B").unwrap(), 0);
    }

    #[test]
    fn test_second_claim_fails() {
        let f = fixture();
        f.store.place_bet(f.market, "A", true, 500).unwrap();
        f.authority.resolve(f.market, true, "maker").unwrap();

        assert_eq!(f.payouts.claim(f.market, "A").unwrap(), 500);
        assert!(matches!(
            f.payouts.claim(f.market, "A"),
            Err(EngineError::NoClaimableBets { market_id: 1, .. })
        ));
        assert_eq!(f.payouts.claimable(f.market, "A").unwrap(), 0);
    }

    #[test]
    fn test_claim_before_resolution() {
        let f = fixture();
        f.store.place_bet(f.market, "A", true, 5).unwrap();
        assert_eq!(f.payouts.claim(f.market, "A").unwrap_err(), EngineError::MarketNotResolved(f.market));
        assert!(!f.store.bets_for(f.market, "A")[0].claimed());
    }

    #[test]
    fn test_claim_without_bets() {
        let f = fixture();
        f.authority.resolve(f.market, false, "maker").unwrap();
        assert!(matches!(f.payouts.claim(f.market, "nobody"), Err(EngineError::NoClaimableBets { .. })));
        assert!(matches!(f.payouts.claim(99, "nobody"), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_multiple_bets_summed_and_marked() {
        let f = fixture();
        f.store.place_bet(f.market, "A", true, 100).unwrap();
        f.store.place_bet(f.market, "A", false, 50).unwrap();
        f.store.place_bet(f.market, "A", true, 100).unwrap();
        f.store.place_bet(f.market, "B", false, 350).unwrap();
        f.authority.resolve(f.market, true, "maker").unwrap();

        // total 600, winning pool 200: each YES 100 pays 300
        assert_eq!(f.payouts.claimable(f.market, "A").unwrap(), 600);
        assert_eq!(f.payouts.claim(f.market, "A").unwrap(), 600);

        let bets = f.store.bets_for(f.market, "A");
        assert!(bets.iter().all(|b| b.claimed()));
        let payouts: Vec<_> = bets.iter().map(|b| b.payout()).collect();
        assert_eq!(payouts, vec![Some(300), Some(0), Some(300)]);
    }

    #[test]
    fn test_rounding_dust_stays_unclaimed() {
        let f = fixture();
        f.store.place_bet(f.market, "A", true, 1).unwrap();
        f.store.place_bet(f.market, "B", true, 1).unwrap();
        f.store.place_bet(f.market, "C", true, 1).unwrap();
        f.store.place_bet(f.market, "D", false, 2).unwrap();
        f.authority.resolve(f.market, true, "maker").unwrap();

        // total 5, winning 3: each winner gets floor(5/3) = 1
        let paid: u64 = ["A", "B", "C", "D"]
            .iter()
            .map(|who| f.payouts.claim(f.market, who).unwrap())
            .sum();
        assert_eq!(paid, 3);
        assert!(paid <= 5 && 5 - paid < 3);
    }

    #[test]
    fn test_empty_winning_side_pays_nothing() {
        let f = fixture();
        f.store.place_bet(f.market, "B", false, 40).unwrap();
        f.authority.resolve(f.market, true, "maker").unwrap();
        assert_eq!(f.payouts.claim(f.market, "B").unwrap(), 0);
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        let f = fixture();
        let big = u64::MAX / 4;
        f.store.place_bet(f.market, "A", true, big).unwrap();
        f.store.place_bet(f.market, "B", false, big).unwrap();
        f.authority.resolve(f.market, true, "maker").unwrap();
        assert_eq!(f.payouts.claim(f.market, "A").unwrap(), big * 2);
    }
}
