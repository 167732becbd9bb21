use serde::{Deserialize, Serialize};

use super::MarketId;

pub type BetId = u64;

/// A single wager. Bets are never merged or deleted; the only mutation is the
/// claim, which records the payout and flips `claimed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub market_id: MarketId,
    pub bettor: String,
    pub is_yes: bool,
    pub amount: u64,
    pub placed_at: u64,
    claimed: bool,
    /// Amount credited by the claim (0 for a losing bet)
    payout: Option<u64>,
}

impl Bet {
    pub fn claimed(&self) -> bool {
        self.claimed
    }

    pub fn payout(&self) -> Option<u64> {
        self.payout
    }

    /// Settles the bet. Only the payout calculator calls this.
    pub(super) fn mark_claimed(&mut self, payout: u64) {
        self.claimed = true;
        self.payout = Some(payout);
    }
}

/// Append-only bet record for one market.
///
/// Each market slot owns its ledger, so recording a bet happens inside the same
/// critical section as the pool update it belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetLedger {
    bets: Vec<Bet>,
}

impl BetLedger {
    pub fn new() -> Self {
        Self { bets: Vec::new() }
    }

    /// Append a bet. The caller must already have committed the matching pool
    /// update within the same market lock.
    pub(super) fn record(
        &mut self,
        id: BetId,
        market_id: MarketId,
        bettor: &str,
        is_yes: bool,
        amount: u64,
        placed_at: u64,
    ) -> BetId {
        self.bets.push(Bet {
            id,
            market_id,
            bettor: bettor.to_string(),
            is_yes,
            amount,
            placed_at,
            claimed: false,
            payout: None,
        });
        id
    }

    /// All bets by `bettor`, in insertion order
    pub fn bets_for(&self, bettor: &str) -> Vec<Bet> {
        self.bets.iter().filter(|b| b.bettor == bettor).cloned().collect()
    }

    pub(super) fn unclaimed_for_mut<'a>(
        &'a mut self,
        bettor: &'a str,
    ) -> impl Iterator<Item = &'a mut Bet> + 'a {
        self.bets.iter_mut().filter(move |b| b.bettor == bettor && !b.claimed)
    }

    pub fn unclaimed_for<'a>(&'a self, bettor: &'a str) -> impl Iterator<Item = &'a Bet> + 'a {
        self.bets.iter().filter(move |b| b.bettor == bettor && !b.claimed)
    }

    pub fn get(&self, id: BetId) -> Option<&Bet> {
        self.bets.iter().rev().find(|b| b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bet> {
        self.bets.iter()
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }
}
