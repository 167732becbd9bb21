use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

// ============================================================================
// POOL STATE
// ============================================================================

/// Decimal places kept on derived percentages
pub const PERCENTAGE_DP: u32 = 2;

/// The two pari-mutuel pools of a binary market.
///
/// Pure value type: `PoolAccountant` turns one state into the next and the
/// market store decides when the new state is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub yes_pool: u64,
    pub no_pool: u64,
}

impl PoolState {
    pub fn new(yes_pool: u64, no_pool: u64) -> Self {
        Self { yes_pool, no_pool }
    }

    /// Combined stake. Never overflows: `apply_bet` refuses states whose total
    /// would not fit.
    pub fn total(&self) -> u64 {
        self.yes_pool.saturating_add(self.no_pool)
    }

    /// Pool on the given side
    pub fn side(&self, is_yes: bool) -> u64 {
        if is_yes {
            self.yes_pool
        } else {
            self.no_pool
        }
    }
}

// ============================================================================
// POOL ACCOUNTANT
// ============================================================================

pub struct PoolAccountant;

impl PoolAccountant {
    /// Implied YES/NO percentages.
    ///
    /// 50/50 for an empty market. Otherwise YES is rounded to two decimals and
    /// NO is derived by subtraction, so the pair always sums to exactly 100.
    pub fn percentages(yes_pool: u64, no_pool: u64) -> (Decimal, Decimal) {
        if yes_pool == 0 && no_pool == 0 {
            return (dec!(50), dec!(50));
        }

        let total = Decimal::from(yes_pool) + Decimal::from(no_pool);
        let yes = Decimal::from(yes_pool) * dec!(100) / total;
        let yes = yes.round_dp(PERCENTAGE_DP);
        (yes, dec!(100) - yes)
    }

    /// Add a stake to one side, returning the new state.
    pub fn apply_bet(pools: PoolState, is_yes: bool, amount: u64) -> EngineResult<PoolState> {
        if amount == 0 {
            return Err(EngineError::InvalidAmount("bet amount must be positive".into()));
        }

        let total = pools
            .yes_pool
            .checked_add(pools.no_pool)
            .and_then(|t| t.checked_add(amount));
        if total.is_none() {
            return Err(EngineError::PoolOverflow(format!(
                "adding {} to pools ({}, {})",
                amount, pools.yes_pool, pools.no_pool
            )));
        }

        // both pools are bounded by the total checked above
        let mut next = pools;
        if is_yes {
            next.yes_pool += amount;
        } else {
            next.no_pool += amount;
        }
        Ok(next)
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
