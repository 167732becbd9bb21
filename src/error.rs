// Engine error taxonomy
//
// Every command either completes or fails with one of these variants. Errors
// are terminal: nothing is retried internally and no state is left half
// written.

use serde::Serialize;

use crate::market_resolve::MarketId;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum EngineError {
    /// Unknown market (or bet)
    NotFound(String),
    /// Blank question, blank identity, end time not in the future
    InvalidInput(String),
    /// Zero stake
    InvalidAmount(String),
    /// Bet arrived at or after the market's end time
    MarketExpired { market_id: MarketId, end_time: u64 },
    /// Duplicate resolution, or a bet on a resolved market
    AlreadyResolved(MarketId),
    /// Resolver is not the market creator
    Unauthorized(String),
    /// Claim before the outcome is known
    MarketNotResolved(MarketId),
    /// Bettor has nothing left to claim on this market
    NoClaimableBets { market_id: MarketId, bettor: String },
    /// Combined pool would no longer fit in a u64
    PoolOverflow(String),
}

impl EngineError {
    /// Stable machine-readable code, used by the HTTP layer
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotFound(_) => "not_found",
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::InvalidAmount(_) => "invalid_amount",
            EngineError::MarketExpired { .. } => "market_expired",
            EngineError::AlreadyResolved(_) => "already_resolved",
            EngineError::Unauthorized(_) => "unauthorized",
            EngineError::MarketNotResolved(_) => "market_not_resolved",
            EngineError::NoClaimableBets { .. } => "no_claimable_bets",
            EngineError::PoolOverflow(_) => "pool_overflow",
        }
    }

    pub(crate) fn market_not_found(id: MarketId) -> Self {
        EngineError::NotFound(format!("market {}", id))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(what) => write!(f, "Not found: {}", what),
            EngineError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            EngineError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            EngineError::MarketExpired { market_id, end_time } => write!(
                f,
                "Market {} stopped accepting bets at {}",
                market_id, end_time
            ),
            EngineError::AlreadyResolved(id) => write!(f, "Market {} is already resolved", id),
            EngineError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            EngineError::MarketNotResolved(id) => write!(f, "Market {} is not resolved yet", id),
            EngineError::NoClaimableBets { market_id, bettor } => write!(
                f,
                "No claimable bets for {} on market {}",
                bettor, market_id
            ),
            EngineError::PoolOverflow(msg) => write!(f, "Pool overflow: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}
