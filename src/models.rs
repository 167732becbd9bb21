// Request/response bodies for the HTTP API

use serde::{Deserialize, Serialize};

use crate::activity::ActivityEntry;
use crate::engine::BetReceipt;
use crate::error::{EngineError, EngineResult};
use crate::market_resolve::{Bet, MarketFilter, MarketId};
use crate::query::{LeaderboardEntry, LeaderboardSort, MarketView};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const MAX_HISTORY_LIMIT: usize = 500;

/// POST /markets
///
/// ```json
/// { "question": "Will BTC close above 100k?", "end_time": 1767225600, "caller": "0xA1B2..." }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub question: String,
    /// Unix seconds
    pub end_time: u64,
    /// Identity supplied by the client's wallet/session provider
    pub caller: String,
}

/// POST /markets/:id/bets
#[derive(Debug, Deserialize)]
pub struct PlaceBetRequest {
    pub caller: String,
    pub is_yes: bool,
    /// Any JSON number; validated by `amount()`
    pub amount: serde_json::Number,
}

impl PlaceBetRequest {
    /// Negative and fractional amounts fail here, zero fails in the engine
    pub fn amount(&self) -> EngineResult<u64> {
        self.amount.as_u64().ok_or_else(|| {
            EngineError::InvalidAmount(format!(
                "amount {} is not a whole number of units",
                self.amount
            ))
        })
    }
}

/// POST /markets/:id/resolve
#[derive(Debug, Deserialize)]
pub struct ResolveMarketRequest {
    pub caller: String,
    pub outcome: bool,
}

/// POST /markets/:id/claim
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub caller: String,
}

/// GET /markets?filter=active&search=btc
#[derive(Debug, Default, Deserialize)]
pub struct MarketsQuery {
    #[serde(default)]
    pub filter: MarketFilter,
    #[serde(default)]
    pub search: Option<String>,
}

/// GET /leaderboard?sort=win_rate&limit=5
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub sort: LeaderboardSort,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /users/:identity/history?limit=20 and GET /activity?limit=20
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn resolved(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct CreateMarketResponse {
    pub success: bool,
    pub market_id: MarketId,
}

#[derive(Debug, Serialize)]
pub struct PlaceBetResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: BetReceipt,
}

#[derive(Debug, Serialize)]
pub struct MarketsResponse {
    pub count: usize,
    pub markets: Vec<MarketView>,
}

#[derive(Debug, Serialize)]
pub struct ResolveMarketResponse {
    pub success: bool,
    pub market_id: MarketId,
    pub outcome: bool,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    pub market_id: MarketId,
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct ClaimableResponse {
    pub market_id: MarketId,
    pub identity: String,
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct UserBetsResponse {
    pub market_id: MarketId,
    pub identity: String,
    pub bets: Vec<Bet>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub identity: Option<String>,
    pub entries: Vec<ActivityEntry>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub sort: LeaderboardSort,
    pub entries: Vec<LeaderboardEntry>,
}

/// Body of every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: &'static str,
    pub error: String,
}
