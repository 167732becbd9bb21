/// Pari-mutuel prediction market settlement engine
/// Exports all modules for use as a library crate

pub mod activity;
pub mod app_state;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod market_resolve;
pub mod models;
pub mod query;
pub mod routes;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog};
pub use app_state::{AppState, SharedState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{BetReceipt, EngineSnapshot, PredictionEngine};
pub use error::{EngineError, EngineResult};
pub use market_resolve::{
    Bet, BetId, BetLedger, Market, MarketFilter, MarketId, MarketStore, PayoutCalculator,
    PoolAccountant, PoolState, ResolutionAuthority,
};
pub use query::{LeaderboardEntry, LeaderboardSort, MarketView, QueryFacade, UserStats};
pub use routes::router;
