// ============================================================================
// Market Resolve Module - Core Market & Betting Logic
// ============================================================================
//
// Pari-mutuel settlement for binary markets:
//   - pool: pool arithmetic and implied percentages
//   - markets: market records, per-market locking, listing and snapshots
//   - bets: append-only bet ledger
//   - resolution: creator-only outcome reporting
//   - payout: claims against resolved markets
//
// ============================================================================

pub mod bets;
pub mod markets;
pub mod payout;
pub mod pool;
pub mod resolution;

pub use bets::{Bet, BetId, BetLedger};
pub use markets::{Market, MarketFilter, MarketSlot, MarketStore, StoreSnapshot};
pub use payout::PayoutCalculator;
pub use pool::{PoolAccountant, PoolState, PERCENTAGE_DP};
pub use resolution::ResolutionAuthority;

pub type MarketId = u64;
