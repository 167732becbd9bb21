use std::sync::Arc;
use tracing::warn;

use super::markets::MarketStore;
use super::MarketId;
use crate::error::{EngineError, EngineResult};

/// The only component allowed to settle a market's outcome.
///
/// Authorization is exact identity equality with the stored creator. Partial
/// matches (prefixes, substrings, shortened addresses) never authorize.
pub struct ResolutionAuthority {
    store: Arc<MarketStore>,
}

impl ResolutionAuthority {
    pub fn new(store: Arc<MarketStore>) -> Self {
        Self { store }
    }

    /// Active → Resolved(outcome). Terminal: a second call fails with
    /// `AlreadyResolved` and leaves the recorded outcome alone.
    pub fn resolve(&self, market_id: MarketId, outcome: bool, caller: &str) -> EngineResult<()> {
        let now = self.store.now();
        self.store.with_slot(market_id, |slot| {
            if slot.market.creator != caller {
                warn!(market_id, caller, "resolution attempt by non-creator");
                return Err(EngineError::Unauthorized(format!(
                    "only the creator of market {} may resolve it",
                    market_id
                )));
            }
            if slot.market.is_resolved() {
                return Err(EngineError::AlreadyResolved(market_id));
            }

            slot.market.finalize(outcome, now);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn setup() -> (Arc<MarketStore>, ResolutionAuthority, MarketId) {
        let clock = Arc::new(ManualClock::new(100));
        let store = Arc::new(MarketStore::new(clock));
        let id = store.create("Will it ship?", 200, "0xA1B2C3D4").unwrap();
        (store.clone(), ResolutionAuthority::new(store), id)
    }

    #[test]
    fn test_creator_resolves() {
        let (store, authority, id) = setup();
        authority.resolve(id, true, "0xA1B2C3D4").unwrap();

        let market = store.get(id).unwrap();
        assert!(market.is_resolved());
        assert_eq!(market.outcome(), Some(true));
        assert_eq!(market.resolved_at(), Some(100));
    }

    #[test]
    fn test_second_resolution_keeps_outcome() {
        let (store, authority, id) = setup();
        authority.resolve(id, false, "0xA1B2C3D4").unwrap();

        let err = authority.resolve(id, true, "0xA1B2C3D4").unwrap_err();
        assert_eq!(err, EngineError::AlreadyResolved(id));
        assert_eq!(store.get(id).unwrap().outcome(), Some(false));
    }

    #[test]
    fn test_partial_identity_is_unauthorized() {
        let (store, authority, id) = setup();
        for caller in ["0xA1B2", "A1B2C3", "0xa1b2c3d4", "0xA1B2C3D4 ", "", "0xA1B2C3D4E5"] {
            let err = authority.resolve(id, true, caller).unwrap_err();
            assert!(matches!(err, EngineError::Unauthorized(_)), "caller {:?}", caller);
        }
        assert!(!store.get(id).unwrap().is_resolved());
    }

    #[test]
    fn test_unknown_market() {
        let (_, authority, _) = setup();
        assert!(matches!(authority.resolve(77, true, "0xA1B2C3D4"), Err(EngineError::NotFound(_))));
    }

    #[test]
    fn test_resolution_closes_betting() {
        let (store, authority, id) = setup();
        authority.resolve(id, true, "0xA1B2C3D4").unwrap();
        assert_eq!(store.place_bet(id, "bob", true, 10).unwrap_err(), EngineError::AlreadyResolved(id));
    }
}
