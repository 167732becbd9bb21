/// Settlement integration tests
///
/// Exercise the engine directly: concurrent betting, pool conservation and
/// payout bounds across randomized bet sequences.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;
use tokio_test::{assert_err, assert_ok};

use prediction_market::{EngineError, ManualClock, PoolAccountant, PredictionEngine};

const START: u64 = 10_000;
const END: u64 = 20_000;

fn engine() -> Arc<PredictionEngine> {
    Arc::new(PredictionEngine::new(Arc::new(ManualClock::new(START)), 10_000))
}

#[test]
fn test_concurrent_bets_on_one_market_are_all_counted() {
    let engine = engine();
    let id = assert_ok!(engine.create_market("Crowded market?", END, "house"));

    let mut amounts: Vec<(usize, bool, u64)> = (0..400)
        .map(|i| (i % 8, i % 3 == 0, (i as u64 % 17) + 1))
        .collect();
    amounts.shuffle(&mut rand::thread_rng());

    let expected_yes: u64 = amounts.iter().filter(|(_, y, _)| *y).map(|(_, _, a)| a).sum();
    let expected_no: u64 = amounts.iter().filter(|(_, y, _)| !*y).map(|(_, _, a)| a).sum();

    thread::scope(|s| {
        for chunk in amounts.chunks(50) {
            let engine = engine.clone();
            s.spawn(move || {
                for (bettor, is_yes, amount) in chunk {
                    let caller = format!("bettor-{}", bettor);
                    assert_ok!(engine.place_bet(id, &caller, *is_yes, *amount));
                }
            });
        }
    });

    let market = assert_ok!(engine.get_market(id));
    assert_eq!(market.market.yes_pool(), expected_yes);
    assert_eq!(market.market.no_pool(), expected_no);
    assert_eq!(market.yes_percentage + market.no_percentage, dec!(100));

    let recorded: usize = (0..8)
        .map(|b| engine.get_user_bets(id, &format!("bettor-{}", b)).len())
        .sum();
    assert_eq!(recorded, 400);
}

#[test]
fn test_parallel_markets_stay_independent() {
    let engine = engine();
    let ids: Vec<u64> = (0..6)
        .map(|i| assert_ok!(engine.create_market(&format!("Market {}?", i), END, "house")))
        .collect();

    thread::scope(|s| {
        for &id in &ids {
            let engine = engine.clone();
            s.spawn(move || {
                for n in 1..=50u64 {
                    assert_ok!(engine.place_bet(id, "whale", n % 2 == 0, id * 10 + n));
                }
            });
        }
    });

    for &id in &ids {
        let market = assert_ok!(engine.get_market(id));
        let expected: u64 = (1..=50u64).map(|n| id * 10 + n).sum();
        assert_eq!(market.total_pool, expected);
        assert_eq!(engine.get_user_bets(id, "whale").len(), 50);
    }
}

#[test]
fn test_payouts_never_exceed_the_pool() {
    let mut rng = rand::thread_rng();

    for round in 0..25 {
        let engine = engine();
        let id = assert_ok!(engine.create_market("Random settlement?", END, "house"));
        let bettors: Vec<String> = (0..rng.gen_range(2..12)).map(|b| format!("p{}", b)).collect();

        let mut winning_bets = 0u64;
        let outcome = round % 2 == 0;
        for _ in 0..rng.gen_range(1..40) {
            let bettor = bettors.choose(&mut rng).unwrap();
            let is_yes = rng.gen_bool(0.5);
            assert_ok!(engine.place_bet(id, bettor, is_yes, rng.gen_range(1..10_000)));
            if is_yes == outcome {
                winning_bets += 1;
            }
        }

        let total = assert_ok!(engine.get_market(id)).total_pool;
        assert_ok!(engine.resolve_market(id, outcome, "house"));

        let mut paid = 0u64;
        for bettor in &bettors {
            match engine.claim_winnings(id, bettor) {
                Ok(amount) => paid += amount,
                Err(EngineError::NoClaimableBets { .. }) => {}
                Err(e) => panic!("unexpected claim error: {}", e),
            }
        }

        assert!(paid <= total, "round {}: paid {} of {}", round, paid, total);
        if winning_bets > 0 {
            // one unit of rounding dust at most per winning bet
            assert!(total - paid < winning_bets, "round {}: dust {}", round, total - paid);
        } else {
            assert_eq!(paid, 0);
        }
    }
}

#[test]
fn test_percentages_always_sum_to_one_hundred() {
    let mut rng = rand::thread_rng();
    for _ in 0..500 {
        let yes = rng.gen_range(0..u32::MAX as u64);
        let no = rng.gen_range(0..u32::MAX as u64);
        let (y, n) = PoolAccountant::percentages(yes, no);
        assert_eq!(y + n, dec!(100));
        assert!(y >= dec!(0) && n >= dec!(0));
    }
}

#[test]
fn test_late_and_resolved_markets_reject_bets() {
    let clock = Arc::new(ManualClock::new(START));
    let engine = PredictionEngine::new(clock.clone(), 100);
    let late = assert_ok!(engine.create_market("Late?", END, "house"));
    let settled = assert_ok!(engine.create_market("Settled?", END, "house"));

    assert_ok!(engine.resolve_market(settled, true, "house"));
    assert_err!(engine.place_bet(settled, "bob", true, 1));

    clock.set(END - 1);
    assert_ok!(engine.place_bet(late, "bob", true, 1));
    clock.advance(1);
    assert_err!(engine.place_bet(late, "bob", true, 1));
    assert_eq!(assert_ok!(engine.get_market(late)).market.yes_pool(), 1);
}
