use std::thread;

use credit_mev::config::{FeeParameters, PoolConfig};
use credit_mev::curve::{ConstantProduct, Percent};
use credit_mev::error::CreditError;
use credit_mev::execution::plan_borrow;
use credit_mev::math::{calculate_cdp, PriceFeed, U256};
use credit_mev::state::PoolLedger;
use credit_mev::strategies::{find_asset_out, TargetRatio};

const YEAR: u64 = 31_536_000;

fn pool() -> PoolConfig {
    PoolConfig::new(FeeParameters::new(40, 10, 10), YEAR)
}

fn state() -> ConstantProduct {
    ConstantProduct::from_u128(1_000_000, 500_000, 200_000)
}

fn target() -> TargetRatio {
    TargetRatio {
        target_ratio: 100,
        margin_percent: 1,
        prices: PriceFeed {
            asset_price: U256::from(1_000_000u64),
            collateral_price: U256::from(1_000_000u64),
            asset_decimals: 6,
            collateral_decimals: 6,
        },
    }
}

#[test]
fn solver_hits_the_target_and_is_stable_across_increments() {
    let (pool, state, target) = (pool(), state(), target());
    let percent = Percent(0xC000_0000);

    let fine = find_asset_out(&pool, &state, &target, U256::from(100u8), percent, 0).unwrap();
    let x = state.x - fine.delta.x_decrease;
    let z = state.z + fine.delta.z_increase;
    let cdp = calculate_cdp(x, z, &target.prices).unwrap();
    assert_eq!(cdp, fine.cdp);
    assert!(cdp >= U256::from(99u8) && cdp <= U256::from(101u8), "cdp {cdp} outside [99, 101]");

    let coarse = find_asset_out(&pool, &state, &target, U256::from(1_000u64), percent, 0).unwrap();
    let gap = if fine.asset_out > coarse.asset_out { fine.asset_out - coarse.asset_out } else { coarse.asset_out - fine.asset_out };
    assert!(gap < U256::from(1_000u64), "solutions {} and {} too far apart", fine.asset_out, coarse.asset_out);
}

#[test]
fn parallel_solves_agree_with_a_sequential_solve() {
    let expected = plan_borrow(&pool(), &state(), &target(), U256::from(100u8), Percent::PIVOT, 0).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| plan_borrow(&pool(), &state(), &target(), U256::from(100u8), Percent::PIVOT, 0)))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), expected);
    }
}

#[test]
fn only_one_of_two_competing_proposals_settles() {
    let ledger = PoolLedger::new(pool(), state());
    let snapshot = ledger.snapshot();

    let first = plan_borrow(ledger.pool(), &snapshot, &target(), U256::from(100u8), Percent::PIVOT, 0).unwrap();
    let second = plan_borrow(ledger.pool(), &snapshot, &target(), U256::from(1_000u64), Percent::MAX, 0).unwrap();

    let outcome = ledger.apply_borrow(&first, 0).unwrap();
    assert_eq!(*ledger.snapshot(), outcome.state);

    let rejected = ledger.apply_borrow(&second, 0).unwrap_err();
    assert_eq!(rejected, CreditError::StateChanged);
    assert!(rejected.is_recoverable());

    // Recalcul sur l'état courant, puis resoumission.
    let retry_state = ledger.snapshot();
    let higher_target = TargetRatio { target_ratio: 120, ..target() };
    let retry = plan_borrow(ledger.pool(), &retry_state, &higher_target, U256::from(100u8), Percent::PIVOT, 0).unwrap();
    assert_eq!(retry.asset_out, U256::from(36_800u64));
    ledger.apply_borrow(&retry, 0).unwrap();
}

#[test]
fn concurrent_settlement_admits_exactly_one_writer() {
    let ledger = PoolLedger::new(pool(), state());
    let params = plan_borrow(ledger.pool(), &ledger.snapshot(), &target(), U256::from(100u8), Percent::PIVOT, 0).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || ledger.apply_borrow(&params, 0))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().filter(|r| r.is_err()).all(|r| *r == Err(CreditError::StateChanged)));
}
