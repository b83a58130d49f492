use cosmwasm_std::{Addr, Uint128};
use cw_multi_test::Executor;

use subnet_dex::pool::{ContractError, MigrateMsg};

use super::suite::{SuiteBuilder, ADMIN, CONTROLLER, CREATOR, OWNER_CONTRACT};

const TREASURY: &str = "treasury";

fn funded() -> SuiteBuilder {
    SuiteBuilder::new()
        .with_base_balance(CONTROLLER, 1_000_000)
        .with_quote_balance(CONTROLLER, 1_000_000)
        .with_base_balance(OWNER_CONTRACT, 1_000_000)
        .with_quote_balance(OWNER_CONTRACT, 1_000_000)
        .with_base_balance(CREATOR, 1_000_000)
        .with_quote_balance(CREATOR, 1_000_000)
}

#[test]
fn only_controllers_inject() {
    let mut suite = funded().build();

    let err = suite
        .inject_liquidity(CREATOR, 10_000, 10_000)
        .unwrap_err();
    assert_eq!(ContractError::Unauthorized {}, err.downcast().unwrap());

    suite.inject_liquidity(CONTROLLER, 10_000, 10_000).unwrap();
    suite
        .inject_liquidity(OWNER_CONTRACT, 5_000, 0)
        .unwrap();

    let info = suite.query_pool_info().unwrap();
    assert_eq!(info.base_reserve, Uint128::new(15_000));
    assert_eq!(info.quote_reserve_in, Uint128::new(10_000));
    assert_eq!(info.creator, Addr::unchecked(CREATOR));

    assert_eq!(suite.query_base_balance(suite.pool.as_str()).unwrap(), 15_000);
    assert_eq!(
        suite.query_quote_balance(suite.pool.as_str()).unwrap(),
        10_000
    );
}

#[test]
fn first_injection_seeds_both_sides() {
    let mut suite = funded().with_minimum_pool_liquidity(5_000).build();

    assert!(!suite.query_pool_health().unwrap().healthy);

    let err = suite
        .inject_liquidity(CONTROLLER, 10_000, 4_999)
        .unwrap_err();
    assert_eq!(
        ContractError::BelowMinimumLiquidity {
            minimum: Uint128::new(5_000)
        },
        err.downcast().unwrap()
    );

    suite.inject_liquidity(CONTROLLER, 5_000, 5_000).unwrap();
    let health = suite.query_pool_health().unwrap();
    assert!(health.healthy);
    assert!(health.base_healthy && health.quote_healthy);
    assert_eq!(health.minimum_pool_liquidity, Uint128::new(5_000));
}

#[test]
fn withdraw_pays_recipient_down_to_floor() {
    let mut suite = funded().build();
    suite.inject_liquidity(CONTROLLER, 10_000, 10_000).unwrap();

    let err = suite
        .withdraw_liquidity(CREATOR, 1_000, 0, CREATOR)
        .unwrap_err();
    assert_eq!(ContractError::Unauthorized {}, err.downcast().unwrap());

    let err = suite
        .withdraw_liquidity(CONTROLLER, 9_001, 0, TREASURY)
        .unwrap_err();
    assert_eq!(
        ContractError::BelowMinimumLiquidity {
            minimum: Uint128::new(1_000)
        },
        err.downcast().unwrap()
    );

    suite
        .withdraw_liquidity(OWNER_CONTRACT, 9_000, 9_000, TREASURY)
        .unwrap();
    assert_eq!(suite.query_base_balance(TREASURY).unwrap(), 9_000);
    assert_eq!(suite.query_quote_balance(TREASURY).unwrap(), 9_000);

    let health = suite.query_pool_health().unwrap();
    assert!(health.healthy);
    assert_eq!(health.base_reserve, Uint128::new(1_000));

    let verified = suite.query_verify_reserves().unwrap();
    assert!(verified.base_matches && verified.quote_matches);

    // the lock was released by the reply of the last transfer
    suite.inject_liquidity(CONTROLLER, 1, 1).unwrap();
}

#[test]
fn verify_reserves_detects_direct_transfer() {
    let mut suite = funded().build();
    suite.inject_liquidity(CONTROLLER, 10_000, 10_000).unwrap();

    suite.transfer_quote_to_pool(CREATOR, 500).unwrap();

    let verified = suite.query_verify_reserves().unwrap();
    assert!(verified.base_matches);
    assert!(!verified.quote_matches);
    assert_eq!(verified.recorded_quote, Uint128::new(10_000));
    assert_eq!(verified.actual_quote, Uint128::new(10_500));

    // a stray transfer is not part of the priced reserves
    let info = suite.query_pool_info().unwrap();
    assert_eq!(info.quote_reserve_in, Uint128::new(10_000));
}

#[test]
fn migration_keeps_reserves() {
    let mut suite = funded().build();
    suite.inject_liquidity(CONTROLLER, 10_000, 10_000).unwrap();

    let pool = suite.pool.clone();
    let code_id = suite.pool_code_id;
    suite
        .app
        .migrate_contract(Addr::unchecked(ADMIN), pool, &MigrateMsg {}, code_id)
        .unwrap();

    let info = suite.query_pool_info().unwrap();
    assert_eq!(info.base_reserve, Uint128::new(10_000));
    assert_eq!(info.controller, Addr::unchecked(CONTROLLER));
}
