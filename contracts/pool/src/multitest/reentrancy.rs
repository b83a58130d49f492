use cosmwasm_std::Uint128;

use subnet_dex::pool::ContractError;

use super::suite::{SuiteBuilder, CONTROLLER};

const TRADER: &str = "trader";

fn hostile_pool() -> super::suite::Suite {
    let mut suite = SuiteBuilder::new()
        .with_hostile_quote()
        .with_base_balance(CONTROLLER, 1_000_000)
        .with_base_balance(TRADER, 100_000)
        .build();
    suite
        .inject_liquidity(CONTROLLER, 100_000, 100_000)
        .unwrap();
    suite.arm_hostile_quote().unwrap();
    suite
}

#[test]
fn reentry_during_payout_is_rejected() {
    let mut suite = hostile_pool();

    let err = suite
        .swap_base_for_quote(TRADER, 1_000, 0, TRADER)
        .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        ContractError::Reentrancy {}.to_string()
    );

    let info = suite.query_pool_info().unwrap();
    assert_eq!(info.base_reserve, Uint128::new(100_000));
    assert_eq!(info.quote_reserve_in, Uint128::new(100_000));
    assert_eq!(suite.query_statistics().unwrap().swap_count, 0);
    assert_eq!(suite.query_base_balance(TRADER).unwrap(), 100_000);
}

#[test]
fn reentry_during_pull_is_rejected() {
    let mut suite = hostile_pool();

    let err = suite
        .swap_quote_for_base(TRADER, 1_000, 0, TRADER)
        .unwrap_err();
    assert_eq!(
        err.root_cause().to_string(),
        ContractError::Reentrancy {}.to_string()
    );
    assert_eq!(suite.query_base_balance(TRADER).unwrap(), 100_000);
}

#[test]
fn failed_reentry_does_not_leave_pool_locked() {
    let mut suite = hostile_pool();

    suite
        .swap_base_for_quote(TRADER, 1_000, 0, TRADER)
        .unwrap_err();

    // calls that move no quote tokens never reach the hostile token
    suite.next_block(1);
    suite.refresh_moving_average_price(TRADER).unwrap();
    suite.inject_liquidity(CONTROLLER, 5_000, 0).unwrap();

    let info = suite.query_pool_info().unwrap();
    assert_eq!(info.base_reserve, Uint128::new(105_000));
}
