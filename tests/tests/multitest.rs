use std::cell::RefCell;

use anyhow::Context;
use cosmwasm_std::{coin, from_json, Addr, Coin, Uint128};
use cpmm_pool::msg::{ExecuteMsg, InstantiateMsg, PoolStateResponse, QueryMsg, SwapResponse};
use cpmm_pool::{AssetCustody, Pool, PoolError, TransferError};
use cw_multi_test::{App, BankSudo, Executor};

const TOKEN_A: &str = "tokenA";
const TOKEN_B: &str = "tokenB";

/// Custody backed by the multi-test bank module: the pool's reserves live in
/// a real bank balance owned by `pool_addr`.
struct BankCustody {
    app: RefCell<App>,
    pool_addr: Addr,
}

impl BankCustody {
    fn balance(&self, holder: &Addr, denom: &str) -> Uint128 {
        self.app
            .borrow()
            .wrap()
            .query_balance(holder, denom)
            .unwrap()
            .amount
    }

    fn send(&self, from: &Addr, to: &Addr, denom: &str, amount: Uint128) -> Result<(), TransferError> {
        let available = self.balance(from, denom);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                asset: denom.to_string(),
                holder: from.clone(),
                needed: amount,
                available,
            });
        }
        self.app
            .borrow_mut()
            .send_tokens(from.clone(), to.clone(), &[coin(amount.u128(), denom)])
            .map(|_| ())
            .map_err(|e| TransferError::Rejected {
                reason: e.to_string(),
            })
    }
}

impl AssetCustody for BankCustody {
    fn transfer_in(&self, asset: &str, from: &Addr, amount: Uint128) -> Result<(), TransferError> {
        self.send(from, &self.pool_addr, asset, amount)
    }

    fn transfer_out(&self, asset: &str, to: &Addr, amount: Uint128) -> Result<(), TransferError> {
        self.send(&self.pool_addr, to, asset, amount)
    }
}

/// Sets up app, users and balances, and instantiates the pool
/// Returns: `(Pool, BankCustody, User1 Addr, User2 Addr)`
fn setup_app() -> (Pool, BankCustody, Addr, Addr) {
    let mut app = App::default();
    let pool_addr = app.api().addr_make("pool");
    let user1 = app.api().addr_make("user1");
    let user2 = app.api().addr_make("user2");

    // Give users initial balances
    for user in [&user1, &user2] {
        app.sudo(cw_multi_test::SudoMsg::Bank(BankSudo::Mint {
            to_address: user.to_string(),
            amount: vec![
                Coin {
                    denom: TOKEN_A.into(),
                    amount: Uint128::new(1_000_000),
                },
                Coin {
                    denom: TOKEN_B.into(),
                    amount: Uint128::new(1_000_000),
                },
            ],
        }))
        .unwrap();
    }

    let pool = Pool::instantiate(InstantiateMsg {
        asset_x: TOKEN_A.to_string(),
        asset_y: TOKEN_B.to_string(),
    })
    .unwrap();
    let custody = BankCustody {
        app: RefCell::new(app),
        pool_addr,
    };
    (pool, custody, user1, user2)
}

/// Reserves must match what the bank says the pool holds.
fn assert_in_sync(pool: &Pool, custody: &BankCustody) {
    let (reserve_a, reserve_b) = pool.reserves().unwrap();
    assert_eq!(reserve_a, custody.balance(&custody.pool_addr, TOKEN_A));
    assert_eq!(reserve_b, custody.balance(&custody.pool_addr, TOKEN_B));
    pool.check_invariants().unwrap();
}

#[test]
fn test_full_flow_bank_custody() -> anyhow::Result<()> {
    let (pool, custody, user1, user2) = setup_app();

    // --- Initial liquidity ---
    let ev = pool.deposit(&custody, &user1, Uint128::new(100_000), Uint128::new(200_000))?;
    assert_eq!(ev.shares_minted, Uint128::new(141_421));
    assert_in_sync(&pool, &custody);
    assert_eq!(custody.balance(&user1, TOKEN_A), Uint128::new(900_000));

    // --- Proportional second deposit ---
    let ev = pool.deposit(&custody, &user2, Uint128::new(10_000), Uint128::new(20_000))?;
    assert_eq!(ev.shares_minted, Uint128::new(14_142));
    assert_in_sync(&pool, &custody);

    // --- Swap A for B ---
    let ev = pool.swap(&custody, &user2, TOKEN_A, Uint128::new(1_000))?;
    assert_eq!(ev.amount_out, Uint128::new(1_976));
    assert_eq!(
        pool.reserves()?,
        (Uint128::new(111_000), Uint128::new(218_024))
    );
    assert_in_sync(&pool, &custody);
    assert_eq!(
        custody.balance(&user2, TOKEN_B),
        Uint128::new(1_000_000 - 20_000 + 1_976)
    );

    // --- User1 leaves ---
    let ev = pool.withdraw(&custody, &user1, Uint128::new(141_421))?;
    assert_eq!(ev.amount_x, Uint128::new(100_909));
    assert_eq!(ev.amount_y, Uint128::new(198_203));
    assert!(pool.share_balance(&user1)?.is_zero());
    assert_in_sync(&pool, &custody);

    // --- User2 drains the pool ---
    let ev = pool.withdraw(&custody, &user2, Uint128::new(14_142))?;
    assert_eq!(ev.amount_x, Uint128::new(10_091));
    assert_eq!(ev.amount_y, Uint128::new(19_821));
    assert_eq!(pool.reserves()?, (Uint128::zero(), Uint128::zero()));
    assert!(pool.total_shares()?.is_zero());
    assert_in_sync(&pool, &custody);

    // Nothing was created or lost across the two users
    let total_a = custody.balance(&user1, TOKEN_A) + custody.balance(&user2, TOKEN_A);
    let total_b = custody.balance(&user1, TOKEN_B) + custody.balance(&user2, TOKEN_B);
    assert_eq!(total_a, Uint128::new(2_000_000));
    assert_eq!(total_b, Uint128::new(2_000_000));
    Ok(())
}

#[test]
fn test_deposit_beyond_balance_moves_nothing() {
    let (pool, custody, user1, _user2) = setup_app();
    let err = pool
        .deposit(&custody, &user1, Uint128::new(500_000), Uint128::new(1_000_001))
        .unwrap_err();
    assert!(matches!(
        err,
        PoolError::TransferFailure(TransferError::InsufficientBalance { .. })
    ));
    // The token A leg was refunded
    assert_eq!(custody.balance(&user1, TOKEN_A), Uint128::new(1_000_000));
    assert!(pool.total_shares().unwrap().is_zero());
    assert_in_sync(&pool, &custody);
}

#[test]
fn test_swap_against_unseeded_pool() {
    let (pool, custody, user1, _user2) = setup_app();
    let err = pool
        .swap(&custody, &user1, TOKEN_A, Uint128::new(100))
        .unwrap_err();
    assert_eq!(err, PoolError::EmptyPool {});
    let err = pool
        .swap(&custody, &user1, "tokenC", Uint128::new(100))
        .unwrap_err();
    assert!(matches!(err, PoolError::InvalidAsset { .. }));
    assert_eq!(custody.balance(&user1, TOKEN_A), Uint128::new(1_000_000));
}

#[test]
fn test_message_interface() -> anyhow::Result<()> {
    let (pool, custody, user1, user2) = setup_app();
    pool.execute(
        &custody,
        &user1,
        ExecuteMsg::Deposit {
            amount_x: Uint128::new(100),
            amount_y: Uint128::new(100),
        },
    )?;

    let res = pool
        .execute(
            &custody,
            &user2,
            ExecuteMsg::Swap {
                asset_in: TOKEN_A.to_string(),
                amount_in: Uint128::new(10),
            },
        )?;
    let swap_event = res
        .events
        .iter()
        .find(|e| e.ty == "swap")
        .context("swap event missing")?;
    assert!(swap_event
        .attributes
        .iter()
        .any(|a| a.key == "amount_out" && a.value == "9"));
    let data: SwapResponse = from_json(res.data.context("swap returned no data")?)?;
    assert_eq!(data.amount_out, Uint128::new(9));

    let state: PoolStateResponse = from_json(pool.query(QueryMsg::PoolState {})?)?;
    assert_eq!(state.reserve_x, Uint128::new(110));
    assert_eq!(state.reserve_y, Uint128::new(91));
    assert_eq!(state.total_shares, Uint128::new(100));
    assert_in_sync(&pool, &custody);
    Ok(())
}
