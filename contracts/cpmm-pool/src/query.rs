use crate::calculations::quote_out;
use crate::error::PoolError;
use crate::msg::{AllSharesResponse, PoolStateResponse, ShareBalanceResponse, ShareEntry};
use crate::state::{load_reserves, load_share_balance, POOL_CONFIG, SHARES, TOTAL_SHARES};
use crate::validation::{resolve_input_side, Side};
use cosmwasm_std::{Addr, Order, StdResult, Storage, Uint128};
use cw_storage_plus::Bound;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

// --- Query Handler Implementations ---

pub(crate) fn query_pool_state(storage: &dyn Storage) -> StdResult<PoolStateResponse> {
    let cfg = POOL_CONFIG.load(storage)?;
    let (reserve_x, reserve_y) = load_reserves(storage)?;
    Ok(PoolStateResponse {
        asset_x: cfg.asset_x,
        asset_y: cfg.asset_y,
        reserve_x,
        reserve_y,
        total_shares: TOTAL_SHARES.load(storage)?,
    })
}

pub(crate) fn query_share_balance(
    storage: &dyn Storage,
    participant: Addr,
) -> StdResult<ShareBalanceResponse> {
    let shares = load_share_balance(storage, &participant)?;
    Ok(ShareBalanceResponse {
        participant,
        shares,
    })
}

pub(crate) fn query_all_shares(
    storage: &dyn Storage,
    start_after: Option<Addr>,
    limit: Option<u32>,
) -> StdResult<AllSharesResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.as_ref().map(Bound::exclusive);
    let shares = SHARES
        .range(storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(participant, shares)| ShareEntry { participant, shares }))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(AllSharesResponse { shares })
}

/// Quote for swapping `amount_in` of `asset_in` against the current reserves.
pub(crate) fn query_simulate_swap(
    storage: &dyn Storage,
    asset_in: &str,
    amount_in: Uint128,
) -> Result<Uint128, PoolError> {
    let cfg = POOL_CONFIG.load(storage)?;
    let (reserve_x, reserve_y) = load_reserves(storage)?;
    let (reserve_in, reserve_out) = match resolve_input_side(&cfg, asset_in)? {
        Side::X => (reserve_x, reserve_y),
        Side::Y => (reserve_y, reserve_x),
    };
    quote_out(amount_in, reserve_in, reserve_out)
}

/// Sums the full share ledger. Linear in the number of holders.
pub(crate) fn sum_share_balances(storage: &dyn Storage) -> StdResult<Uint128> {
    SHARES
        .range(storage, None, None, Order::Ascending)
        .try_fold(Uint128::zero(), |acc, item| {
            let (_, shares) = item?;
            Ok(acc.checked_add(shares)?)
        })
}
