use crate::error::PoolError;
use crate::state::{SWAP_FEE_DENOMINATOR, SWAP_FEE_NUMERATOR};
use cosmwasm_std::{Isqrt, Uint128, Uint256};

/// Calculates the initial shares using the geometric mean: sqrt(x * y).
pub(crate) fn calculate_initial_shares(
    amount_x: Uint128,
    amount_y: Uint128,
) -> Result<Uint128, PoolError> {
    if amount_x.is_zero() || amount_y.is_zero() {
        return Err(PoolError::ZeroAmount {});
    }
    let prod = Uint256::from(amount_x).checked_mul(Uint256::from(amount_y))?;
    let shares = Uint128::try_from(prod.isqrt())?;
    if shares.is_zero() {
        return Err(PoolError::ZeroShares {});
    }
    Ok(shares)
}

/// Shares for a deposit into a seeded pool, credited for the limiting asset only.
/// Reserves must be the values from before the deposit lands.
pub(crate) fn calculate_subsequent_shares(
    amount_x: Uint128,
    amount_y: Uint128,
    reserve_x: Uint128,
    reserve_y: Uint128,
    total_shares: Uint128,
) -> Result<Uint128, PoolError> {
    if total_shares.is_zero() || reserve_x.is_zero() || reserve_y.is_zero() {
        return Err(PoolError::ZeroShares {});
    }
    let share_x = amount_x.checked_multiply_ratio(total_shares, reserve_x)?;
    let share_y = amount_y.checked_multiply_ratio(total_shares, reserve_y)?;
    let shares = std::cmp::min(share_x, share_y);
    if shares.is_zero() {
        return Err(PoolError::ZeroShares {});
    }
    Ok(shares)
}

/// Output of a swap against the given reserves, net of the 0.3% input fee:
///
/// `floor(amount_in * 997 * reserve_out / (reserve_in * 1000 + amount_in * 997))`
///
/// Pure; callers can use it to predict a trade before committing it.
pub fn quote_out(
    amount_in: Uint128,
    reserve_in: Uint128,
    reserve_out: Uint128,
) -> Result<Uint128, PoolError> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(PoolError::EmptyPool {});
    }
    let amount_in_with_fee =
        Uint256::from(amount_in).checked_mul(Uint256::from_u128(SWAP_FEE_NUMERATOR))?;
    let numerator = amount_in_with_fee.checked_mul(Uint256::from(reserve_out))?;
    let denominator = Uint256::from(reserve_in)
        .checked_mul(Uint256::from_u128(SWAP_FEE_DENOMINATOR))?
        .checked_add(amount_in_with_fee)?;
    let amount_out = numerator.checked_div(denominator)?;
    Ok(Uint128::try_from(amount_out)?)
}

/// Proportional redemption of `share_amount` against pre-withdrawal state.
pub(crate) fn calculate_withdraw_amounts(
    share_amount: Uint128,
    reserve_x: Uint128,
    reserve_y: Uint128,
    total_shares: Uint128,
) -> Result<(Uint128, Uint128), PoolError> {
    let amount_x = reserve_x.checked_multiply_ratio(share_amount, total_shares)?;
    let amount_y = reserve_y.checked_multiply_ratio(share_amount, total_shares)?;
    Ok((amount_x, amount_y))
}

/// Fails unless `after_x * after_y >= before_x * before_y`.
pub(crate) fn verify_constant_product(
    before: (Uint128, Uint128),
    after: (Uint128, Uint128),
) -> Result<(), PoolError> {
    let k_before = Uint256::from(before.0).checked_mul(Uint256::from(before.1))?;
    let k_after = Uint256::from(after.0).checked_mul(Uint256::from(after.1))?;
    if k_after < k_before {
        return Err(PoolError::InvariantViolation {
            reason: format!("constant product decreased from {k_before} to {k_after}"),
        });
    }
    Ok(())
}
