// contracts/cpmm-pool/src/execute.rs

use cosmwasm_std::{Addr, Storage, Uint128};

use crate::contract::Ledger;
use crate::custody::{AssetCustody, TransferError};
use crate::error::PoolError;
use crate::events::{DepositEvent, SwapEvent, WithdrawEvent};
use crate::msg::InstantiateMsg;
use crate::state::{
    load_reserves, load_share_balance, save_reserves, PoolConfig, Snapshot, POOL_CONFIG,
    SHARES, TOTAL_SHARES,
};

// Import helpers from other modules for this engine
use crate::calculations::*;
use crate::validation::*;

// --- Instantiate Handler ---
pub(crate) fn execute_instantiate(
    ledger: &mut Ledger,
    msg: InstantiateMsg,
) -> Result<PoolConfig, PoolError> {
    let cfg = validate_pool_assets(&msg)?;
    POOL_CONFIG.save(&mut ledger.storage, &cfg)?;
    save_reserves(&mut ledger.storage, Uint128::zero(), Uint128::zero())?;
    TOTAL_SHARES.save(&mut ledger.storage, &Uint128::zero())?;
    tracing::info!(asset_x = %cfg.asset_x, asset_y = %cfg.asset_y, "pool instantiated");
    Ok(cfg)
}

// --- Execute Handler Implementations ---
//
// Whatever path an operation leaves by, the stored reserves end up equal to
// what custody holds for the pool. When a compensating transfer cannot be
// made, the ledger follows the funds instead of the other way round.

pub(crate) fn execute_deposit(
    ledger: &mut Ledger,
    custody: &dyn AssetCustody,
    participant: &Addr,
    amount_x: Uint128,
    amount_y: Uint128,
) -> Result<DepositEvent, PoolError> {
    validate_positive(amount_x)?;
    validate_positive(amount_y)?;
    let cfg = POOL_CONFIG.load(&ledger.storage)?;
    let (reserve_x, reserve_y) = load_reserves(&ledger.storage)?;
    let total_shares = TOTAL_SHARES.load(&ledger.storage)?;

    let shares_minted = if total_shares.is_zero() {
        calculate_initial_shares(amount_x, amount_y)?
    } else {
        calculate_subsequent_shares(amount_x, amount_y, reserve_x, reserve_y, total_shares)?
    };
    tracing::debug!(%participant, %amount_x, %amount_y, %shares_minted, "deposit computed");

    // Everything that can overflow is settled before any funds move
    let new_reserve_x = reserve_x.checked_add(amount_x)?;
    let new_reserve_y = reserve_y.checked_add(amount_y)?;
    let new_total_shares = total_shares.checked_add(shares_minted)?;
    let new_balance = load_share_balance(&ledger.storage, participant)?.checked_add(shares_minted)?;

    custody.transfer_in(&cfg.asset_x, participant, amount_x)?;
    if let Err(err) = custody.transfer_in(&cfg.asset_y, participant, amount_y) {
        if let Err(refund_err) = refund(custody, &cfg.asset_x, participant, amount_x) {
            tracing::error!(
                %participant, asset = %cfg.asset_x, %amount_x, err = %refund_err,
                "refund of deposit leg failed, reserves keep it"
            );
            keep_in_ledger(save_reserves(&mut ledger.storage, new_reserve_x, reserve_y));
        }
        return Err(err.into());
    }

    save_reserves(&mut ledger.storage, new_reserve_x, new_reserve_y)?;
    TOTAL_SHARES.save(&mut ledger.storage, &new_total_shares)?;
    SHARES.save(&mut ledger.storage, participant, &new_balance)?;

    let event = DepositEvent {
        participant: participant.clone(),
        amount_x,
        amount_y,
        shares_minted,
    };
    tracing::info!(%participant, %amount_x, %amount_y, %shares_minted, "deposit");
    ledger.events.push(event.clone().into());
    Ok(event)
}

pub(crate) fn execute_withdraw(
    ledger: &mut Ledger,
    custody: &dyn AssetCustody,
    participant: &Addr,
    share_amount: Uint128,
) -> Result<WithdrawEvent, PoolError> {
    validate_positive(share_amount)?;
    let cfg = POOL_CONFIG.load(&ledger.storage)?;
    let snapshot = Snapshot::take(&ledger.storage, participant)?;
    let available = snapshot.share_balance.unwrap_or_default();
    if available < share_amount {
        return Err(PoolError::InsufficientShares {
            requested: share_amount,
            available,
        });
    }

    let (amount_x, amount_y) = calculate_withdraw_amounts(
        share_amount,
        snapshot.reserve_x,
        snapshot.reserve_y,
        snapshot.total_shares,
    )?;
    let new_total_shares = snapshot.total_shares.checked_sub(share_amount)?;
    let new_reserve_x = snapshot.reserve_x.checked_sub(amount_x)?;
    let new_reserve_y = snapshot.reserve_y.checked_sub(amount_y)?;
    if new_total_shares.is_zero() && !(new_reserve_x.is_zero() && new_reserve_y.is_zero()) {
        return Err(PoolError::InvariantViolation {
            reason: format!("no shares left but reserves are {new_reserve_x}/{new_reserve_y}"),
        });
    }

    // Burn first: a reentrant caller must already see the reduced state
    SHARES.save(
        &mut ledger.storage,
        participant,
        &(available - share_amount),
    )?;
    TOTAL_SHARES.save(&mut ledger.storage, &new_total_shares)?;
    save_reserves(&mut ledger.storage, new_reserve_x, new_reserve_y)?;

    if let Err(err) = pay_out(custody, &cfg.asset_x, participant, amount_x) {
        roll_back(&mut ledger.storage, &snapshot);
        return Err(err.into());
    }
    if let Err(err) = pay_out(custody, &cfg.asset_y, participant, amount_y) {
        match reclaim(custody, &cfg.asset_x, participant, amount_x) {
            Ok(()) => roll_back(&mut ledger.storage, &snapshot),
            Err(reclaim_err) => {
                tracing::error!(
                    %participant, asset = %cfg.asset_x, %amount_x, err = %reclaim_err,
                    "clawback of partial payout failed, settling the paid leg"
                );
                keep_in_ledger(settle_first_leg(
                    &mut ledger.storage,
                    &snapshot,
                    new_reserve_x,
                    new_total_shares,
                ));
            }
        }
        return Err(err.into());
    }

    let event = WithdrawEvent {
        participant: participant.clone(),
        amount_x,
        amount_y,
        shares_burned: share_amount,
    };
    tracing::info!(%participant, %amount_x, %amount_y, shares_burned = %share_amount, "withdrawal");
    ledger.events.push(event.clone().into());
    Ok(event)
}

pub(crate) fn execute_swap(
    ledger: &mut Ledger,
    custody: &dyn AssetCustody,
    participant: &Addr,
    asset_in: &str,
    amount_in: Uint128,
) -> Result<SwapEvent, PoolError> {
    validate_positive(amount_in)?;
    let cfg = POOL_CONFIG.load(&ledger.storage)?;
    let side_in = resolve_input_side(&cfg, asset_in)?;
    let side_out = side_in.opposite();
    let asset_out = side_out.asset(&cfg);

    let snapshot = Snapshot::take(&ledger.storage, participant)?;
    let (reserve_in, reserve_out) = match side_in {
        Side::X => (snapshot.reserve_x, snapshot.reserve_y),
        Side::Y => (snapshot.reserve_y, snapshot.reserve_x),
    };
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(PoolError::EmptyPool {});
    }

    let amount_out = quote_out(amount_in, reserve_in, reserve_out)?;
    if amount_out.is_zero() {
        return Err(PoolError::InsufficientOutput {});
    }
    let new_reserve_in = reserve_in.checked_add(amount_in)?;
    let new_reserve_out = reserve_out.checked_sub(amount_out)?;
    verify_constant_product(
        (reserve_in, reserve_out),
        (new_reserve_in, new_reserve_out),
    )?;
    tracing::debug!(%participant, asset_in, %amount_in, asset_out, %amount_out, "swap computed");

    custody.transfer_in(asset_in, participant, amount_in)?;

    let (new_reserve_x, new_reserve_y) = side_in.order(new_reserve_in, new_reserve_out);
    save_reserves(&mut ledger.storage, new_reserve_x, new_reserve_y)?;

    if let Err(err) = custody.transfer_out(asset_out, participant, amount_out) {
        match refund(custody, asset_in, participant, amount_in) {
            Ok(()) => roll_back(&mut ledger.storage, &snapshot),
            Err(refund_err) => {
                tracing::error!(
                    %participant, asset_in, %amount_in, err = %refund_err,
                    "refund of swap input failed, reserves keep it"
                );
                let (kept_x, kept_y) = side_in.order(new_reserve_in, reserve_out);
                keep_in_ledger(save_reserves(&mut ledger.storage, kept_x, kept_y));
            }
        }
        return Err(err.into());
    }

    let event = SwapEvent {
        participant: participant.clone(),
        asset_in: asset_in.to_string(),
        asset_out: asset_out.to_string(),
        amount_in,
        amount_out,
    };
    tracing::info!(%participant, asset_in, %amount_in, asset_out, %amount_out, "swap");
    ledger.events.push(event.clone().into());
    Ok(event)
}

// --- Internal Helpers ---

/// Proportional redemptions can round one leg down to nothing; skip those.
fn pay_out(
    custody: &dyn AssetCustody,
    asset: &str,
    to: &Addr,
    amount: Uint128,
) -> Result<(), TransferError> {
    if amount.is_zero() {
        return Ok(());
    }
    custody.transfer_out(asset, to, amount)
}

/// Returns funds already pulled for an operation that is being abandoned.
fn refund(
    custody: &dyn AssetCustody,
    asset: &str,
    to: &Addr,
    amount: Uint128,
) -> Result<(), TransferError> {
    if amount.is_zero() {
        return Ok(());
    }
    custody.refund_in(asset, to, amount)
}

/// Takes back a payout leg already sent for an operation that is being abandoned.
fn reclaim(
    custody: &dyn AssetCustody,
    asset: &str,
    from: &Addr,
    amount: Uint128,
) -> Result<(), TransferError> {
    if amount.is_zero() {
        return Ok(());
    }
    custody.reclaim_out(asset, from, amount)
}

/// Withdrawal whose X leg was paid and could not be taken back. The shares
/// stay burned and only the X debit is kept; the Y reserve never left
/// custody. Burning the last shares would leave that Y reserve without an
/// owner, so in that case the participant keeps them.
fn settle_first_leg(
    storage: &mut dyn Storage,
    snapshot: &Snapshot,
    new_reserve_x: Uint128,
    new_total_shares: Uint128,
) -> Result<(), PoolError> {
    save_reserves(storage, new_reserve_x, snapshot.reserve_y)?;
    if new_total_shares.is_zero() {
        TOTAL_SHARES.save(storage, &snapshot.total_shares)?;
        if let Some(balance) = snapshot.share_balance {
            SHARES.save(storage, &snapshot.participant, &balance)?;
        }
    }
    Ok(())
}

/// Puts the ledger back after a failed payout. The transfer error is the one
/// reported to the caller, so a storage failure here is only logged.
fn roll_back(storage: &mut dyn Storage, snapshot: &Snapshot) {
    if let Err(err) = snapshot.restore(storage) {
        tracing::error!(%err, "restoring pool state failed");
    }
}

fn keep_in_ledger<E: std::fmt::Display>(result: Result<(), E>) {
    if let Err(err) = result {
        tracing::error!(%err, "recording stranded funds failed");
    }
}
