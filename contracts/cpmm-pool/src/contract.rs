use cosmwasm_std::{
    to_json_binary, Addr, Binary, Event, MemoryStorage, Response, Storage, Uint128,
};

use crate::custody::AssetCustody;
use crate::error::PoolError;
use crate::events::{DepositEvent, SwapEvent, WithdrawEvent};
use crate::execute::{execute_deposit, execute_instantiate, execute_swap, execute_withdraw};
use crate::guard::ExclusiveLock;
use crate::msg::{
    DepositResponse, ExecuteMsg, InstantiateMsg, PoolStateResponse, QueryMsg, QuoteResponse,
    SwapResponse, WithdrawResponse,
};
use crate::query::{
    query_all_shares, query_pool_state, query_share_balance, query_simulate_swap,
    sum_share_balances,
};
use crate::state::{load_reserves, load_share_balance, PoolConfig, POOL_CONFIG, TOTAL_SHARES};

/// Everything a pool owns, guarded as one unit.
#[derive(Default)]
pub(crate) struct Ledger {
    pub storage: MemoryStorage,
    pub events: Vec<Event>,
}

/// A two-asset constant-product pool.
///
/// Every operation, queries included, runs under one exclusive lock held
/// across the custody calls it makes. A custody implementation that calls
/// back into the same pool from inside a transfer is refused with
/// [`PoolError::Reentrancy`].
///
/// Reentry is recognised by thread. A custody implementation that hands the
/// callback to another thread and waits for it will block forever instead of
/// getting `Reentrancy`, since that thread simply queues behind the operation
/// it is waiting on. Callbacks must stay on the calling thread.
///
/// A panic inside a custody call poisons the pool: every later call returns
/// [`PoolError::LockPoisoned`].
///
/// The same custody backend must be passed to every operation: reserves are
/// only in sync with what that backend holds for the pool.
pub struct Pool {
    ledger: ExclusiveLock<Ledger>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool").finish_non_exhaustive()
    }
}

impl Pool {
    pub fn instantiate(msg: InstantiateMsg) -> Result<Self, PoolError> {
        let mut ledger = Ledger::default();
        execute_instantiate(&mut ledger, msg)?;
        Ok(Pool {
            ledger: ExclusiveLock::new(ledger),
        })
    }

    // --- Message entry points ---

    pub fn execute(
        &self,
        custody: &dyn AssetCustody,
        sender: &Addr,
        msg: ExecuteMsg,
    ) -> Result<Response, PoolError> {
        match msg {
            ExecuteMsg::Deposit { amount_x, amount_y } => {
                let ev = self.deposit(custody, sender, amount_x, amount_y)?;
                Ok(Response::new()
                    .set_data(to_json_binary(&DepositResponse {
                        shares_minted: ev.shares_minted,
                    })?)
                    .add_attribute("action", "deposit")
                    .add_event(Event::from(ev)))
            }
            ExecuteMsg::Withdraw { shares } => {
                let ev = self.withdraw(custody, sender, shares)?;
                Ok(Response::new()
                    .set_data(to_json_binary(&WithdrawResponse {
                        amount_x: ev.amount_x,
                        amount_y: ev.amount_y,
                    })?)
                    .add_attribute("action", "withdraw")
                    .add_event(Event::from(ev)))
            }
            ExecuteMsg::Swap {
                asset_in,
                amount_in,
            } => {
                let ev = self.swap(custody, sender, &asset_in, amount_in)?;
                Ok(Response::new()
                    .set_data(to_json_binary(&SwapResponse {
                        asset_out: ev.asset_out.clone(),
                        amount_out: ev.amount_out,
                    })?)
                    .add_attribute("action", "swap")
                    .add_event(Event::from(ev)))
            }
        }
    }

    pub fn query(&self, msg: QueryMsg) -> Result<Binary, PoolError> {
        let ledger = self.ledger.acquire()?;
        let storage: &dyn Storage = &ledger.storage;
        let bin = match msg {
            QueryMsg::Config {} => to_json_binary(&POOL_CONFIG.load(storage)?)?,
            QueryMsg::PoolState {} => to_json_binary(&query_pool_state(storage)?)?,
            QueryMsg::ShareBalance { participant } => {
                to_json_binary(&query_share_balance(storage, Addr::unchecked(participant))?)?
            }
            QueryMsg::AllShares { start_after, limit } => to_json_binary(&query_all_shares(
                storage,
                start_after.map(Addr::unchecked),
                limit,
            )?)?,
            QueryMsg::QuoteOut {
                amount_in,
                reserve_in,
                reserve_out,
            } => to_json_binary(&QuoteResponse {
                amount_out: crate::calculations::quote_out(amount_in, reserve_in, reserve_out)?,
            })?,
            QueryMsg::SimulateSwap {
                asset_in,
                amount_in,
            } => to_json_binary(&QuoteResponse {
                amount_out: query_simulate_swap(storage, &asset_in, amount_in)?,
            })?,
        };
        Ok(bin)
    }

    // --- Typed operations ---

    /// Deposits both assets and mints shares to `participant`.
    pub fn deposit(
        &self,
        custody: &dyn AssetCustody,
        participant: &Addr,
        amount_x: Uint128,
        amount_y: Uint128,
    ) -> Result<DepositEvent, PoolError> {
        let mut ledger = self.ledger.acquire()?;
        execute_deposit(&mut ledger, custody, participant, amount_x, amount_y)
    }

    /// Burns `shares` and pays out the proportional slice of both reserves.
    pub fn withdraw(
        &self,
        custody: &dyn AssetCustody,
        participant: &Addr,
        shares: Uint128,
    ) -> Result<WithdrawEvent, PoolError> {
        let mut ledger = self.ledger.acquire()?;
        execute_withdraw(&mut ledger, custody, participant, shares)
    }

    pub fn swap(
        &self,
        custody: &dyn AssetCustody,
        participant: &Addr,
        asset_in: &str,
        amount_in: Uint128,
    ) -> Result<SwapEvent, PoolError> {
        let mut ledger = self.ledger.acquire()?;
        execute_swap(&mut ledger, custody, participant, asset_in, amount_in)
    }

    // --- Typed queries ---

    pub fn config(&self) -> Result<PoolConfig, PoolError> {
        let ledger = self.ledger.acquire()?;
        Ok(POOL_CONFIG.load(&ledger.storage)?)
    }

    pub fn state(&self) -> Result<PoolStateResponse, PoolError> {
        let ledger = self.ledger.acquire()?;
        Ok(query_pool_state(&ledger.storage)?)
    }

    /// `(reserve_x, reserve_y)`
    pub fn reserves(&self) -> Result<(Uint128, Uint128), PoolError> {
        let ledger = self.ledger.acquire()?;
        Ok(load_reserves(&ledger.storage)?)
    }

    pub fn total_shares(&self) -> Result<Uint128, PoolError> {
        let ledger = self.ledger.acquire()?;
        Ok(TOTAL_SHARES.load(&ledger.storage)?)
    }

    pub fn share_balance(&self, participant: &Addr) -> Result<Uint128, PoolError> {
        let ledger = self.ledger.acquire()?;
        Ok(load_share_balance(&ledger.storage, participant)?)
    }

    pub fn simulate_swap(&self, asset_in: &str, amount_in: Uint128) -> Result<Uint128, PoolError> {
        let ledger = self.ledger.acquire()?;
        query_simulate_swap(&ledger.storage, asset_in, amount_in)
    }

    /// Drains the events emitted since the last call, oldest first.
    pub fn take_events(&self) -> Result<Vec<Event>, PoolError> {
        let mut ledger = self.ledger.acquire()?;
        Ok(std::mem::take(&mut ledger.events))
    }

    /// Audits the share ledger against the stored totals.
    ///
    /// Walks every holder, so it is meant for tests and offline checks, not
    /// for the operation path.
    pub fn check_invariants(&self) -> Result<(), PoolError> {
        let ledger = self.ledger.acquire()?;
        let total_shares = TOTAL_SHARES.load(&ledger.storage)?;
        let summed = sum_share_balances(&ledger.storage)?;
        if summed != total_shares {
            return Err(PoolError::InvariantViolation {
                reason: format!("share balances sum to {summed}, total is {total_shares}"),
            });
        }
        let (reserve_x, reserve_y) = load_reserves(&ledger.storage)?;
        if total_shares.is_zero() && !(reserve_x.is_zero() && reserve_y.is_zero()) {
            return Err(PoolError::InvariantViolation {
                reason: format!("no shares outstanding but reserves are {reserve_x}/{reserve_y}"),
            });
        }
        Ok(())
    }
}
