use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use cosmwasm_std::{Addr, Uint128};
use thiserror::Error;

/// Moves assets between external holders and pool custody.
///
/// Each call moves exactly `amount` or fails without partial effect. The pool
/// only ever calls this while holding its own lock, and it never asks for a
/// zero-amount transfer.
pub trait AssetCustody {
    /// Pull `amount` of `asset` from `from` into pool custody.
    fn transfer_in(&self, asset: &str, from: &Addr, amount: Uint128) -> Result<(), TransferError>;

    /// Push `amount` of `asset` out of pool custody to `to`.
    fn transfer_out(&self, asset: &str, to: &Addr, amount: Uint128) -> Result<(), TransferError>;

    /// Undo a `transfer_in` of the same operation, returning the funds and any
    /// authorization the pull consumed.
    fn refund_in(&self, asset: &str, to: &Addr, amount: Uint128) -> Result<(), TransferError> {
        self.transfer_out(asset, to, amount)
    }

    /// Undo a `transfer_out` of the same operation, taking the funds back
    /// from `from`.
    fn reclaim_out(&self, asset: &str, from: &Addr, amount: Uint128) -> Result<(), TransferError> {
        self.transfer_in(asset, from, amount)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Insufficient {asset} balance for {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        asset: String,
        holder: Addr,
        needed: Uint128,
        available: Uint128,
    },

    #[error("{holder} has not authorized {needed} {asset} (allowance {allowance})")]
    Unauthorized {
        asset: String,
        holder: Addr,
        needed: Uint128,
        allowance: Uint128,
    },

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

#[derive(Debug, Default)]
struct Accounts {
    balances: BTreeMap<(String, Addr), Uint128>,
    allowances: BTreeMap<(String, Addr), Uint128>,
}

impl Accounts {
    fn balance(&self, asset: &str, holder: &Addr) -> Uint128 {
        self.balances
            .get(&(asset.to_string(), holder.clone()))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, asset: &str, holder: &Addr) -> Uint128 {
        self.allowances
            .get(&(asset.to_string(), holder.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Moves `amount` from `from` to `to`, writing nothing unless both sides fit.
    fn move_funds(
        &mut self,
        asset: &str,
        from: &Addr,
        to: &Addr,
        amount: Uint128,
    ) -> Result<(), TransferError> {
        let available = self.balance(asset, from);
        let debited =
            available
                .checked_sub(amount)
                .map_err(|_| TransferError::InsufficientBalance {
                    asset: asset.to_string(),
                    holder: from.clone(),
                    needed: amount,
                    available,
                })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(asset, to)
            .checked_add(amount)
            .map_err(|e| TransferError::Rejected {
                reason: e.to_string(),
            })?;
        self.balances.insert((asset.to_string(), from.clone()), debited);
        self.balances.insert((asset.to_string(), to.clone()), credited);
        Ok(())
    }
}

/// In-memory ledger for both pool assets.
///
/// Holders must `approve` the pool before it can pull funds from them, the
/// same way a cw20 `TransferFrom` needs an allowance.
#[derive(Debug)]
pub struct MemoryBank {
    custodian: Addr,
    accounts: Mutex<Accounts>,
}

impl MemoryBank {
    pub fn new(custodian: Addr) -> Self {
        MemoryBank {
            custodian,
            accounts: Mutex::new(Accounts::default()),
        }
    }

    /// Address holding the pool's custodied balances.
    pub fn custodian(&self) -> &Addr {
        &self.custodian
    }

    pub fn mint(&self, asset: &str, to: &Addr, amount: Uint128) -> Result<(), TransferError> {
        let mut accounts = self.accounts();
        let balance = accounts
            .balance(asset, to)
            .checked_add(amount)
            .map_err(|e| TransferError::Rejected {
                reason: e.to_string(),
            })?;
        accounts
            .balances
            .insert((asset.to_string(), to.clone()), balance);
        Ok(())
    }

    /// Sets how much of `asset` the pool may pull from `owner`.
    pub fn approve(&self, owner: &Addr, asset: &str, amount: Uint128) {
        self.accounts()
            .allowances
            .insert((asset.to_string(), owner.clone()), amount);
    }

    pub fn balance(&self, asset: &str, holder: &Addr) -> Uint128 {
        self.accounts().balance(asset, holder)
    }

    pub fn allowance(&self, asset: &str, owner: &Addr) -> Uint128 {
        self.accounts().allowance(asset, owner)
    }

    /// Balance of `asset` currently held by the pool.
    pub fn custodied(&self, asset: &str) -> Uint128 {
        self.balance(asset, &self.custodian)
    }

    fn accounts(&self) -> std::sync::MutexGuard<'_, Accounts> {
        // Every mutation completes before the guard drops, so a poisoned
        // ledger is still consistent.
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AssetCustody for MemoryBank {
    fn transfer_in(&self, asset: &str, from: &Addr, amount: Uint128) -> Result<(), TransferError> {
        let mut accounts = self.accounts();
        let allowance = accounts.allowance(asset, from);
        if allowance < amount {
            return Err(TransferError::Unauthorized {
                asset: asset.to_string(),
                holder: from.clone(),
                needed: amount,
                allowance,
            });
        }
        accounts.move_funds(asset, from, &self.custodian, amount)?;
        accounts
            .allowances
            .insert((asset.to_string(), from.clone()), allowance - amount);
        Ok(())
    }

    fn transfer_out(&self, asset: &str, to: &Addr, amount: Uint128) -> Result<(), TransferError> {
        self.accounts()
            .move_funds(asset, &self.custodian, to, amount)
    }

    fn refund_in(&self, asset: &str, to: &Addr, amount: Uint128) -> Result<(), TransferError> {
        let mut accounts = self.accounts();
        let allowance = accounts
            .allowance(asset, to)
            .checked_add(amount)
            .map_err(|e| TransferError::Rejected {
                reason: e.to_string(),
            })?;
        accounts.move_funds(asset, &self.custodian, to, amount)?;
        accounts
            .allowances
            .insert((asset.to_string(), to.clone()), allowance);
        Ok(())
    }

    // No allowance: these are funds the pool itself just sent
    fn reclaim_out(&self, asset: &str, from: &Addr, amount: Uint128) -> Result<(), TransferError> {
        self.accounts()
            .move_funds(asset, from, &self.custodian, amount)
    }
}
