use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct PoolConfig {
    pub asset_x: String,
    pub asset_y: String,
}

pub const POOL_CONFIG: Item<PoolConfig> = Item::new("pool_config");

// Reserves track custodied balances, not a cached query of them
pub const RESERVE_X: Item<Uint128> = Item::new("reserve_x");
pub const RESERVE_Y: Item<Uint128> = Item::new("reserve_y");
pub const TOTAL_SHARES: Item<Uint128> = Item::new("total_shares");
pub const SHARES: Map<&Addr, Uint128> = Map::new("shares");

/// 0.3% fee taken from the swap input, as 997/1000 of the input counting toward price.
pub const SWAP_FEE_NUMERATOR: u128 = 997;
pub const SWAP_FEE_DENOMINATOR: u128 = 1000;

pub(crate) fn load_reserves(storage: &dyn Storage) -> StdResult<(Uint128, Uint128)> {
    Ok((RESERVE_X.load(storage)?, RESERVE_Y.load(storage)?))
}

pub(crate) fn save_reserves(
    storage: &mut dyn Storage,
    reserve_x: Uint128,
    reserve_y: Uint128,
) -> StdResult<()> {
    RESERVE_X.save(storage, &reserve_x)?;
    RESERVE_Y.save(storage, &reserve_y)
}

pub(crate) fn load_share_balance(storage: &dyn Storage, participant: &Addr) -> StdResult<Uint128> {
    Ok(SHARES.may_load(storage, participant)?.unwrap_or_default())
}

/// Values an operation is about to overwrite, kept so a failed payout can
/// put the ledger back exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Snapshot {
    pub reserve_x: Uint128,
    pub reserve_y: Uint128,
    pub total_shares: Uint128,
    pub participant: Addr,
    pub share_balance: Option<Uint128>,
}

impl Snapshot {
    pub fn take(storage: &dyn Storage, participant: &Addr) -> StdResult<Self> {
        let (reserve_x, reserve_y) = load_reserves(storage)?;
        Ok(Snapshot {
            reserve_x,
            reserve_y,
            total_shares: TOTAL_SHARES.load(storage)?,
            participant: participant.clone(),
            share_balance: SHARES.may_load(storage, participant)?,
        })
    }

    pub fn restore(&self, storage: &mut dyn Storage) -> StdResult<()> {
        RESERVE_X.save(storage, &self.reserve_x)?;
        RESERVE_Y.save(storage, &self.reserve_y)?;
        TOTAL_SHARES.save(storage, &self.total_shares)?;
        match self.share_balance {
            Some(balance) => SHARES.save(storage, &self.participant, &balance),
            None => {
                SHARES.remove(storage, &self.participant);
                Ok(())
            }
        }
    }
}
