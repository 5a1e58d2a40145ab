use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Uint128};

use crate::state::PoolConfig;

/// Fixes the two asset identities for the lifetime of the pool.
#[cw_serde]
pub struct InstantiateMsg {
    pub asset_x: String,
    pub asset_y: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    Deposit {
        amount_x: Uint128,
        amount_y: Uint128,
    },
    Withdraw {
        shares: Uint128,
    },
    Swap {
        asset_in: String, // Must be one of the pool assets
        amount_in: Uint128,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(PoolConfig)]
    Config {},
    #[returns(PoolStateResponse)]
    PoolState {},
    #[returns(ShareBalanceResponse)]
    ShareBalance { participant: String },
    #[returns(AllSharesResponse)]
    AllShares {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    /// Pure quote against caller-supplied reserves.
    #[returns(QuoteResponse)]
    QuoteOut {
        amount_in: Uint128,
        reserve_in: Uint128,
        reserve_out: Uint128,
    },
    /// Quote against the pool's current reserves.
    #[returns(QuoteResponse)]
    SimulateSwap { asset_in: String, amount_in: Uint128 },
}

#[cw_serde]
pub struct PoolStateResponse {
    pub asset_x: String,
    pub asset_y: String,
    pub reserve_x: Uint128,
    pub reserve_y: Uint128,
    pub total_shares: Uint128,
}

#[cw_serde]
pub struct ShareBalanceResponse {
    pub participant: Addr,
    pub shares: Uint128,
}

#[cw_serde]
pub struct ShareEntry {
    pub participant: Addr,
    pub shares: Uint128,
}

#[cw_serde]
pub struct AllSharesResponse {
    pub shares: Vec<ShareEntry>,
}

#[cw_serde]
pub struct QuoteResponse {
    pub amount_out: Uint128,
}

// Data attached to execute responses

#[cw_serde]
pub struct DepositResponse {
    pub shares_minted: Uint128,
}

#[cw_serde]
pub struct WithdrawResponse {
    pub amount_x: Uint128,
    pub amount_y: Uint128,
}

#[cw_serde]
pub struct SwapResponse {
    pub asset_out: String,
    pub amount_out: Uint128,
}
