use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Event, Uint128};

// Events emitted by the pool engine

#[cw_serde]
pub struct DepositEvent {
    pub participant: Addr,
    pub amount_x: Uint128,
    pub amount_y: Uint128,
    pub shares_minted: Uint128,
}

impl From<DepositEvent> for Event {
    fn from(val: DepositEvent) -> Self {
        Event::new("deposit")
            .add_attribute("participant", val.participant.into_string())
            .add_attribute("amount_x", val.amount_x.to_string())
            .add_attribute("amount_y", val.amount_y.to_string())
            .add_attribute("shares_minted", val.shares_minted.to_string())
    }
}

#[cw_serde]
pub struct WithdrawEvent {
    pub participant: Addr,
    pub amount_x: Uint128,
    pub amount_y: Uint128,
    pub shares_burned: Uint128,
}

impl From<WithdrawEvent> for Event {
    fn from(val: WithdrawEvent) -> Self {
        Event::new("withdrawal")
            .add_attribute("participant", val.participant.into_string())
            .add_attribute("amount_x", val.amount_x.to_string())
            .add_attribute("amount_y", val.amount_y.to_string())
            .add_attribute("shares_burned", val.shares_burned.to_string())
    }
}

#[cw_serde]
pub struct SwapEvent {
    pub participant: Addr,
    pub asset_in: String,
    pub asset_out: String,
    pub amount_in: Uint128,
    pub amount_out: Uint128,
}

impl From<SwapEvent> for Event {
    fn from(val: SwapEvent) -> Self {
        Event::new("swap")
            .add_attribute("participant", val.participant.into_string())
            .add_attribute("asset_in", val.asset_in)
            .add_attribute("asset_out", val.asset_out)
            .add_attribute("amount_in", val.amount_in.to_string())
            .add_attribute("amount_out", val.amount_out.to_string())
    }
}
