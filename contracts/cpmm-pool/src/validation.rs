use crate::error::PoolError;
use crate::msg::InstantiateMsg;
use crate::state::PoolConfig;
use cosmwasm_std::Uint128;

/// Checks the two asset identities and builds the stored config.
/// Order is kept as given: `asset_x` is the first leg of every deposit.
pub(crate) fn validate_pool_assets(msg: &InstantiateMsg) -> Result<PoolConfig, PoolError> {
    for asset in [&msg.asset_x, &msg.asset_y] {
        if asset.trim().is_empty() {
            return Err(PoolError::InvalidAsset {
                asset: asset.clone(),
            });
        }
    }
    if msg.asset_x == msg.asset_y {
        return Err(PoolError::InvalidAsset {
            asset: msg.asset_y.clone(),
        });
    }
    Ok(PoolConfig {
        asset_x: msg.asset_x.clone(),
        asset_y: msg.asset_y.clone(),
    })
}

pub(crate) fn validate_positive(amount: Uint128) -> Result<(), PoolError> {
    if amount.is_zero() {
        return Err(PoolError::ZeroAmount {});
    }
    Ok(())
}

/// Which side of the pool a swap draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    X,
    Y,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::X => Side::Y,
            Side::Y => Side::X,
        }
    }

    pub fn asset(self, cfg: &PoolConfig) -> &str {
        match self {
            Side::X => &cfg.asset_x,
            Side::Y => &cfg.asset_y,
        }
    }

    /// Lays out a value for this side and one for the opposite side as `(x, y)`.
    pub fn order<T>(self, this: T, other: T) -> (T, T) {
        match self {
            Side::X => (this, other),
            Side::Y => (other, this),
        }
    }
}

/// Resolves the side a swap input asset belongs to.
pub(crate) fn resolve_input_side(cfg: &PoolConfig, asset_in: &str) -> Result<Side, PoolError> {
    if asset_in == cfg.asset_x {
        Ok(Side::X)
    } else if asset_in == cfg.asset_y {
        Ok(Side::Y)
    } else {
        Err(PoolError::InvalidAsset {
            asset: asset_in.to_string(),
        })
    }
}
