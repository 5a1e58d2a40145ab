pub mod calculations;
pub mod contract;
pub mod custody;
pub mod error;
pub mod events;
pub mod execute;
mod guard;
pub mod msg;
pub mod query;
pub mod state;
pub mod validation;

pub use crate::calculations::quote_out;
pub use crate::contract::Pool;
pub use crate::custody::{AssetCustody, MemoryBank, TransferError};
pub use crate::error::PoolError;
