//! Object types stored by the chain database

mod account;
mod asset;
mod global;
mod market;
mod vesting;
mod witness;
mod worker;

pub use account::{AccountBalanceObject, AccountObject, KeyObject};
pub use asset::{AssetDynamicDataObject, AssetObject};
pub use global::{DynamicGlobalPropertyObject, GlobalPropertyObject, TransactionObject};
pub use market::{BondOfferObject, LimitOrderObject, ShortOrderObject};
pub use vesting::{CddPolicy, LinearPolicy, VestingBalanceObject, VestingPolicy};
pub use witness::{DelegateObject, VoteTallyObject, WitnessObject};
pub use worker::{WorkerObject, WorkerPayPolicy};
