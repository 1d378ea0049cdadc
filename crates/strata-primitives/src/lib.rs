//! # strata-primitives
//!
//! Primitive types for the Strata ledger.
//!
//! This crate provides the fundamental data types used throughout the system:
//! fixed-size hashes, key addresses and the object identity scheme.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
mod object_id;

pub use address::{Address, AddressError, ADDRESS_PREFIX};
pub use error::PrimitiveError;
pub use hash::{Hash, HashError, H160, H256};
pub use object_id::{
    implementation_type, protocol_type, AccountBalanceId, AccountId, AssetDynamicDataId, AssetId,
    BondOfferId, DelegateId, DynamicGlobalPropertyId, GlobalPropertyId, KeyId, LimitOrderId,
    ObjectId, ObjectIdError, ShortOrderId, TransactionObjectId, TypedId, VestingBalanceId,
    VoteCategory, VoteId, VoteTallyId, WitnessId, WorkerId, IMPLEMENTATION_SPACE, PROTOCOL_SPACE,
};

/// Signed amount of an asset, in the asset's smallest unit
pub type ShareType = i64;

/// Block number
pub type BlockNum = u32;

/// Seconds since the Unix epoch
pub type Timestamp = u32;

/// Largest supply any asset may declare
pub const MAX_SHARE_SUPPLY: ShareType = 1_000_000_000_000_000;

/// Seconds in one day, the unit of worker pay and vesting periods
pub const SECONDS_PER_DAY: u32 = 86_400;
