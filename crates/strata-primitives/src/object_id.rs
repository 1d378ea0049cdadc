//! Object identity: `(space, type, instance)`
//!
//! Every persisted entity is addressed by an [`ObjectId`]. The space
//! separates protocol-visible objects from implementation bookkeeping, the
//! type selects the kind of entity, and the instance is assigned once, in
//! creation order, by the index that owns the type.
//!
//! Typed wrappers such as [`AccountId`] carry space and type statically and
//! only store the instance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use thiserror::Error;

/// Space of objects visible to the protocol (referenced by operations)
pub const PROTOCOL_SPACE: u8 = 1;
/// Space of implementation objects (bookkeeping derived from protocol state)
pub const IMPLEMENTATION_SPACE: u8 = 2;

/// Protocol space type ids
pub mod protocol_type {
    /// Key object
    pub const KEY: u8 = 1;
    /// Account object
    pub const ACCOUNT: u8 = 2;
    /// Asset object
    pub const ASSET: u8 = 3;
    /// Delegate object
    pub const DELEGATE: u8 = 4;
    /// Witness object
    pub const WITNESS: u8 = 5;
    /// Limit order object
    pub const LIMIT_ORDER: u8 = 6;
    /// Short order object
    pub const SHORT_ORDER: u8 = 7;
    /// Bond offer object
    pub const BOND_OFFER: u8 = 8;
    /// Vesting balance object
    pub const VESTING_BALANCE: u8 = 9;
    /// Worker object
    pub const WORKER: u8 = 10;
}

/// Implementation space type ids
pub mod implementation_type {
    /// Global properties singleton
    pub const GLOBAL_PROPERTY: u8 = 0;
    /// Dynamic global properties singleton
    pub const DYNAMIC_GLOBAL_PROPERTY: u8 = 1;
    /// Per-asset supply and fee pool
    pub const ASSET_DYNAMIC_DATA: u8 = 2;
    /// Balance of one asset held by one account
    pub const ACCOUNT_BALANCE: u8 = 3;
    /// Vote tally of a witness candidate
    pub const VOTE_TALLY: u8 = 4;
    /// Record of an applied transaction, kept until expiration
    pub const TRANSACTION: u8 = 5;
}

/// Object id parse/convert error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    /// Text form is not `space.type.instance`
    #[error("malformed object id: {0}")]
    Malformed(String),
    /// Space/type do not match the requested typed id
    #[error("object id {got} is not of type {expected_space}.{expected_type}")]
    TypeMismatch {
        /// The id that was converted
        got: ObjectId,
        /// Expected space
        expected_space: u8,
        /// Expected type
        expected_type: u8,
    },
}

/// Untyped object identity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ObjectId {
    /// Space id
    pub space: u8,
    /// Type id within the space
    pub type_id: u8,
    /// Instance within `(space, type_id)`
    pub instance: u64,
}

impl ObjectId {
    /// Create an object id
    pub const fn new(space: u8, type_id: u8, instance: u64) -> Self {
        Self {
            space,
            type_id,
            instance,
        }
    }

    /// Whether this id lives in the protocol space
    pub fn is_protocol(&self) -> bool {
        self.space == PROTOCOL_SPACE
    }

    /// Whether this id has the given space and type
    pub fn is<T: TypedId>(&self) -> bool {
        self.space == T::SPACE && self.type_id == T::TYPE
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.type_id, self.instance)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self)
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ObjectIdError::Malformed(s.to_string());
        let mut parts = s.split('.');
        let space = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let type_id = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let instance = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self::new(space, type_id, instance))
    }
}

/// A statically typed object id
pub trait TypedId:
    Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Space of the referenced type
    const SPACE: u8;
    /// Type id of the referenced type
    const TYPE: u8;

    /// Wrap an instance number
    fn from_instance(instance: u64) -> Self;

    /// Instance number
    fn instance(&self) -> u64;

    /// Untyped form
    fn object_id(&self) -> ObjectId {
        ObjectId::new(Self::SPACE, Self::TYPE, self.instance())
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $space:expr, $type_id:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap an instance number
            pub const fn new(instance: u64) -> Self {
                Self(instance)
            }
        }

        impl TypedId for $name {
            const SPACE: u8 = $space;
            const TYPE: u8 = $type_id;

            fn from_instance(instance: u64) -> Self {
                Self(instance)
            }

            fn instance(&self) -> u64 {
                self.0
            }
        }

        impl From<$name> for ObjectId {
            fn from(id: $name) -> ObjectId {
                id.object_id()
            }
        }

        impl TryFrom<ObjectId> for $name {
            type Error = ObjectIdError;

            fn try_from(id: ObjectId) -> Result<Self, Self::Error> {
                if id.space != $space || id.type_id != $type_id {
                    return Err(ObjectIdError::TypeMismatch {
                        got: id,
                        expected_space: $space,
                        expected_type: $type_id,
                    });
                }
                Ok(Self(id.instance))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}.{}", $space, $type_id, self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

typed_id!(
    /// Id of a key object
    KeyId, PROTOCOL_SPACE, protocol_type::KEY
);
typed_id!(
    /// Id of an account object
    AccountId, PROTOCOL_SPACE, protocol_type::ACCOUNT
);
typed_id!(
    /// Id of an asset object; instance 0 is the core asset
    AssetId, PROTOCOL_SPACE, protocol_type::ASSET
);
typed_id!(
    /// Id of a delegate object
    DelegateId, PROTOCOL_SPACE, protocol_type::DELEGATE
);
typed_id!(
    /// Id of a witness object
    WitnessId, PROTOCOL_SPACE, protocol_type::WITNESS
);
typed_id!(
    /// Id of a limit order object
    LimitOrderId, PROTOCOL_SPACE, protocol_type::LIMIT_ORDER
);
typed_id!(
    /// Id of a short order object
    ShortOrderId, PROTOCOL_SPACE, protocol_type::SHORT_ORDER
);
typed_id!(
    /// Id of a bond offer object
    BondOfferId, PROTOCOL_SPACE, protocol_type::BOND_OFFER
);
typed_id!(
    /// Id of a vesting balance object
    VestingBalanceId, PROTOCOL_SPACE, protocol_type::VESTING_BALANCE
);
typed_id!(
    /// Id of a worker object
    WorkerId, PROTOCOL_SPACE, protocol_type::WORKER
);
typed_id!(
    /// Id of the global properties singleton
    GlobalPropertyId, IMPLEMENTATION_SPACE, implementation_type::GLOBAL_PROPERTY
);
typed_id!(
    /// Id of the dynamic global properties singleton
    DynamicGlobalPropertyId, IMPLEMENTATION_SPACE, implementation_type::DYNAMIC_GLOBAL_PROPERTY
);
typed_id!(
    /// Id of an asset's dynamic data
    AssetDynamicDataId, IMPLEMENTATION_SPACE, implementation_type::ASSET_DYNAMIC_DATA
);
typed_id!(
    /// Id of an account balance record
    AccountBalanceId, IMPLEMENTATION_SPACE, implementation_type::ACCOUNT_BALANCE
);
typed_id!(
    /// Id of a vote tally
    VoteTallyId, IMPLEMENTATION_SPACE, implementation_type::VOTE_TALLY
);
typed_id!(
    /// Id of an applied-transaction record
    TransactionObjectId, IMPLEMENTATION_SPACE, implementation_type::TRANSACTION
);

impl AssetId {
    /// The core asset
    pub const CORE: AssetId = AssetId(0);
}

/// Vote category
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum VoteCategory {
    /// Committee (delegate) votes
    Committee,
    /// Witness votes
    Witness,
    /// Worker votes
    Worker,
}

/// A vote slot: category plus an instance allocated per category
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteId {
    /// Category
    pub category: VoteCategory,
    /// Instance within the category
    pub instance: u32,
}

impl VoteId {
    /// Create a vote id
    pub const fn new(category: VoteCategory, instance: u32) -> Self {
        Self { category, instance }
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category as u8, self.instance)
    }
}

impl fmt::Debug for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoteId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_text_roundtrip() {
        let id = ObjectId::new(1, 2, 42);
        assert_eq!(id.to_string(), "1.2.42");
        assert_eq!("1.2.42".parse::<ObjectId>().unwrap(), id);
    }

    #[test]
    fn test_object_id_malformed() {
        assert!("1.2".parse::<ObjectId>().is_err());
        assert!("1.2.3.4".parse::<ObjectId>().is_err());
        assert!("a.b.c".parse::<ObjectId>().is_err());
        assert!("1.300.0".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_typed_id_conversion() {
        let account = AccountId::new(7);
        let untyped: ObjectId = account.into();
        assert_eq!(untyped, ObjectId::new(PROTOCOL_SPACE, protocol_type::ACCOUNT, 7));
        assert!(untyped.is::<AccountId>());
        assert!(!untyped.is::<AssetId>());
        assert_eq!(AccountId::try_from(untyped).unwrap(), account);
    }

    #[test]
    fn test_typed_id_rejects_other_type() {
        let asset: ObjectId = AssetId::new(3).into();
        let err = AccountId::try_from(asset).unwrap_err();
        assert!(matches!(err, ObjectIdError::TypeMismatch { expected_type: 2, .. }));
    }

    #[test]
    fn test_typed_id_display() {
        assert_eq!(VoteTallyId::new(5).to_string(), "2.4.5");
        assert_eq!(format!("{:?}", KeyId::new(1)), "KeyId(1.1.1)");
        assert_eq!(AssetId::CORE.to_string(), "1.3.0");
    }

    #[test]
    fn test_typed_ids_order_by_instance() {
        let mut ids = vec![WorkerId::new(3), WorkerId::new(1), WorkerId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![WorkerId::new(1), WorkerId::new(2), WorkerId::new(3)]);
    }

    #[test]
    fn test_vote_id_display() {
        let vote = VoteId::new(VoteCategory::Witness, 9);
        assert_eq!(vote.to_string(), "1:9");
    }
}
