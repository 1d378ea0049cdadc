//! Registry of every index, and type-erased object snapshots

use crate::index::Index;
use crate::object::Object;
use crate::objects::*;
use serde::{Deserialize, Serialize};
use strata_primitives::{
    AccountBalanceId, AccountId, AssetDynamicDataId, AssetId, BondOfferId, DelegateId,
    DynamicGlobalPropertyId, GlobalPropertyId, KeyId, LimitOrderId, ObjectId, ShortOrderId,
    TransactionObjectId, TypedId, VestingBalanceId, VoteTallyId, WitnessId, WorkerId,
};

/// An object type held in the [`ObjectStore`]
pub trait StoredObject: Object {
    /// The index holding this type
    fn index(store: &ObjectStore) -> &Index<Self>;

    /// The index holding this type, mutably
    fn index_mut(store: &mut ObjectStore) -> &mut Index<Self>;

    /// Type-erased snapshot
    fn into_any(self) -> AnyObject;
}

/// A typed id whose object lives in the [`ObjectStore`]
pub trait ObjectRef: TypedId {
    /// Object type the id refers to
    type Object: StoredObject<Id = Self>;
}

macro_rules! object_store {
    ($($field:ident: $object:ident => $id:ty,)*) => {
        /// One index per object type
        #[derive(Default)]
        pub struct ObjectStore {
            $($field: Index<$object>,)*
        }

        /// Snapshot of any stored object
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        pub enum AnyObject {
            $(
                #[allow(missing_docs)]
                $object($object),
            )*
        }

        impl AnyObject {
            /// Id of the object
            pub fn object_id(&self) -> ObjectId {
                match self {
                    $(AnyObject::$object(object) => object.id().object_id(),)*
                }
            }

            /// Type name of the object
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(AnyObject::$object(_) => <$object as Object>::TYPE_NAME,)*
                }
            }
        }

        $(
            impl StoredObject for $object {
                fn index(store: &ObjectStore) -> &Index<Self> {
                    &store.$field
                }

                fn index_mut(store: &mut ObjectStore) -> &mut Index<Self> {
                    &mut store.$field
                }

                fn into_any(self) -> AnyObject {
                    AnyObject::$object(self)
                }
            }

            impl ObjectRef for $id {
                type Object = $object;
            }
        )*

        impl ObjectStore {
            pub(crate) fn restore_any(&mut self, object: AnyObject) {
                match object {
                    $(AnyObject::$object(object) => self.$field.restore(object),)*
                }
            }

            pub(crate) fn erase_any(&mut self, id: ObjectId) {
                $(
                    if id.is::<$id>() {
                        self.$field.erase(id.instance);
                        return;
                    }
                )*
            }

            #[cfg(test)]
            pub(crate) fn next_instance(&self, space: u8, type_id: u8) -> Option<u64> {
                $(
                    if space == <$id>::SPACE && type_id == <$id>::TYPE {
                        return Some(self.$field.next_instance());
                    }
                )*
                None
            }

            pub(crate) fn set_next_instance(&mut self, space: u8, type_id: u8, next: u64) {
                $(
                    if space == <$id>::SPACE && type_id == <$id>::TYPE {
                        self.$field.set_next_instance(next);
                        return;
                    }
                )*
            }
        }
    };
}

object_store! {
    keys: KeyObject => KeyId,
    accounts: AccountObject => AccountId,
    assets: AssetObject => AssetId,
    delegates: DelegateObject => DelegateId,
    witnesses: WitnessObject => WitnessId,
    limit_orders: LimitOrderObject => LimitOrderId,
    short_orders: ShortOrderObject => ShortOrderId,
    bond_offers: BondOfferObject => BondOfferId,
    vesting_balances: VestingBalanceObject => VestingBalanceId,
    workers: WorkerObject => WorkerId,
    global_properties: GlobalPropertyObject => GlobalPropertyId,
    dynamic_global_properties: DynamicGlobalPropertyObject => DynamicGlobalPropertyId,
    asset_dynamic_data: AssetDynamicDataObject => AssetDynamicDataId,
    account_balances: AccountBalanceObject => AccountBalanceId,
    vote_tallies: VoteTallyObject => VoteTallyId,
    transactions: TransactionObject => TransactionObjectId,
}
