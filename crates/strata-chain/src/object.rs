//! Base trait of every persisted entity

use std::fmt::Debug;
use strata_primitives::TypedId;

/// A chain object: identified by a typed id assigned once at creation
pub trait Object: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Typed id; fixes the object's space and type
    type Id: TypedId;

    /// Unique secondary key, `()` for types without one
    type Key: Ord + Clone + Debug + Send + Sync;

    /// Short type name for errors and logs
    const TYPE_NAME: &'static str;

    /// Id of this object
    fn id(&self) -> Self::Id;

    /// Secondary key, if the type is indexed by one
    fn secondary_key(&self) -> Option<Self::Key> {
        None
    }
}
