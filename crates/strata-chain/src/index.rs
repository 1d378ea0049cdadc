//! Per-type object container with change notifications.
//!
//! An [`Index`] owns every object of one `(space, type)` and assigns
//! instances in creation order. `create`, `modify` and `remove` are the only
//! ways to change its contents; each fires the matching [`IndexObserver`]
//! callback synchronously.

use crate::error::{ChainError, ChainResult};
use crate::object::Object;
use std::collections::BTreeMap;
use std::sync::Arc;
use strata_primitives::TypedId;

/// Receives changes made to one index
pub trait IndexObserver<T: Object>: Send + Sync {
    /// Object was inserted
    fn on_add(&self, _object: &T) {}

    /// Object was changed; receives the new state
    fn on_modify(&self, _object: &T) {}

    /// Object is about to be erased
    fn on_remove(&self, _object: &T) {}
}

/// Ordered container `instance -> object` for one object type
pub struct Index<T: Object> {
    objects: BTreeMap<u64, T>,
    by_key: BTreeMap<T::Key, u64>,
    next_instance: u64,
    observers: Vec<Arc<dyn IndexObserver<T>>>,
}

impl<T: Object> Default for Index<T> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            by_key: BTreeMap::new(),
            next_instance: 0,
            observers: Vec::new(),
        }
    }
}

impl<T: Object> Index<T> {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next created object will receive
    pub fn next_id(&self) -> T::Id {
        T::Id::from_instance(self.next_instance)
    }

    /// Allocate the next id, build the object with `init` and insert it
    pub fn create<F>(&mut self, init: F) -> ChainResult<T::Id>
    where
        F: FnOnce(T::Id) -> T,
    {
        let id = self.next_id();
        let object = init(id);
        if object.id() != id {
            return Err(ChainError::IdMismatch {
                expected: id.object_id(),
                got: object.id().object_id(),
            });
        }
        let instance = id.instance();
        if let Some(key) = object.secondary_key() {
            if self.by_key.contains_key(&key) {
                return Err(duplicate_key::<T>(&key));
            }
            self.by_key.insert(key, instance);
        }
        self.next_instance += 1;
        self.objects.insert(instance, object);

        if let Some(object) = self.objects.get(&instance) {
            for observer in &self.observers {
                observer.on_add(object);
            }
        }
        Ok(id)
    }

    /// Mutate an object in place, returning its previous state.
    ///
    /// A mutator that changes the id, or moves the object onto a secondary
    /// key already in use, is rejected and the object restored.
    pub fn modify<F>(&mut self, id: T::Id, mutate: F) -> ChainResult<T>
    where
        F: FnOnce(&mut T),
    {
        let object = self
            .objects
            .get_mut(&id.instance())
            .ok_or(ChainError::ObjectNotFound(id.object_id()))?;
        let before = object.clone();
        mutate(object);

        if object.id() != id {
            *object = before;
            return Err(ChainError::IdChanged(id.object_id()));
        }

        let old_key = before.secondary_key();
        let new_key = object.secondary_key();
        if old_key != new_key {
            if let Some(key) = &new_key {
                if self.by_key.contains_key(key) {
                    *object = before;
                    return Err(duplicate_key::<T>(key));
                }
            }
            if let Some(key) = old_key {
                self.by_key.remove(&key);
            }
            if let Some(key) = new_key {
                self.by_key.insert(key, id.instance());
            }
        }

        for observer in &self.observers {
            observer.on_modify(object);
        }
        Ok(before)
    }

    /// Erase an object, returning it
    pub fn remove(&mut self, id: T::Id) -> ChainResult<T> {
        let object = self
            .objects
            .get(&id.instance())
            .ok_or(ChainError::ObjectNotFound(id.object_id()))?;
        for observer in &self.observers {
            observer.on_remove(object);
        }
        self.erase(id.instance())
            .ok_or(ChainError::ObjectNotFound(id.object_id()))
    }

    /// Look up by id
    pub fn find(&self, id: T::Id) -> Option<&T> {
        self.objects.get(&id.instance())
    }

    /// Look up by id, failing if absent
    pub fn get(&self, id: T::Id) -> ChainResult<&T> {
        self.find(id).ok_or(ChainError::ObjectNotFound(id.object_id()))
    }

    /// Look up by secondary key
    pub fn find_by_key(&self, key: &T::Key) -> Option<&T> {
        self.by_key
            .get(key)
            .and_then(|instance| self.objects.get(instance))
    }

    /// Objects in id order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.objects.values()
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the index holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Register an observer
    pub fn add_observer(&mut self, observer: Arc<dyn IndexObserver<T>>) {
        self.observers.push(observer);
    }

    // Undo support: these bypass observers.

    pub(crate) fn restore(&mut self, object: T) {
        let instance = object.id().instance();
        if let Some(current) = self.objects.remove(&instance) {
            if let Some(key) = current.secondary_key() {
                self.by_key.remove(&key);
            }
        }
        if let Some(key) = object.secondary_key() {
            self.by_key.insert(key, instance);
        }
        self.objects.insert(instance, object);
    }

    pub(crate) fn erase(&mut self, instance: u64) -> Option<T> {
        let object = self.objects.remove(&instance)?;
        if let Some(key) = object.secondary_key() {
            self.by_key.remove(&key);
        }
        Some(object)
    }

    pub(crate) fn next_instance(&self) -> u64 {
        self.next_instance
    }

    pub(crate) fn set_next_instance(&mut self, next: u64) {
        self.next_instance = next;
    }
}

fn duplicate_key<T: Object>(key: &T::Key) -> ChainError {
    ChainError::DuplicateKey {
        object_type: T::TYPE_NAME,
        key: format!("{:?}", key),
    }
}
