//! Undo log: nested sessions of pre-images.
//!
//! While a session is open, the database records the id of every created
//! object and the pre-image of every modified or removed one, along with
//! each index's instance counter before its first creation. Rolling a
//! session back replays the records in reverse and restores the counters.
//! Committing a nested session merges it into its parent. A block's
//! outermost session moves to a bounded history used to pop whole blocks;
//! any other outermost commit is permanent and ends that history, since the
//! blocks below it can no longer be undone in order.

use crate::error::{ChainError, ChainResult};
use crate::store::{AnyObject, ObjectStore};
use std::collections::{BTreeMap, VecDeque};
use strata_primitives::ObjectId;

/// One recorded change
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum UndoRecord {
    Created(ObjectId),
    Modified(AnyObject),
    Removed(AnyObject),
}

#[derive(Debug, Default)]
pub(crate) struct UndoSession {
    records: Vec<UndoRecord>,
    // (space, type) -> next instance before the session's first creation
    next_instances: BTreeMap<(u8, u8), u64>,
}

impl UndoSession {
    fn merge_into(self, parent: &mut UndoSession) {
        parent.records.extend(self.records);
        for (key, next) in self.next_instances {
            parent.next_instances.entry(key).or_insert(next);
        }
    }

    fn undo(self, store: &mut ObjectStore) {
        for record in self.records.into_iter().rev() {
            match record {
                UndoRecord::Created(id) => store.erase_any(id),
                UndoRecord::Modified(object) | UndoRecord::Removed(object) => {
                    store.restore_any(object)
                }
            }
        }
        for ((space, type_id), next) in self.next_instances {
            store.set_next_instance(space, type_id, next);
        }
    }
}

/// Stack of open sessions plus the history of committed outermost ones
#[derive(Debug)]
pub struct UndoLog {
    stack: Vec<UndoSession>,
    history: VecDeque<UndoSession>,
    max_history: usize,
}

impl UndoLog {
    /// Log keeping at most `max_history` committed sessions
    pub fn new(max_history: usize) -> Self {
        Self {
            stack: Vec::new(),
            history: VecDeque::new(),
            max_history,
        }
    }

    /// Number of open sessions
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether changes are being recorded
    pub fn is_active(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Number of committed sessions that can still be undone
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn begin(&mut self) {
        self.stack.push(UndoSession::default());
    }

    pub(crate) fn on_create(&mut self, id: ObjectId, prior_next_instance: u64) {
        if let Some(session) = self.stack.last_mut() {
            session
                .next_instances
                .entry((id.space, id.type_id))
                .or_insert(prior_next_instance);
            session.records.push(UndoRecord::Created(id));
        }
    }

    pub(crate) fn on_modify(&mut self, before: AnyObject) {
        if let Some(session) = self.stack.last_mut() {
            session.records.push(UndoRecord::Modified(before));
        }
    }

    pub(crate) fn on_remove(&mut self, removed: AnyObject) {
        if let Some(session) = self.stack.last_mut() {
            session.records.push(UndoRecord::Removed(removed));
        }
    }

    pub(crate) fn commit(&mut self) -> ChainResult<()> {
        let session = self.stack.pop().ok_or(ChainError::NoUndoSession)?;
        match self.stack.last_mut() {
            Some(parent) => session.merge_into(parent),
            None => self.history.clear(),
        }
        Ok(())
    }

    /// Close the outermost session of a block, keeping it undoable
    pub(crate) fn commit_block(&mut self) -> ChainResult<()> {
        match self.stack.len() {
            0 => return Err(ChainError::NoUndoSession),
            1 => {}
            _ => return Err(ChainError::UndoSessionOpen),
        }
        let session = self.stack.pop().ok_or(ChainError::NoUndoSession)?;
        self.history.push_back(session);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
        Ok(())
    }

    pub(crate) fn rollback(&mut self, store: &mut ObjectStore) -> ChainResult<()> {
        let session = self.stack.pop().ok_or(ChainError::NoUndoSession)?;
        session.undo(store);
        Ok(())
    }

    /// Close the top session keeping its changes and no way to undo them
    pub(crate) fn forget(&mut self) -> ChainResult<()> {
        self.stack.pop().ok_or(ChainError::NoUndoSession)?;
        Ok(())
    }

    /// Move the newest committed session back onto the stack
    pub(crate) fn reopen_last(&mut self) -> bool {
        match self.history.pop_back() {
            Some(session) => {
                self.stack.push(session);
                true
            }
            None => false,
        }
    }

    pub(crate) fn pop_history(&mut self, store: &mut ObjectStore) -> ChainResult<()> {
        let session = self.history.pop_back().ok_or(ChainError::NoBlockToPop)?;
        session.undo(store);
        Ok(())
    }
}
