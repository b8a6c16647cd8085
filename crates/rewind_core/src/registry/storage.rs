//! # Set Storage
//!
//! Type-erased rewindable sets, addressed by [`SetId`].
//!
//! Every registered kind is stored behind [`ComponentSet`], which exposes the
//! payload-agnostic surface groups and frame operations need. Typed access
//! downcasts back to the concrete set through `as_any`.

use std::any::{type_name, Any};

use crate::ecs::{DataSet, GroupSets, Id, PayloadKind, SetId, SetSource, SparseSet};
use crate::error::{StorageError, StorageResult};
use crate::rollback::{Rewindable, RewindableDataSet, RewindableSet};

/// Payload-agnostic view of a registered set.
pub trait ComponentSet: Any {
    /// Id bookkeeping of the set.
    fn sparse_set(&self) -> &SparseSet;

    /// Assigns `id` without notifying anyone.
    fn assign(&mut self, id: Id) -> bool;

    /// Unassigns `id` without notifying anyone.
    fn unassign(&mut self, id: Id) -> bool;

    /// Exchanges two dense slots, payloads included.
    fn swap_dense(&mut self, first: usize, second: usize);

    /// Removes holes.
    fn compact(&mut self);

    /// Drops every id without events or payload moves.
    fn clear_without_notify(&mut self);

    /// Captures the current state as the newest frame.
    fn save_frame(&mut self);

    /// Restores an older frame. See [`Rewindable::rollback`].
    fn rollback(&mut self, frames: usize) -> usize;

    /// Deepest rollback available.
    fn can_rollback_frames(&self) -> usize;

    /// Copy strategy, `None` for payload-free sets.
    fn payload_kind(&self) -> Option<PayloadKind>;

    /// For downcasting to the concrete set.
    fn as_any(&self) -> &dyn Any;

    /// For downcasting to the concrete set.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl ComponentSet for RewindableSet {
    #[inline]
    fn sparse_set(&self) -> &SparseSet {
        self.inner()
    }

    #[inline]
    fn assign(&mut self, id: Id) -> bool {
        self.inner_mut().assign(id)
    }

    #[inline]
    fn unassign(&mut self, id: Id) -> bool {
        self.inner_mut().unassign(id)
    }

    #[inline]
    fn swap_dense(&mut self, first: usize, second: usize) {
        self.inner_mut().swap_at(first, second);
    }

    fn compact(&mut self) {
        self.inner_mut().compact();
    }

    fn clear_without_notify(&mut self) {
        self.inner_mut().clear_without_notify();
    }

    fn save_frame(&mut self) {
        Rewindable::save_frame(self);
    }

    fn rollback(&mut self, frames: usize) -> usize {
        Rewindable::rollback(self, frames)
    }

    fn can_rollback_frames(&self) -> usize {
        Rewindable::can_rollback_frames(self)
    }

    fn payload_kind(&self) -> Option<PayloadKind> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<T: Default + 'static> ComponentSet for RewindableDataSet<T> {
    #[inline]
    fn sparse_set(&self) -> &SparseSet {
        self.inner().sparse_set()
    }

    #[inline]
    fn assign(&mut self, id: Id) -> bool {
        self.inner_mut().assign(id)
    }

    #[inline]
    fn unassign(&mut self, id: Id) -> bool {
        self.inner_mut().unassign(id)
    }

    #[inline]
    fn swap_dense(&mut self, first: usize, second: usize) {
        self.inner_mut().swap_at(first, second);
    }

    fn compact(&mut self) {
        self.inner_mut().compact();
    }

    fn clear_without_notify(&mut self) {
        self.inner_mut().sparse_set_mut().clear_without_notify();
    }

    fn save_frame(&mut self) {
        Rewindable::save_frame(self);
    }

    fn rollback(&mut self, frames: usize) -> usize {
        Rewindable::rollback(self, frames)
    }

    fn can_rollback_frames(&self) -> usize {
        Rewindable::can_rollback_frames(self)
    }

    fn payload_kind(&self) -> Option<PayloadKind> {
        Some(self.inner().payload_kind())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All registered sets, indexed by [`SetId`].
#[derive(Default)]
pub struct SetTable {
    sets: Vec<Box<dyn ComponentSet>>,
}

impl SetTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a set and returns its id.
    pub fn push(&mut self, set: Box<dyn ComponentSet>) -> SetId {
        self.sets.push(set);
        self.sets.len() - 1
    }

    /// Number of sets.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` if no set is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// A registered set, if any.
    #[must_use]
    pub fn get(&self, set: SetId) -> Option<&dyn ComponentSet> {
        self.sets.get(set).map(|storage| storage.as_ref())
    }

    /// A registered set.
    ///
    /// # Panics
    ///
    /// Panics if `set` is not registered.
    #[inline]
    pub fn storage_mut(&mut self, set: SetId) -> &mut (dyn ComponentSet + 'static) {
        match self.sets.get_mut(set) {
            Some(storage) => storage.as_mut(),
            None => panic!("set {set} is not registered"),
        }
    }

    /// Every set, in registration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn ComponentSet + 'static)> + '_ {
        self.sets.iter_mut().map(|storage| storage.as_mut())
    }

    /// Typed data set registered as `set`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`] or [`StorageError::KindMismatch`].
    pub fn data<T: Default + 'static>(&self, set: SetId) -> StorageResult<&RewindableDataSet<T>> {
        self.get(set)
            .ok_or_else(|| StorageError::UnknownSet(format!("set {set}")))?
            .as_any()
            .downcast_ref::<RewindableDataSet<T>>()
            .ok_or(StorageError::KindMismatch {
                set,
                expected: type_name::<T>(),
            })
    }

    /// Typed data set registered as `set`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`] or [`StorageError::KindMismatch`].
    pub fn data_mut<T: Default + 'static>(&mut self, set: SetId) -> StorageResult<&mut DataSet<T>> {
        self.sets
            .get_mut(set)
            .ok_or_else(|| StorageError::UnknownSet(format!("set {set}")))?
            .as_any_mut()
            .downcast_mut::<RewindableDataSet<T>>()
            .map(Rewindable::inner_mut)
            .ok_or(StorageError::KindMismatch {
                set,
                expected: type_name::<T>(),
            })
    }
}

impl SetSource for SetTable {
    #[inline]
    fn set(&self, id: SetId) -> &SparseSet {
        self.sets[id].sparse_set()
    }
}

impl GroupSets for SetTable {
    #[inline]
    fn swap_dense(&mut self, set: SetId, first: usize, second: usize) {
        self.sets[set].swap_dense(first, second);
    }
}
