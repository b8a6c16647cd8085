//! # Sparse Set
//!
//! Bidirectional id ↔ dense index mapping.
//!
//! ```text
//! sparse: [ 1, -1,  0, -1,  2]   id → dense index (or INVALID_INDEX)
//! packed: [ 2,  0,  4]           dense index → id
//! ```
//!
//! Two packing policies are supported:
//!
//! - **Continuous**: removal swaps the last live slot into the freed one.
//!   Packed ids are always gap-free, but dense positions move on removal.
//! - **With holes**: removal leaves a tombstone linked into an intrusive free
//!   list. Dense positions stay stable until [`SparseSet::compact`].
//!
//! Payload storage bound to a set follows every dense move through the
//! [`DenseData`] hooks, so the set itself stays payload-agnostic.

use serde::{Deserialize, Serialize};

use super::entity::{capacity_for, hole_link, is_tombstone, tombstone, Id, END_HOLE, INVALID_INDEX};

/// Packing policy of a sparse set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Packing {
    /// Swap-remove compaction. No holes, dense indices move on removal.
    #[default]
    Continuous,
    /// Tombstones in place. Dense indices are stable until compaction.
    WithHoles,
}

/// Bookkeeping of a sparse set, read and written by rollback and
/// serialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetState {
    /// Number of occupied dense slots, tombstones included.
    pub count: usize,
    /// Head of the free list, or [`END_HOLE`].
    pub next_hole: i32,
    /// Packing policy.
    pub packing: Packing,
}

impl Default for SetState {
    fn default() -> Self {
        Self {
            count: 0,
            next_hole: END_HOLE,
            packing: Packing::Continuous,
        }
    }
}

/// Payload hooks invoked whenever a sparse set moves dense slots.
///
/// The default implementations do nothing, which is exactly what a
/// payload-free set needs.
pub trait DenseData {
    /// Makes sure a payload slot exists at `index`.
    fn ensure_data_at(&mut self, _index: usize) {}

    /// Exchanges the payloads of two dense slots.
    fn swap_data_at(&mut self, _first: usize, _second: usize) {}

    /// Moves the payload of `source` into `destination`. `source` is dead
    /// afterwards.
    fn move_data_at(&mut self, _source: usize, _destination: usize) {}

    /// Copies the payload of `source` into `destination`.
    fn copy_data_at(&mut self, _source: usize, _destination: usize) {}
}

impl DenseData for () {}

/// Sparse set of entity ids.
///
/// # Example
///
/// ```rust
/// use rewind_core::{Packing, SparseSet};
///
/// let mut set = SparseSet::new(Packing::Continuous);
/// set.assign(0);
/// set.assign(1);
/// set.assign(2);
/// set.unassign(1);
///
/// assert!(set.is_assigned(2));
/// assert_eq!(set.index_of(2), Some(1));
/// ```
#[derive(Clone, Debug)]
pub struct SparseSet {
    sparse: Vec<i32>,
    packed: Vec<i32>,
    count: usize,
    next_hole: i32,
    packing: Packing,
}

impl SparseSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(packing: Packing) -> Self {
        Self::with_capacity(0, packing)
    }

    /// Creates an empty set with `capacity` ids and slots pre-allocated.
    #[must_use]
    pub fn with_capacity(capacity: usize, packing: Packing) -> Self {
        Self {
            sparse: vec![INVALID_INDEX; capacity],
            packed: vec![INVALID_INDEX; capacity],
            count: 0,
            next_hole: END_HOLE,
            packing,
        }
    }

    /// Number of occupied dense slots. Tombstones count as occupied.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` if no dense slot is occupied.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Packing policy.
    #[inline]
    #[must_use]
    pub const fn packing(&self) -> Packing {
        self.packing
    }

    /// Returns `true` if `packed[..count]` contains no tombstones.
    #[inline]
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.packing == Packing::Continuous || self.next_hole == END_HOLE
    }

    /// Returns `true` if `packed[..count]` contains tombstones.
    #[inline]
    #[must_use]
    pub fn has_holes(&self) -> bool {
        !self.is_continuous()
    }

    /// Current bookkeeping.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SetState {
        SetState {
            count: self.count,
            next_hole: self.next_hole,
            packing: self.packing,
        }
    }

    /// Overwrites the bookkeeping. For rollback and deserialization only:
    /// the caller is responsible for restoring `packed` and `sparse`.
    #[inline]
    pub fn set_state(&mut self, state: SetState) {
        self.count = state.count;
        self.next_hole = state.next_hole;
        self.packing = state.packing;
    }

    /// Checks whether `id` is assigned.
    #[inline]
    #[must_use]
    pub fn is_assigned(&self, id: Id) -> bool {
        self.index_or_invalid(id) != INVALID_INDEX
    }

    /// Dense index of `id`, or [`INVALID_INDEX`].
    #[inline]
    #[must_use]
    pub fn index_or_invalid(&self, id: Id) -> i32 {
        if id < 0 {
            return INVALID_INDEX;
        }
        self.sparse.get(id as usize).copied().unwrap_or(INVALID_INDEX)
    }

    /// Dense index of `id`, if assigned.
    #[inline]
    #[must_use]
    pub fn index_of(&self, id: Id) -> Option<usize> {
        let index = self.index_or_invalid(id);
        (index != INVALID_INDEX).then_some(index as usize)
    }

    /// Live ids in dense order. Tombstones are skipped.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = Id> + '_ {
        self.packed[..self.count]
            .iter()
            .copied()
            .filter(|&slot| !is_tombstone(slot))
    }

    /// Raw dense array. Only `[..count]` is meaningful.
    #[inline]
    #[must_use]
    pub fn packed(&self) -> &[i32] {
        &self.packed
    }

    /// Raw dense array, for bulk restore.
    #[inline]
    pub fn packed_mut(&mut self) -> &mut [i32] {
        &mut self.packed
    }

    /// Raw sparse lookup array.
    #[inline]
    #[must_use]
    pub fn sparse(&self) -> &[i32] {
        &self.sparse
    }

    /// Raw sparse lookup array, for bulk restore.
    #[inline]
    pub fn sparse_mut(&mut self) -> &mut [i32] {
        &mut self.sparse
    }

    /// Assigns `id`. Returns `true` if it was not assigned before.
    #[inline]
    pub fn assign(&mut self, id: Id) -> bool {
        self.assign_with(id, &mut ())
    }

    /// Assigns `id`, growing `data` in lockstep with the dense array.
    pub fn assign_with<D: DenseData + ?Sized>(&mut self, id: Id, data: &mut D) -> bool {
        if id < 0 || self.is_assigned(id) {
            return false;
        }

        self.ensure_sparse_at(id as usize);

        if self.packing == Packing::WithHoles && self.next_hole != END_HOLE {
            let index = self.next_hole as usize;
            self.next_hole = hole_link(self.packed[index]);
            self.pair(id, index);
        } else {
            let index = self.count;
            self.ensure_packed_at(index);
            data.ensure_data_at(index);
            self.pair(id, index);
            self.count += 1;
        }

        true
    }

    /// Unassigns `id`. Returns `true` if it was assigned.
    #[inline]
    pub fn unassign(&mut self, id: Id) -> bool {
        self.unassign_with(id, &mut ())
    }

    /// Unassigns `id`, moving payloads of `data` in lockstep.
    pub fn unassign_with<D: DenseData + ?Sized>(&mut self, id: Id, data: &mut D) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };

        match self.packing {
            Packing::Continuous => {
                self.count -= 1;
                self.move_at(self.count, index, data);
            }
            Packing::WithHoles => {
                self.packed[index] = tombstone(self.next_hole);
                self.next_hole = index as i32;
            }
        }

        self.sparse[id as usize] = INVALID_INDEX;
        true
    }

    /// Removes all holes from the dense array.
    #[inline]
    pub fn compact(&mut self) {
        self.compact_with(&mut ());
    }

    /// Removes all holes, moving payloads of `data` in lockstep.
    pub fn compact_with<D: DenseData + ?Sized>(&mut self, data: &mut D) {
        if !self.has_holes() {
            return;
        }

        let before = self.count;
        let mut count = self.trim_trailing_holes(self.count);
        let mut next_hole = self.next_hole;

        while next_hole != END_HOLE {
            let hole = next_hole as usize;
            next_hole = hole_link(self.packed[hole]);
            if hole < count {
                count -= 1;
                self.move_at(count, hole, data);
                count = self.trim_trailing_holes(count);
            }
        }

        self.count = count;
        self.next_hole = END_HOLE;

        tracing::trace!("compacted set: {} -> {} slots", before, count);
    }

    /// Unassigns every live id without moving any slot.
    pub fn clear(&mut self) {
        for index in (0..self.count).rev() {
            let id = self.packed[index];
            if !is_tombstone(id) {
                self.sparse[id as usize] = INVALID_INDEX;
            }
        }
        self.count = 0;
        self.next_hole = END_HOLE;
    }

    /// Resets the whole lookup array. For deserialization only.
    pub fn clear_without_notify(&mut self) {
        self.sparse.fill(INVALID_INDEX);
        self.count = 0;
        self.next_hole = END_HOLE;
    }

    /// Exchanges two live dense slots.
    ///
    /// # Panics
    ///
    /// Panics if either slot is a tombstone.
    #[inline]
    pub fn swap_at(&mut self, first: usize, second: usize) {
        self.swap_at_with(first, second, &mut ());
    }

    /// Exchanges two live dense slots together with their payloads.
    ///
    /// # Panics
    ///
    /// Panics if either slot is a tombstone.
    pub fn swap_at_with<D: DenseData + ?Sized>(&mut self, first: usize, second: usize, data: &mut D) {
        if first == second {
            return;
        }

        let first_id = self.packed[first];
        let second_id = self.packed[second];
        assert!(
            !is_tombstone(first_id) && !is_tombstone(second_id),
            "can't swap a removed slot"
        );

        self.pair(first_id, second);
        self.pair(second_id, first);
        data.swap_data_at(first, second);
    }

    /// Grows the dense array so that `index` is addressable.
    #[inline]
    pub fn ensure_packed_at(&mut self, index: usize) {
        if index >= self.packed.len() {
            self.packed.resize(capacity_for(index), INVALID_INDEX);
        }
    }

    /// Grows the lookup array so that id `index` is addressable.
    #[inline]
    pub fn ensure_sparse_at(&mut self, index: usize) {
        if index >= self.sparse.len() {
            self.sparse.resize(capacity_for(index), INVALID_INDEX);
        }
    }

    /// Pre-allocates room for ids and dense slots below `capacity`.
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > 0 {
            self.ensure_sparse_at(capacity - 1);
            self.ensure_packed_at(capacity - 1);
        }
    }

    /// Resizes the lookup array to exactly `len` entries. New entries are
    /// unassigned; dropped entries must not be assigned.
    pub fn resize_sparse(&mut self, len: usize) {
        self.sparse.resize(len, INVALID_INDEX);
    }

    #[inline]
    fn move_at<D: DenseData + ?Sized>(&mut self, source: usize, destination: usize, data: &mut D) {
        let source_id = self.packed[source];
        self.pair(source_id, destination);
        if source != destination {
            data.move_data_at(source, destination);
        }
    }

    #[inline]
    fn pair(&mut self, id: Id, index: usize) {
        debug_assert!(id >= 0, "pairing a removed slot");
        self.sparse[id as usize] = index as i32;
        self.packed[index] = id;
    }

    #[inline]
    fn trim_trailing_holes(&self, mut count: usize) -> usize {
        while count > 0 && is_tombstone(self.packed[count - 1]) {
            count -= 1;
        }
        count
    }
}

impl Default for SparseSet {
    fn default() -> Self {
        Self::new(Packing::Continuous)
    }
}

/// Returns the set with the fewest occupied slots.
pub fn minimal_set<'a, I>(sets: I) -> Option<&'a SparseSet>
where
    I: IntoIterator<Item = &'a SparseSet>,
{
    sets.into_iter().min_by_key(|set| set.count())
}
