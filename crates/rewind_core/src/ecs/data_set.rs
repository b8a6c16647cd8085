//! # Data Set
//!
//! A sparse set bound to a paged payload column.
//!
//! Payload slot `i` always belongs to the id at dense index `i`. Every dense
//! move the set performs is mirrored into the column through the
//! [`DenseData`] hooks, using the copy strategy chosen at construction.

use std::fmt;

use super::component::{Blittable, DeepCopy, PayloadCopy, PayloadKind};
use super::entity::{is_tombstone, Id};
use super::sparse_set::{DenseData, Packing, SparseSet};
use crate::memory::PagedArray;

/// Payload column plus its copy strategy.
pub(crate) struct Payload<T: 'static> {
    pub(crate) data: PagedArray<T>,
    pub(crate) copier: &'static dyn PayloadCopy<T>,
}

impl<T: Default + 'static> DenseData for Payload<T> {
    #[inline]
    fn ensure_data_at(&mut self, index: usize) {
        self.data.ensure_page_at(index);
    }

    #[inline]
    fn swap_data_at(&mut self, first: usize, second: usize) {
        self.data.swap(first, second);
    }

    // The source slot is dead afterwards, so a swap is a valid move for
    // both payload kinds and never clones.
    #[inline]
    fn move_data_at(&mut self, source: usize, destination: usize) {
        self.data.swap(source, destination);
    }

    #[inline]
    fn copy_data_at(&mut self, source: usize, destination: usize) {
        let copier = self.copier;
        if let Some((source, destination)) = self.data.get_pair_mut(source, destination) {
            copier.copy_value(source, destination);
        }
    }
}

/// Storage for one component kind.
///
/// # Example
///
/// ```rust
/// use rewind_core::{DataSet, Packing};
///
/// let mut health: DataSet<u32> = DataSet::new(1024, Packing::Continuous);
/// health.insert(3, 100);
/// health.insert(8, 75);
/// health.unassign(3);
///
/// assert_eq!(health.get(8), Some(&75));
/// assert_eq!(health.get(3), None);
/// ```
pub struct DataSet<T: 'static> {
    set: SparseSet,
    payload: Payload<T>,
}

impl<T: bytemuck::Pod + Default> DataSet<T> {
    /// Creates a blittable data set.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[must_use]
    pub fn new(page_size: usize, packing: Packing) -> Self {
        Self::with_copier(&Blittable, page_size, packing)
    }
}

impl<T: Clone + Default + 'static> DataSet<T> {
    /// Creates a data set whose payloads are deep-copied.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[must_use]
    pub fn managed(page_size: usize, packing: Packing) -> Self {
        Self::with_copier(&DeepCopy, page_size, packing)
    }
}

impl<T: Default + 'static> DataSet<T> {
    /// Creates a data set with an explicit copy strategy.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two.
    #[must_use]
    pub fn with_copier(copier: &'static dyn PayloadCopy<T>, page_size: usize, packing: Packing) -> Self {
        Self {
            set: SparseSet::new(packing),
            payload: Payload {
                data: PagedArray::new(page_size),
                copier,
            },
        }
    }

    /// The underlying sparse set.
    #[inline]
    #[must_use]
    pub const fn sparse_set(&self) -> &SparseSet {
        &self.set
    }

    /// The underlying sparse set, for bulk restore.
    ///
    /// Moving dense slots through this reference leaves payloads behind.
    #[inline]
    pub fn sparse_set_mut(&mut self) -> &mut SparseSet {
        &mut self.set
    }

    /// The payload column.
    #[inline]
    #[must_use]
    pub const fn data(&self) -> &PagedArray<T> {
        &self.payload.data
    }

    /// The payload column, for bulk restore.
    #[inline]
    pub fn data_mut(&mut self) -> &mut PagedArray<T> {
        &mut self.payload.data
    }

    /// Copy strategy of this set.
    #[inline]
    #[must_use]
    pub fn payload_kind(&self) -> PayloadKind {
        self.payload.copier.kind()
    }

    /// Number of occupied dense slots.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> usize {
        self.set.count()
    }

    /// Checks whether `id` is assigned.
    #[inline]
    #[must_use]
    pub fn is_assigned(&self, id: Id) -> bool {
        self.set.is_assigned(id)
    }

    /// Assigns `id` with a default payload. Returns `true` if newly assigned.
    pub fn assign(&mut self, id: Id) -> bool {
        if !self.set.assign_with(id, &mut self.payload) {
            return false;
        }
        if let Some(slot) = self.slot_mut(id) {
            *slot = T::default();
        }
        true
    }

    /// Assigns `id` if needed and stores `value`.
    ///
    /// Returns `true` if `id` was newly assigned. Negative ids are ignored.
    pub fn insert(&mut self, id: Id, value: T) -> bool {
        let assigned = self.set.assign_with(id, &mut self.payload);
        if let Some(slot) = self.slot_mut(id) {
            *slot = value;
        }
        assigned
    }

    /// Unassigns `id`. Returns `true` if it was assigned.
    #[inline]
    pub fn unassign(&mut self, id: Id) -> bool {
        self.set.unassign_with(id, &mut self.payload)
    }

    /// Removes all holes, moving payloads along.
    #[inline]
    pub fn compact(&mut self) {
        self.set.compact_with(&mut self.payload);
    }

    /// Unassigns every id. Payload pages stay allocated.
    #[inline]
    pub fn clear(&mut self) {
        self.set.clear();
    }

    /// Exchanges two live dense slots and their payloads.
    ///
    /// # Panics
    ///
    /// Panics if either slot is a tombstone.
    #[inline]
    pub fn swap_at(&mut self, first: usize, second: usize) {
        self.set.swap_at_with(first, second, &mut self.payload);
    }

    /// Copies the payload of dense slot `source` into `destination`.
    #[inline]
    pub fn copy_at(&mut self, source: usize, destination: usize) {
        self.payload.copy_data_at(source, destination);
    }

    /// Payload of `id`, if assigned.
    #[inline]
    #[must_use]
    pub fn get(&self, id: Id) -> Option<&T> {
        self.payload.data.get(self.set.index_of(id)?)
    }

    /// Mutable payload of `id`, if assigned.
    #[inline]
    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.slot_mut(id)
    }

    /// Live ids in dense order.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = Id> + '_ {
        self.set.ids()
    }

    /// Live `(id, payload)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> + '_ {
        self.set.packed()[..self.set.count()]
            .iter()
            .enumerate()
            .filter(|(_, &id)| !is_tombstone(id))
            .filter_map(|(index, &id)| Some((id, self.payload.data.get(index)?)))
    }

    /// Calls `f` with every live id and its mutable payload, in dense order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(Id, &mut T)) {
        let packed = &self.set.packed()[..self.set.count()];
        for (index, &id) in packed.iter().enumerate() {
            if is_tombstone(id) {
                continue;
            }
            if let Some(value) = self.payload.data.get_mut(index) {
                f(id, value);
            }
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut SparseSet, &mut Payload<T>) {
        (&mut self.set, &mut self.payload)
    }

    pub(crate) fn parts(&self) -> (&SparseSet, &Payload<T>) {
        (&self.set, &self.payload)
    }

    fn slot_mut(&mut self, id: Id) -> Option<&mut T> {
        let index = self.set.index_of(id)?;
        self.payload.data.get_mut(index)
    }
}

impl<T: 'static> fmt::Debug for DataSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSet")
            .field("set", &self.set)
            .field("kind", &self.payload.copier.kind())
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_follows_swap_remove() {
        let mut set: DataSet<u32> = DataSet::new(4, Packing::Continuous);
        for id in 0..6 {
            set.insert(id, id as u32 * 10);
        }

        set.unassign(1);

        assert_eq!(set.get(5), Some(&50));
        assert_eq!(set.sparse_set().index_of(5), Some(1));
        assert_eq!(set.get(1), None);
        assert_eq!(set.count(), 5);
    }

    #[test]
    fn test_reassign_resets_payload() {
        let mut set: DataSet<u32> = DataSet::new(4, Packing::WithHoles);
        set.insert(2, 9);
        set.unassign(2);

        assert!(set.assign(4));
        assert_eq!(set.get(4), Some(&0));
    }

    #[test]
    fn test_insert_overwrites_existing() {
        let mut set: DataSet<u32> = DataSet::new(4, Packing::Continuous);
        assert!(set.insert(1, 3));
        assert!(!set.insert(1, 4));
        assert_eq!(set.get(1), Some(&4));
        assert!(!set.insert(-1, 4));
    }

    #[test]
    fn test_compact_moves_payloads() {
        let mut set: DataSet<u64> = DataSet::new(2, Packing::WithHoles);
        for id in 0..5 {
            set.insert(id, u64::from(id as u32) + 100);
        }
        set.unassign(0);
        set.unassign(2);

        set.compact();

        assert_eq!(set.count(), 3);
        for id in [1, 3, 4] {
            assert_eq!(set.get(id), Some(&(u64::from(id as u32) + 100)));
        }
    }

    #[test]
    fn test_iter_skips_holes() {
        let mut set: DataSet<u8> = DataSet::new(8, Packing::WithHoles);
        set.insert(0, 1);
        set.insert(1, 2);
        set.insert(2, 3);
        set.unassign(1);

        let pairs: Vec<_> = set.iter().map(|(id, &value)| (id, value)).collect();
        assert_eq!(pairs, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn test_for_each_mut() {
        let mut set: DataSet<i32> = DataSet::new(8, Packing::Continuous);
        set.insert(4, 1);
        set.insert(7, 2);

        set.for_each_mut(|id, value| *value += id);

        assert_eq!(set.get(4), Some(&5));
        assert_eq!(set.get(7), Some(&9));
    }

    #[test]
    fn test_managed_copy_at() {
        let mut set: DataSet<String> = DataSet::managed(4, Packing::Continuous);
        set.insert(0, "left".to_owned());
        set.insert(1, "right".to_owned());

        set.copy_at(0, 1);

        assert_eq!(set.get(1).map(String::as_str), Some("left"));
        assert_eq!(set.payload_kind(), PayloadKind::Managed);
    }
}
