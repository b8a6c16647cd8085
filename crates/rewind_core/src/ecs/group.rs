//! # Groups
//!
//! Maintained query results over several sets.
//!
//! ```text
//! owned A: [ 5  9  2 | 7  4 ]      length = 3
//! owned B: [ 5  9  2 | 1 ]         same ids, same positions
//!            ^^^^^^^
//!            include ∧ ¬exclude
//! ```
//!
//! An owning group reorders the dense arrays of its owned sets so that
//! matching ids form an aligned prefix. A non-owning group keeps its members
//! in a private sparse set instead.
//!
//! Both sync lazily: the first [`OwningGroup::ensure_synced`] after a
//! desync scans the smallest candidate set once. While synced, structural
//! events keep the result up to date one id at a time:
//!
//! | event                        | included / owned set | excluded set |
//! |------------------------------|----------------------|--------------|
//! | assigned                     | add if matching      | remove       |
//! | before unassigned            | remove               | add if matching |

use super::entity::{is_tombstone, Id, SetId};
use super::filter::{Filter, SetSource};
use super::sparse_set::{Packing, SparseSet};
use crate::error::{StorageError, StorageResult};
use crate::rollback::{SetFrame, Snapshot};

/// Set storage a group can read and reorder.
pub trait GroupSets: SetSource {
    /// Exchanges two dense slots of `set`, payloads included.
    fn swap_dense(&mut self, set: SetId, first: usize, second: usize);
}

impl GroupSets for [SparseSet] {
    #[inline]
    fn swap_dense(&mut self, set: SetId, first: usize, second: usize) {
        self[set].swap_at(first, second);
    }
}

fn sorted(ids: &[SetId]) -> Box<[SetId]> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids.into_boxed_slice()
}

/// Saved state of an [`OwningGroup`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GroupFrame {
    /// Whether the group was synced.
    pub synced: bool,
    /// Prefix length at capture time.
    pub length: usize,
}

/// A group that owns the dense order of its owned sets.
///
/// # Example
///
/// ```rust
/// use rewind_core::{OwningGroup, Packing, SparseSet};
///
/// let mut sets = vec![SparseSet::new(Packing::Continuous), SparseSet::new(Packing::Continuous)];
/// let mut group = OwningGroup::new(&[0, 1], &[], &[], sets.as_slice()).unwrap();
/// group.ensure_synced(sets.as_mut_slice());
///
/// sets[0].assign(5);
/// group.on_assigned(0, 5, sets.as_mut_slice());
/// sets[1].assign(5);
/// group.on_assigned(1, 5, sets.as_mut_slice());
///
/// assert_eq!(group.len(), 1);
/// assert_eq!(group.ids(sets.as_slice()), &[5]);
/// ```
#[derive(Clone, Debug)]
pub struct OwningGroup {
    owned: Box<[SetId]>,
    included: Box<[SetId]>,
    excluded: Box<[SetId]>,
    primary: SetId,
    filter: Filter,
    length: usize,
    synced: bool,
}

impl OwningGroup {
    /// Creates an unsynced group.
    ///
    /// The first owned set becomes the primary one: its dense positions
    /// decide membership. Included sets that are also owned are dropped from
    /// the included list.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::EmptyOwnedGroup`] if `owned` is empty and
    /// [`StorageError::HoleyOwnedSet`] if an owned set keeps holes.
    pub fn new<S: SetSource + ?Sized>(
        owned: &[SetId],
        included: &[SetId],
        excluded: &[SetId],
        sets: &S,
    ) -> StorageResult<Self> {
        let Some(&primary) = owned.first() else {
            return Err(StorageError::EmptyOwnedGroup);
        };
        if let Some(&holey) = owned.iter().find(|&&set| sets.set(set).packing() == Packing::WithHoles) {
            return Err(StorageError::HoleyOwnedSet(holey));
        }

        let owned = sorted(owned);
        let included: Vec<SetId> = included
            .iter()
            .copied()
            .filter(|set| owned.binary_search(set).is_err())
            .collect();
        let included = sorted(&included);
        let excluded = sorted(excluded);

        let required: Vec<SetId> = owned.iter().chain(included.iter()).copied().collect();
        let filter = Filter::new(&required, &excluded);

        Ok(Self {
            owned,
            included,
            excluded,
            primary,
            filter,
            length: 0,
            synced: false,
        })
    }

    /// Owned sets, sorted.
    #[inline]
    #[must_use]
    pub fn owned(&self) -> &[SetId] {
        &self.owned
    }

    /// Included sets that are not owned, sorted.
    #[inline]
    #[must_use]
    pub fn included(&self) -> &[SetId] {
        &self.included
    }

    /// Excluded sets, sorted.
    #[inline]
    #[must_use]
    pub fn excluded(&self) -> &[SetId] {
        &self.excluded
    }

    /// The owned set whose dense positions decide membership.
    #[inline]
    #[must_use]
    pub const fn primary(&self) -> SetId {
        self.primary
    }

    /// Full membership predicate (owned and included sets required).
    #[inline]
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Number of matching ids. Meaningful only while synced.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if no id matches.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether the prefix reflects the live sets.
    #[inline]
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.synced
    }

    /// Checks whether `set` takes part in this group.
    #[must_use]
    pub fn participates(&self, set: SetId) -> bool {
        self.owned.binary_search(&set).is_ok()
            || self.included.binary_search(&set).is_ok()
            || self.excluded.binary_search(&set).is_ok()
    }

    /// Matching ids, in the dense order shared by all owned sets.
    ///
    /// Empty while the group is not synced.
    pub fn ids<'a, S: SetSource + ?Sized>(&self, sets: &'a S) -> &'a [Id] {
        if !self.synced {
            return &[];
        }
        &sets.set(self.primary).packed()[..self.length]
    }

    /// Checks whether `id` is in the group.
    pub fn contains<S: SetSource + ?Sized>(&self, id: Id, sets: &S) -> bool {
        self.synced && sets.set(self.primary).index_of(id).is_some_and(|dense| dense < self.length)
    }

    /// Syncs the group if needed. Returns `true` if a full resort ran.
    pub fn ensure_synced<S: GroupSets + ?Sized>(&mut self, sets: &mut S) -> bool {
        if self.synced {
            return false;
        }

        self.sort_owned(sets);
        self.synced = true;

        tracing::trace!("owning group over {:?} synced, length {}", self.owned, self.length);
        true
    }

    /// Marks the group stale. The next [`Self::ensure_synced`] resorts.
    #[inline]
    pub fn desync(&mut self) {
        self.synced = false;
    }

    /// Handles an id that was just assigned into `set`.
    pub fn on_assigned<S: GroupSets + ?Sized>(&mut self, set: SetId, id: Id, sets: &mut S) {
        if !self.synced {
            return;
        }

        if self.excluded.binary_search(&set).is_ok() {
            self.remove_entry(id, sets);
        } else if self.filter.contains_id(id, &*sets) {
            self.add_entry(id, sets);
        }
    }

    /// Handles an id that is about to be unassigned from `set`.
    pub fn on_before_unassigned<S: GroupSets + ?Sized>(&mut self, set: SetId, id: Id, sets: &mut S) {
        if !self.synced {
            return;
        }

        if self.excluded.binary_search(&set).is_ok() {
            if self.filter.contains_id_ignoring(id, &*sets, set) {
                self.add_entry(id, sets);
            }
        } else {
            self.remove_entry(id, sets);
        }
    }

    fn sort_owned<S: GroupSets + ?Sized>(&mut self, sets: &mut S) {
        self.length = 0;

        let candidates = self.owned.iter().chain(self.included.iter()).copied();
        let Some(minimal) = candidates.min_by_key(|&set| sets.set(set).count()) else {
            return;
        };

        // Matches are only ever swapped towards earlier positions, so the
        // slot at `index` is still unvisited after a swap.
        let mut index = 0;
        while index < sets.set(minimal).count() {
            let id = sets.set(minimal).packed()[index];
            index += 1;
            if !is_tombstone(id) && self.filter.contains_id(id, &*sets) {
                self.add_entry(id, sets);
            }
        }
    }

    fn add_entry<S: GroupSets + ?Sized>(&mut self, id: Id, sets: &mut S) {
        if self.contains(id, &*sets) {
            return;
        }
        self.swap_entry(id, self.length, sets);
        self.length += 1;
    }

    fn remove_entry<S: GroupSets + ?Sized>(&mut self, id: Id, sets: &mut S) {
        let Some(dense) = sets.set(self.primary).index_of(id) else {
            return;
        };
        if dense < self.length {
            self.length -= 1;
            self.swap_entry(id, self.length, sets);
        }
    }

    fn swap_entry<S: GroupSets + ?Sized>(&self, id: Id, target: usize, sets: &mut S) {
        for &set in self.owned.iter() {
            if let Some(dense) = sets.set(set).index_of(id) {
                sets.swap_dense(set, dense, target);
            }
        }
    }
}

impl Snapshot for OwningGroup {
    type Frame = GroupFrame;

    fn capture(&self, frame: &mut GroupFrame) {
        *frame = GroupFrame {
            synced: self.synced,
            length: self.length,
        };
    }

    fn restore(&mut self, frame: &GroupFrame) {
        self.synced = frame.synced;
        self.length = frame.length;
    }
}

/// Saved state of a [`NonOwningGroup`].
#[derive(Clone, Debug, Default)]
pub struct MembersFrame {
    synced: bool,
    members: SetFrame,
}

/// A group that tracks its members without touching the filtered sets.
#[derive(Clone, Debug)]
pub struct NonOwningGroup {
    filter: Filter,
    members: SparseSet,
    synced: bool,
}

impl NonOwningGroup {
    /// Creates an unsynced group.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnboundedGroup`] if nothing is included, since
    /// the members could not be enumerated.
    pub fn new(included: &[SetId], excluded: &[SetId]) -> StorageResult<Self> {
        if included.is_empty() {
            return Err(StorageError::UnboundedGroup);
        }

        Ok(Self {
            filter: Filter::new(included, excluded),
            members: SparseSet::new(Packing::Continuous),
            synced: false,
        })
    }

    /// Membership predicate.
    #[inline]
    #[must_use]
    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Member set.
    #[inline]
    #[must_use]
    pub const fn members(&self) -> &SparseSet {
        &self.members
    }

    /// Number of members.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.members.count()
    }

    /// Returns `true` if there are no members.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the members reflect the live sets.
    #[inline]
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.synced
    }

    /// Checks whether `set` takes part in this group.
    #[must_use]
    pub fn participates(&self, set: SetId) -> bool {
        self.filter.included().binary_search(&set).is_ok() || self.filter.excluded().binary_search(&set).is_ok()
    }

    /// Member ids in insertion order. Empty while not synced.
    #[must_use]
    pub fn ids(&self) -> &[Id] {
        if !self.synced {
            return &[];
        }
        &self.members.packed()[..self.members.count()]
    }

    /// O(1) membership test.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        self.synced && self.members.is_assigned(id)
    }

    /// Syncs the group if needed. Returns `true` if a full rescan ran.
    pub fn ensure_synced<S: SetSource + ?Sized>(&mut self, sets: &S) -> bool {
        if self.synced {
            return false;
        }

        self.members.clear();
        let minimal = self
            .filter
            .included()
            .iter()
            .copied()
            .min_by_key(|&set| sets.set(set).count());
        if let Some(minimal) = minimal {
            for id in sets.set(minimal).ids() {
                if self.filter.contains_id(id, sets) {
                    self.members.assign(id);
                }
            }
        }
        self.synced = true;

        tracing::trace!("non-owning group synced, {} members", self.members.count());
        true
    }

    /// Marks the group stale.
    #[inline]
    pub fn desync(&mut self) {
        self.synced = false;
    }

    /// Handles an id that was just assigned into `set`.
    pub fn on_assigned<S: SetSource + ?Sized>(&mut self, set: SetId, id: Id, sets: &S) {
        if !self.synced {
            return;
        }

        if self.filter.excluded().binary_search(&set).is_ok() {
            self.members.unassign(id);
        } else if self.filter.contains_id(id, sets) {
            self.members.assign(id);
        }
    }

    /// Handles an id that is about to be unassigned from `set`.
    pub fn on_before_unassigned<S: SetSource + ?Sized>(&mut self, set: SetId, id: Id, sets: &S) {
        if !self.synced {
            return;
        }

        if self.filter.excluded().binary_search(&set).is_ok() {
            if self.filter.contains_id_ignoring(id, sets, set) {
                self.members.assign(id);
            }
        } else {
            self.members.unassign(id);
        }
    }
}

impl Snapshot for NonOwningGroup {
    type Frame = MembersFrame;

    fn capture(&self, frame: &mut MembersFrame) {
        frame.synced = self.synced;
        frame.members.capture_from(&self.members);
    }

    fn restore(&mut self, frame: &MembersFrame) {
        self.synced = frame.synced;
        frame.members.restore_into(&mut self.members);
    }
}
