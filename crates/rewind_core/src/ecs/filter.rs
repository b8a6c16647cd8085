//! # Filters
//!
//! Include/exclude membership predicates over registered sets.
//!
//! The test is branch-light: dense indices are folded with bitwise
//! operations and only the final sign is inspected.
//!
//! ```text
//! included: OR  of indices   -> negative if any id is missing
//! excluded: AND of indices   -> non-negative if any id is present
//! match   = (included | !excluded) >= 0
//! ```

use super::entity::{Id, SetId, INVALID_INDEX};
use super::sparse_set::SparseSet;

/// Lookup of sets by [`SetId`].
pub trait SetSource {
    /// The set registered as `id`.
    ///
    /// # Panics
    ///
    /// May panic if `id` is not registered.
    fn set(&self, id: SetId) -> &SparseSet;
}

impl SetSource for [SparseSet] {
    #[inline]
    fn set(&self, id: SetId) -> &SparseSet {
        &self[id]
    }
}

impl SetSource for Vec<SparseSet> {
    #[inline]
    fn set(&self, id: SetId) -> &SparseSet {
        &self[id]
    }
}

impl SetSource for [&SparseSet] {
    #[inline]
    fn set(&self, id: SetId) -> &SparseSet {
        self[id]
    }
}

#[inline]
fn fold_included<S: SetSource + ?Sized>(included: &[SetId], id: Id, sets: &S) -> i32 {
    included
        .iter()
        .fold(0, |acc, &set| acc | sets.set(set).index_or_invalid(id))
}

#[inline]
fn fold_excluded<S: SetSource + ?Sized>(excluded: &[SetId], id: Id, sets: &S) -> i32 {
    excluded
        .iter()
        .fold(INVALID_INDEX, |acc, &set| acc & sets.set(set).index_or_invalid(id))
}

fn normalized(ids: &[SetId]) -> Box<[SetId]> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids.into_boxed_slice()
}

/// Include/exclude predicate.
///
/// # Example
///
/// ```rust
/// use rewind_core::{Filter, Packing, SparseSet};
///
/// let mut sets = vec![SparseSet::new(Packing::Continuous), SparseSet::new(Packing::Continuous)];
/// sets[0].assign(1);
/// sets[0].assign(2);
/// sets[1].assign(2);
///
/// let filter = Filter::new(&[0], &[1]);
/// assert!(filter.contains_id(1, sets.as_slice()));
/// assert!(!filter.contains_id(2, sets.as_slice()));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    included: Box<[SetId]>,
    excluded: Box<[SetId]>,
}

impl Filter {
    /// Creates a filter. Set lists are sorted and deduplicated.
    #[must_use]
    pub fn new(included: &[SetId], excluded: &[SetId]) -> Self {
        Self {
            included: normalized(included),
            excluded: normalized(excluded),
        }
    }

    /// Sets an id must be assigned in.
    #[inline]
    #[must_use]
    pub fn included(&self) -> &[SetId] {
        &self.included
    }

    /// Sets an id must not be assigned in.
    #[inline]
    #[must_use]
    pub fn excluded(&self) -> &[SetId] {
        &self.excluded
    }

    /// Returns `true` if the filter accepts every id.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.included.is_empty() && self.excluded.is_empty()
    }

    /// Checks whether `id` is assigned in every included set and in no
    /// excluded set.
    #[inline]
    pub fn contains_id<S: SetSource + ?Sized>(&self, id: Id, sets: &S) -> bool {
        let included = fold_included(&self.included, id, sets);
        let excluded = fold_excluded(&self.excluded, id, sets);
        (included | !excluded) >= 0
    }

    /// Like [`Filter::contains_id`], but treats `ignored` as if `id` were not
    /// assigned there. Used while `id` is about to leave `ignored`.
    pub fn contains_id_ignoring<S: SetSource + ?Sized>(&self, id: Id, sets: &S, ignored: SetId) -> bool {
        let included = fold_included(&self.included, id, sets);
        let excluded = self
            .excluded
            .iter()
            .filter(|&&set| set != ignored)
            .fold(INVALID_INDEX, |acc, &set| acc & sets.set(set).index_or_invalid(id));
        (included | !excluded) >= 0
    }

    /// Drops `reduced` from the included sets, for iteration over it.
    #[must_use]
    pub fn reduced(&self, reduced: SetId) -> ReducedFilter {
        ReducedFilter {
            reduced,
            included: self.included.iter().copied().filter(|&set| set != reduced).collect(),
            excluded: self.excluded.clone(),
        }
    }
}

/// A [`Filter`] specialised for iteration over one of its included sets.
///
/// Ids produced by iterating the reduced set are assigned there by
/// construction, so that set is not checked again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReducedFilter {
    reduced: SetId,
    included: Box<[SetId]>,
    excluded: Box<[SetId]>,
}

impl ReducedFilter {
    /// The set being iterated.
    #[inline]
    #[must_use]
    pub const fn reduced_set(&self) -> SetId {
        self.reduced
    }

    /// Included sets other than the reduced one.
    #[inline]
    #[must_use]
    pub fn included(&self) -> &[SetId] {
        &self.included
    }

    /// Excluded sets.
    #[inline]
    #[must_use]
    pub fn excluded(&self) -> &[SetId] {
        &self.excluded
    }

    /// Checks the remaining conditions for an id taken from the reduced set.
    #[inline]
    pub fn contains_id<S: SetSource + ?Sized>(&self, id: Id, sets: &S) -> bool {
        let included = fold_included(&self.included, id, sets);
        let excluded = fold_excluded(&self.excluded, id, sets);
        (included | !excluded) >= 0
    }
}
