//! # Entity Ids
//!
//! Entities are plain non-negative `i32` values handed out by the caller.
//! The storage layer never allocates ids; it only maps them to dense slots.
//!
//! Dense slots of a set packed with holes reuse the sign bit: a live slot
//! holds the id, a removed slot holds the bitwise complement of the next
//! free slot, which is always negative.

/// Identifier of an entity. Negative values are never assigned.
pub type Id = i32;

/// Index of a set inside a registry.
pub type SetId = usize;

/// Marks an id with no dense slot in the `sparse` lookup array.
pub const INVALID_INDEX: i32 = -1;

/// Free list terminator for sets packed with holes.
pub const END_HOLE: i32 = i32::MAX;

/// Encodes a free list link into a removed dense slot.
#[inline]
#[must_use]
pub const fn tombstone(next_hole: i32) -> i32 {
    !next_hole
}

/// Checks whether a dense slot holds a free list link instead of an id.
#[inline]
#[must_use]
pub const fn is_tombstone(slot: i32) -> bool {
    slot < 0
}

/// Decodes the free list link stored in a removed dense slot.
#[inline]
#[must_use]
pub const fn hole_link(slot: i32) -> i32 {
    !slot
}

/// Smallest power of two that can hold `index`.
#[inline]
pub(crate) fn capacity_for(index: usize) -> usize {
    (index + 1).next_power_of_two()
}
