//! # Rewindable Storage
//!
//! A set paired with its own frame history.

use std::ops::{Deref, DerefMut};

use super::history::{FrameHistory, Snapshot};
use crate::ecs::{DataSet, SparseSet};

/// Sparse set with rollback.
pub type RewindableSet = Rewindable<SparseSet>;

/// Data set with rollback.
pub type RewindableDataSet<T> = Rewindable<DataSet<T>>;

/// Storage that can save frames and roll back to them.
///
/// Dereferences to the wrapped storage. No frame is saved on construction:
/// the first [`Rewindable::save_frame`] defines the baseline.
///
/// # Example
///
/// ```rust
/// use rewind_core::{Packing, RewindableSet, SparseSet};
///
/// let mut set = RewindableSet::new(SparseSet::new(Packing::WithHoles), 8);
/// set.assign(0);
/// set.save_frame();
///
/// set.unassign(0);
/// set.rollback(1);
///
/// assert!(set.is_assigned(0));
/// ```
#[derive(Debug)]
pub struct Rewindable<S: Snapshot> {
    inner: S,
    history: FrameHistory<S::Frame>,
}

impl<S: Snapshot> Rewindable<S> {
    /// Wraps `inner` with a history of `frames_capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `frames_capacity` is zero.
    #[must_use]
    pub fn new(inner: S, frames_capacity: usize) -> Self {
        Self {
            inner,
            history: FrameHistory::new(frames_capacity),
        }
    }

    /// Captures the current state as the newest frame.
    pub fn save_frame(&mut self) {
        let frame = self.history.push();
        self.inner.capture(frame);
    }

    /// Restores the state saved `frames` frames before the newest one.
    ///
    /// Requests deeper than [`Self::can_rollback_frames`] are clamped.
    /// Returns the number of frames actually dropped.
    pub fn rollback(&mut self, frames: usize) -> usize {
        let available = self.history.can_rollback_frames();
        if frames > available {
            tracing::warn!(
                "rollback of {} frames clamped to {} recorded frames",
                frames,
                available
            );
        }

        let frames = frames.min(available);
        if let Some(frame) = self.history.rollback(frames) {
            self.inner.restore(frame);
        }
        frames
    }

    /// Deepest rollback available.
    #[inline]
    #[must_use]
    pub fn can_rollback_frames(&self) -> usize {
        self.history.can_rollback_frames()
    }

    /// Number of frames held.
    #[inline]
    #[must_use]
    pub fn saved_frames(&self) -> usize {
        self.history.saved_frames()
    }

    /// Frame ring capacity.
    #[inline]
    #[must_use]
    pub fn frames_capacity(&self) -> usize {
        self.history.capacity()
    }

    /// The wrapped storage.
    #[inline]
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// The wrapped storage, mutably.
    #[inline]
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwraps the storage, dropping its history.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Snapshot> Deref for Rewindable<S> {
    type Target = S;

    #[inline]
    fn deref(&self) -> &S {
        &self.inner
    }
}

impl<S: Snapshot> DerefMut for Rewindable<S> {
    #[inline]
    fn deref_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}
