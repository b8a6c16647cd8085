//! # Frame History
//!
//! Fixed-capacity ring of reusable frame buffers.
//!
//! ```text
//! capacity 4, 3 saved:
//!
//!   [ f0 ][ f1 ][ f2 ][ -- ]
//!                 ^ current
//! ```
//!
//! Saving overwrites the slot after `current`, evicting the oldest frame
//! once the ring is full. The evicted frame's buffers are reused as-is, so a
//! warmed-up history captures without allocating.

/// State that can be captured into and restored from a frame.
pub trait Snapshot {
    /// Reusable frame buffer.
    type Frame: Default;

    /// Overwrites `frame` with the current state.
    fn capture(&self, frame: &mut Self::Frame);

    /// Replaces the current state with `frame`.
    fn restore(&mut self, frame: &Self::Frame);
}

/// Ring of saved frames.
#[derive(Clone, Debug)]
pub struct FrameHistory<F> {
    frames: Box<[F]>,
    current: usize,
    saved: usize,
}

impl<F: Default> FrameHistory<F> {
    /// Creates an empty history holding at most `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Frames capacity must be greater than zero");

        let frames: Vec<F> = std::iter::repeat_with(F::default).take(capacity).collect();
        Self {
            frames: frames.into_boxed_slice(),
            current: capacity - 1,
            saved: 0,
        }
    }

    /// Maximum number of frames kept.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Number of frames currently held.
    #[inline]
    #[must_use]
    pub const fn saved_frames(&self) -> usize {
        self.saved
    }

    /// Deepest rollback available. The newest frame is the baseline and does
    /// not count.
    #[inline]
    #[must_use]
    pub const fn can_rollback_frames(&self) -> usize {
        self.saved.saturating_sub(1)
    }

    /// Advances the ring and returns the frame to capture into.
    #[inline]
    pub fn push(&mut self) -> &mut F {
        self.current = (self.current + 1) % self.frames.len();
        self.saved = (self.saved + 1).min(self.frames.len());
        &mut self.frames[self.current]
    }

    /// Drops `frames` frames, clamped to [`Self::can_rollback_frames`], and
    /// returns the frame that becomes current. `None` if nothing was saved.
    pub fn rollback(&mut self, frames: usize) -> Option<&F> {
        if self.saved == 0 {
            return None;
        }

        let frames = frames.min(self.can_rollback_frames());
        let capacity = self.frames.len();
        self.current = (self.current + capacity - frames) % capacity;
        self.saved -= frames;
        Some(&self.frames[self.current])
    }

    /// Newest saved frame.
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&F> {
        (self.saved > 0).then(|| &self.frames[self.current])
    }

    /// Forgets every saved frame. Buffers are kept.
    pub fn reset(&mut self) {
        self.current = self.frames.len() - 1;
        self.saved = 0;
    }
}
