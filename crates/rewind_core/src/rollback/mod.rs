//! # Frame Rollback
//!
//! Bounded per-set history of saved frames, restored in bulk.
//!
//! ## Usage Pattern
//!
//! ```text
//! step N:   mutate ... save_frame()
//! step N+1: mutate ... save_frame()
//! resim:    rollback(1) -> state of step N, replay, save_frame() again
//! ```
//!
//! The newest saved frame is the baseline: `rollback(0)` discards every
//! mutation made since it was saved. Deeper requests than the history holds
//! are clamped.

mod frames;
mod history;
mod rewindable;

pub use frames::{DataFrame, SetFrame};
pub use history::{FrameHistory, Snapshot};
pub use rewindable::{Rewindable, RewindableDataSet, RewindableSet};
