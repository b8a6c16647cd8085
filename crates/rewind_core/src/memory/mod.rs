//! # Memory Layout
//!
//! Paged payload columns.
//!
//! ## Design Philosophy
//!
//! Payload memory grows in whole pages and is never returned while the
//! owning set lives. Once a session warms up:
//! - No per-assign allocation
//! - Frame capture reuses its page buffers
//! - Unused dense ranges stay unallocated

mod paged;

pub use paged::{PageRun, PageSequence, PagedArray, DEFAULT_PAGE_SIZE};
