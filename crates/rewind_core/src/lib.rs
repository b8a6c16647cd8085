//! # Rewind Core
//!
//! Sparse-set component storage with bulk rollback and owning groups, built
//! for deterministic resimulation:
//! - O(1) assign, unassign and membership per set
//! - Rewind every set and group by N saved frames in one call
//! - Multi-component queries over co-sorted dense arrays
//!
//! ## Architecture Rules
//!
//! 1. **Single-threaded** - Structural events run synchronously inside the
//!    mutating call
//! 2. **Paged payloads** - Component data lives in fixed-size pages allocated
//!    on first write
//! 3. **Reusable frames** - A warmed-up history saves without allocating
//!
//! ## Example
//!
//! ```rust
//! use rewind_core::{Packing, RewindableSet, SparseSet};
//!
//! let mut set = RewindableSet::new(SparseSet::new(Packing::WithHoles), 8);
//! set.assign(0);
//! set.save_frame();
//!
//! set.unassign(0);
//! set.rollback(0);
//!
//! assert!(set.is_assigned(0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod registry;
pub mod rollback;

pub use config::RegistryConfig;
pub use ecs::{
    Blittable, DataSet, DeepCopy, DenseData, Filter, Id, NonOwningGroup, OwningGroup, Packing,
    PayloadCopy, PayloadKind, ReducedFilter, SetId, SetSource, SetState, SparseSet,
};
pub use error::{StorageError, StorageResult};
pub use memory::{PageRun, PageSequence, PagedArray};
pub use registry::{GroupId, ObserverId, Registry, SetEvent, SetObserver};
pub use rollback::{FrameHistory, Rewindable, RewindableDataSet, RewindableSet, Snapshot};
