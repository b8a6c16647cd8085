//! # Entity Storage
//!
//! Sparse sets, payload columns and the query structures built on them.
//!
//! ## Design Philosophy
//!
//! - Ids are caller-owned integers; sets only map them to dense slots
//! - Payloads live in paged columns that move in lockstep with their set
//! - Groups keep joined results in the physical order of the owned sets
//! - No dynamic dispatch inside a set; the registry adds it at its seams

mod component;
mod data_set;
mod entity;
mod filter;
mod group;
mod sparse_set;

pub use component::{Blittable, DeepCopy, PayloadCopy, PayloadKind};
pub use data_set::DataSet;
pub use entity::{hole_link, is_tombstone, tombstone, Id, SetId, END_HOLE, INVALID_INDEX};
pub use filter::{Filter, ReducedFilter, SetSource};
pub use group::{GroupFrame, GroupSets, MembersFrame, NonOwningGroup, OwningGroup};
pub use sparse_set::{minimal_set, DenseData, Packing, SetState, SparseSet};
