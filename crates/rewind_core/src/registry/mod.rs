//! # Registry
//!
//! Explicit composition root for sets, groups and observers.
//!
//! ## Design Philosophy
//!
//! - Component kinds get dense set ids at setup time, never lazily
//! - Sets are stored type-erased; typed access downcasts once per call
//! - The registry owns the event channel, so sets never hold callbacks
//! - Groups and sets live in separate fields and can borrow each other
//!   during dispatch

mod events;
mod groups;
mod kinds;
mod storage;
mod store;

pub use events::{ObserverId, ObserverList, SetEvent, SetObserver};
pub use groups::{GroupId, GroupRegistry};
pub use kinds::KindTable;
pub use storage::{ComponentSet, SetTable};
pub use store::Registry;
