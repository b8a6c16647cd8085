//! # Storage Error Types
//!
//! Configuration mistakes detected while building sets and groups.
//!
//! Id churn is not an error: assigning a negative id or unassigning an id
//! that was never assigned are defined no-ops. Rolling back deeper than the
//! recorded history clamps instead of failing.

use thiserror::Error;

/// Errors that can occur while configuring storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Two owning groups claim the same set but their filters are not nested.
    #[error("conflicting owning group: {definition}")]
    ConflictingGroup {
        /// Human readable form of the rejected group definition.
        definition: String,
    },

    /// A set packed with holes can not be reordered by a group.
    #[error("set {0} is packed with holes and can not be owned by a group")]
    HoleyOwnedSet(usize),

    /// Owned sets of one definition already belong to two unrelated chains.
    #[error("owned sets {first} and {second} belong to different group chains")]
    OwnedSetsInDifferentChains {
        /// Owned set whose chain was found first.
        first: usize,
        /// Owned set that belongs to another chain.
        second: usize,
    },

    /// An owning group needs at least one owned set.
    #[error("owning group definition has no owned sets")]
    EmptyOwnedGroup,

    /// A non-owning group without included sets would match every id.
    #[error("non-owning group definition has no included sets")]
    UnboundedGroup,

    /// Set id or component kind is not registered.
    #[error("unknown set: {0}")]
    UnknownSet(String),

    /// Component kind was registered twice.
    #[error("component kind already registered: {0}")]
    AlreadyRegistered(&'static str),

    /// Typed access used a payload type different from the registered one.
    #[error("set {set} does not store payloads of type {expected}")]
    KindMismatch {
        /// The set that was accessed.
        set: usize,
        /// The requested payload type name.
        expected: &'static str,
    },

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for storage configuration.
pub type StorageResult<T> = Result<T, StorageError>;
