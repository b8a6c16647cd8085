//! # Component Kinds
//!
//! Explicit table from Rust types to set ids, filled at setup time.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use crate::ecs::SetId;
use crate::error::{StorageError, StorageResult};

/// Maps component kinds to dense set ids in registration order.
#[derive(Clone, Debug, Default)]
pub struct KindTable {
    ids: HashMap<TypeId, SetId>,
    names: Vec<&'static str>,
}

impl KindTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next set id to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyRegistered`] if `T` already has one.
    pub fn register<T: 'static>(&mut self) -> StorageResult<SetId> {
        let key = TypeId::of::<T>();
        if self.ids.contains_key(&key) {
            return Err(StorageError::AlreadyRegistered(type_name::<T>()));
        }

        let set = self.names.len();
        self.ids.insert(key, set);
        self.names.push(type_name::<T>());
        Ok(set)
    }

    /// Set id of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`] if `T` is not registered.
    pub fn get<T: 'static>(&self) -> StorageResult<SetId> {
        self.ids
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or_else(|| StorageError::UnknownSet(type_name::<T>().to_owned()))
    }

    /// Type name registered for `set`.
    #[must_use]
    pub fn name(&self, set: SetId) -> Option<&'static str> {
        self.names.get(set).copied()
    }

    /// Number of registered kinds.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
