//! # Registry
//!
//! Composition root: owns every set, group, observer and the frame counter.
//!
//! All structural mutation goes through the registry so that groups and
//! observers are notified in one fixed order (see [`super::events`]).

use crate::config::RegistryConfig;
use crate::ecs::{DataSet, Id, NonOwningGroup, OwningGroup, SetId, SetSource, SparseSet};
use crate::error::{StorageError, StorageResult};
use crate::rollback::{FrameHistory, Rewindable, RewindableDataSet, RewindableSet};

use super::events::{ObserverId, ObserverList, SetEvent, SetObserver};
use super::groups::{GroupId, GroupRegistry};
use super::kinds::KindTable;
use super::storage::{ComponentSet, SetTable};

/// Sets, groups and observers of one simulation.
///
/// # Example
///
/// ```rust
/// use rewind_core::Registry;
///
/// #[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
/// #[repr(C)]
/// struct Health(u32);
///
/// let mut registry = Registry::default();
/// let health = registry.register_data::<Health>(false).unwrap();
///
/// registry.insert(3, Health(10)).unwrap();
/// registry.save_frame();
///
/// registry.unassign(health, 3).unwrap();
/// registry.rollback(0);
///
/// assert_eq!(registry.get::<Health>(3).map(|health| health.0), Some(10));
/// ```
pub struct Registry {
    config: RegistryConfig,
    kinds: KindTable,
    sets: SetTable,
    groups: GroupRegistry,
    observers: ObserverList,
    frames: FrameHistory<()>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_valid_config(RegistryConfig::default())
    }
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`]
    /// if `config` does not validate.
    pub fn new(config: RegistryConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: RegistryConfig) -> Self {
        Self {
            kinds: KindTable::new(),
            sets: SetTable::new(),
            groups: GroupRegistry::new(config.frames_capacity),
            observers: ObserverList::default(),
            frames: FrameHistory::new(config.frames_capacity),
            config,
        }
    }

    /// Configuration the registry was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a plain-data kind. `stable` kinds keep their dense positions
    /// across removals.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyRegistered`]
    /// if `T` was registered before.
    pub fn register_data<T: bytemuck::Pod + Default>(&mut self, stable: bool) -> StorageResult<SetId> {
        let set = DataSet::<T>::new(self.config.page_size, self.config.packing_for(stable));
        self.register_data_set::<T>(set)
    }

    /// Registers a kind whose values own heap data and are deep-copied into
    /// frames.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyRegistered`]
    /// if `T` was registered before.
    pub fn register_managed<T: Clone + Default + 'static>(&mut self, stable: bool) -> StorageResult<SetId> {
        let set = DataSet::<T>::managed(self.config.page_size, self.config.packing_for(stable));
        self.register_data_set::<T>(set)
    }

    /// Registers a payload-free kind.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyRegistered`]
    /// if `T` was registered before.
    pub fn register_tag<T: 'static>(&mut self, stable: bool) -> StorageResult<SetId> {
        let packing = self.config.packing_for(stable);
        let set_id = self.kinds.register::<T>()?;

        let storage: Box<dyn ComponentSet> = if self.config.store_empty_types_as_data_sets {
            let mut set = DataSet::<()>::new(self.config.page_size, packing);
            set.sparse_set_mut().reserve(self.config.set_capacity);
            Box::new(RewindableDataSet::new(set, self.config.frames_capacity))
        } else {
            let mut set = SparseSet::new(packing);
            set.reserve(self.config.set_capacity);
            Box::new(RewindableSet::new(set, self.config.frames_capacity))
        };
        self.push_set::<T>(set_id, storage);
        Ok(set_id)
    }

    fn register_data_set<T: Default + 'static>(&mut self, mut set: DataSet<T>) -> StorageResult<SetId> {
        let set_id = self.kinds.register::<T>()?;
        set.sparse_set_mut().reserve(self.config.set_capacity);

        let storage = Box::new(RewindableDataSet::new(set, self.config.frames_capacity));
        self.push_set::<T>(set_id, storage);
        Ok(set_id)
    }

    fn push_set<T: 'static>(&mut self, set_id: SetId, mut storage: Box<dyn ComponentSet>) {
        storage.save_frame();
        let pushed = self.sets.push(storage);
        debug_assert_eq!(pushed, set_id);

        tracing::debug!(
            "registered set {} for {} ({:?})",
            set_id,
            std::any::type_name::<T>(),
            self.sets.set(set_id).packing()
        );
    }

    /// Set id of a registered kind.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// if `T` is not registered.
    #[inline]
    pub fn set_id<T: 'static>(&self) -> StorageResult<SetId> {
        self.kinds.get::<T>()
    }

    /// Type name registered for `set`.
    #[must_use]
    pub fn kind_name(&self, set: SetId) -> Option<&'static str> {
        self.kinds.name(set)
    }

    /// Number of registered sets.
    #[inline]
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    // =========================================================================
    // Set access
    // =========================================================================

    /// Id bookkeeping of a set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// if `set` is not registered.
    pub fn set(&self, set: SetId) -> StorageResult<&SparseSet> {
        self.sets
            .get(set)
            .map(ComponentSet::sparse_set)
            .ok_or_else(|| StorageError::UnknownSet(format!("set {set}")))
    }

    /// Checks whether `id` is assigned in `set`. Unknown sets hold nothing.
    #[must_use]
    pub fn is_assigned(&self, set: SetId, id: Id) -> bool {
        self.sets
            .get(set)
            .is_some_and(|storage| storage.sparse_set().is_assigned(id))
    }

    /// Typed data set of a registered kind.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// or [`StorageError::KindMismatch`].
    pub fn data<T: Default + 'static>(&self) -> StorageResult<&DataSet<T>> {
        let set = self.kinds.get::<T>()?;
        self.sets.data::<T>(set).map(Rewindable::inner)
    }

    /// Payload of `id`, if `T` is registered and `id` holds one.
    #[must_use]
    pub fn get<T: Default + 'static>(&self, id: Id) -> Option<&T> {
        self.data::<T>().ok()?.get(id)
    }

    /// Mutable payload of `id`. Payload writes are not structural and
    /// notify nobody.
    pub fn get_mut<T: Default + 'static>(&mut self, id: Id) -> Option<&mut T> {
        let set = self.kinds.get::<T>().ok()?;
        self.sets.data_mut::<T>(set).ok()?.get_mut(id)
    }

    /// Assigns `id` into the set of `T` and stores `value`. Returns `true`
    /// if `id` was newly assigned.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// or [`StorageError::KindMismatch`].
    pub fn insert<T: Default + 'static>(&mut self, id: Id, value: T) -> StorageResult<bool> {
        let set = self.kinds.get::<T>()?;
        let assigned = self.sets.data_mut::<T>(set)?.insert(id, value);
        if assigned {
            self.notify_assigned(set, id);
        }
        Ok(assigned)
    }

    // =========================================================================
    // Structural mutation
    // =========================================================================

    /// Assigns `id` into `set`, then notifies groups and observers. Returns
    /// `true` if `id` was newly assigned; negative ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// if `set` is not registered.
    pub fn assign(&mut self, set: SetId, id: Id) -> StorageResult<bool> {
        self.check_set(set)?;
        let assigned = self.sets.storage_mut(set).assign(id);
        if assigned {
            self.notify_assigned(set, id);
        }
        Ok(assigned)
    }

    /// Notifies groups and observers that `id` is leaving `set`, then
    /// unassigns it. Returns `true` if `id` was assigned.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// if `set` is not registered.
    pub fn unassign(&mut self, set: SetId, id: Id) -> StorageResult<bool> {
        self.check_set(set)?;
        Ok(self.unassign_registered(set, id))
    }

    /// Removes the holes of `set`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// if `set` is not registered.
    pub fn compact(&mut self, set: SetId) -> StorageResult<()> {
        self.check_set(set)?;
        self.sets.storage_mut(set).compact();
        Ok(())
    }

    /// Unassigns every id of `set` in reverse dense order, notifying for
    /// each, then resets its hole state.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// if `set` is not registered.
    pub fn clear_set(&mut self, set: SetId) -> StorageResult<()> {
        self.check_set(set)?;
        self.clear_registered(set);
        Ok(())
    }

    /// Clears every set.
    pub fn clear(&mut self) {
        for set in 0..self.sets.len() {
            self.clear_registered(set);
        }
    }

    fn unassign_registered(&mut self, set: SetId, id: Id) -> bool {
        if !self.sets.set(set).is_assigned(id) {
            return false;
        }

        self.groups.on_before_unassigned(set, id, &mut self.sets);
        self.observers
            .dispatch(SetEvent::BeforeUnassigned { set, id }, &self.sets);

        self.sets.storage_mut(set).unassign(id)
    }

    fn clear_registered(&mut self, set: SetId) {
        let ids: Vec<Id> = self.sets.set(set).ids().rev().collect();
        for id in ids {
            self.unassign_registered(set, id);
        }
        self.sets.storage_mut(set).clear_without_notify();
    }

    fn check_set(&self, set: SetId) -> StorageResult<()> {
        if set < self.sets.len() {
            Ok(())
        } else {
            Err(StorageError::UnknownSet(format!("set {set}")))
        }
    }

    fn notify_assigned(&mut self, set: SetId, id: Id) {
        self.groups.on_assigned(set, id, &mut self.sets);
        self.observers.dispatch(SetEvent::Assigned { set, id }, &self.sets);
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Returns the synced group for a definition, creating it if needed. An
    /// empty `owned` list makes a non-owning group.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownSet`]
    /// for unregistered sets and the placement errors of
    /// [`GroupRegistry::get_or_create`].
    pub fn group(&mut self, owned: &[SetId], included: &[SetId], excluded: &[SetId]) -> StorageResult<GroupId> {
        for &set in owned.iter().chain(included).chain(excluded) {
            self.check_set(set)?;
        }
        self.groups.get_or_create(owned, included, excluded, &mut self.sets)
    }

    /// Syncs a group if it is stale.
    pub fn ensure_synced(&mut self, group: GroupId) {
        self.groups.ensure_synced(group, &mut self.sets);
    }

    /// Members of a group. Owning groups return the aligned prefix of their
    /// owned sets.
    pub fn group_ids(&mut self, group: GroupId) -> &[Id] {
        self.groups.ensure_synced(group, &mut self.sets);
        match group {
            GroupId::Owning(index) => self
                .groups
                .owning(index)
                .map(|group| group.ids(&self.sets))
                .unwrap_or_default(),
            GroupId::NonOwning(index) => self
                .groups
                .non_owning(index)
                .map(NonOwningGroup::ids)
                .unwrap_or_default(),
        }
    }

    /// Number of members of a group.
    pub fn group_len(&mut self, group: GroupId) -> usize {
        self.groups.ensure_synced(group, &mut self.sets);
        match group {
            GroupId::Owning(index) => self.groups.owning(index).map_or(0, OwningGroup::len),
            GroupId::NonOwning(index) => self.groups.non_owning(index).map_or(0, NonOwningGroup::len),
        }
    }

    /// Checks whether `id` is a member of a group.
    pub fn group_contains(&mut self, group: GroupId, id: Id) -> bool {
        self.groups.ensure_synced(group, &mut self.sets);
        match group {
            GroupId::Owning(index) => self
                .groups
                .owning(index)
                .is_some_and(|group| group.contains(id, &self.sets)),
            GroupId::NonOwning(index) => self
                .groups
                .non_owning(index)
                .is_some_and(|group| group.contains(id)),
        }
    }

    /// Marks every group stale, e.g. after writing raw set state.
    pub fn desync_groups(&mut self) {
        self.groups.desync_all();
    }

    /// Group bookkeeping, for inspection.
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Subscribes an observer to every structural event.
    pub fn subscribe<O: SetObserver + 'static>(&mut self, observer: O) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    /// Removes an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, observer: ObserverId) -> bool {
        self.observers.unsubscribe(observer).is_some()
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Saves a frame of every set and group.
    pub fn save_frame(&mut self) {
        for storage in self.sets.iter_mut() {
            storage.save_frame();
        }
        self.groups.save_frame();
        self.frames.push();
    }

    /// Restores the state saved `frames` frames before the newest one.
    ///
    /// Requests deeper than [`Self::can_rollback_frames`] are clamped. Sets
    /// and groups registered after the target frame return to their state at
    /// registration. Observers are not notified. Returns the number of frames
    /// actually dropped.
    pub fn rollback(&mut self, frames: usize) -> usize {
        let available = self.frames.can_rollback_frames();
        if frames > available {
            tracing::warn!(
                "registry rollback of {} frames clamped to {} recorded frames",
                frames,
                available
            );
        }
        let frames = frames.min(available);
        if self.frames.rollback(frames).is_none() {
            return 0;
        }

        for storage in self.sets.iter_mut() {
            let depth = frames.min(storage.can_rollback_frames());
            storage.rollback(depth);
        }
        self.groups.rollback(frames);

        tracing::trace!("registry rolled back {} frames", frames);
        frames
    }

    /// Deepest rollback available.
    #[inline]
    #[must_use]
    pub fn can_rollback_frames(&self) -> usize {
        self.frames.can_rollback_frames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Packing;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Position {
        x: f32,
        y: f32,
    }

    struct Frozen;

    #[test]
    fn test_registration() {
        let mut registry = Registry::default();
        let position = registry.register_data::<Position>(false).unwrap();
        let frozen = registry.register_tag::<Frozen>(true).unwrap();

        assert_eq!((position, frozen), (0, 1));
        assert_eq!(registry.set(frozen).unwrap().packing(), Packing::WithHoles);
        assert!(matches!(
            registry.register_tag::<Frozen>(false),
            Err(StorageError::AlreadyRegistered(_))
        ));
        assert!(matches!(registry.set(7), Err(StorageError::UnknownSet(_))));
        assert!(registry.kind_name(frozen).is_some_and(|name| name.ends_with("Frozen")));
        assert_eq!(registry.kind_name(7), None);
    }

    #[test]
    fn test_insert_and_get() {
        let mut registry = Registry::default();
        registry.register_data::<Position>(false).unwrap();

        assert!(registry.insert(4, Position { x: 1.0, y: 2.0 }).unwrap());
        assert!(!registry.insert(4, Position { x: 3.0, y: 2.0 }).unwrap());
        registry.get_mut::<Position>(4).unwrap().y = 5.0;

        assert_eq!(registry.get::<Position>(4), Some(&Position { x: 3.0, y: 5.0 }));
        assert!(matches!(
            registry.insert(1, 7_u64),
            Err(StorageError::UnknownSet(_))
        ));
    }

    #[test]
    fn test_observers_see_events_after_groups() {
        let mut registry = Registry::default();
        let frozen = registry.register_tag::<Frozen>(false).unwrap();
        let group = registry.group(&[], &[frozen], &[]).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let observer = registry.subscribe(move |event: SetEvent, sets: &dyn SetSource| {
            log.borrow_mut().push((event, sets.set(event.set()).count()));
        });

        registry.assign(frozen, 2).unwrap();
        registry.unassign(frozen, 2).unwrap();
        assert!(registry.unsubscribe(observer));
        registry.assign(frozen, 3).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                (SetEvent::Assigned { set: frozen, id: 2 }, 1),
                (SetEvent::BeforeUnassigned { set: frozen, id: 2 }, 1),
            ]
        );
        assert!(registry.group_contains(group, 3));
    }

    #[test]
    fn test_clear_set_notifies_groups() {
        let mut registry = Registry::default();
        let frozen = registry.register_tag::<Frozen>(true).unwrap();
        let group = registry.group(&[], &[frozen], &[]).unwrap();

        for id in 0..5 {
            registry.assign(frozen, id).unwrap();
        }
        registry.unassign(frozen, 1).unwrap();
        registry.clear_set(frozen).unwrap();

        assert_eq!(registry.group_len(group), 0);
        assert_eq!(registry.set(frozen).unwrap().count(), 0);
        assert!(!registry.set(frozen).unwrap().has_holes());
    }

    #[test]
    fn test_clear_notifies_every_set() {
        let mut registry = Registry::default();
        let position = registry.register_data::<Position>(false).unwrap();
        let frozen = registry.register_tag::<Frozen>(false).unwrap();
        let group = registry.group(&[position], &[], &[frozen]).unwrap();
        let removed = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&removed);
        registry.subscribe(move |event: SetEvent, _: &dyn SetSource| {
            if matches!(event, SetEvent::BeforeUnassigned { .. }) {
                *counter.borrow_mut() += 1;
            }
        });

        for id in 0..4 {
            registry.insert(id, Position::default()).unwrap();
        }
        registry.assign(frozen, 2).unwrap();
        assert_eq!(registry.group_len(group), 3);

        registry.clear();

        assert_eq!(*removed.borrow(), 5);
        assert_eq!(registry.group_len(group), 0);
        assert!(registry.set(position).unwrap().is_empty());
        assert!(matches!(registry.clear_set(9), Err(StorageError::UnknownSet(_))));
    }

    #[test]
    fn test_rollback_restores_sets_and_groups() {
        let mut registry = Registry::default();
        let position = registry.register_data::<Position>(false).unwrap();
        let frozen = registry.register_tag::<Frozen>(false).unwrap();
        let group = registry.group(&[position], &[], &[frozen]).unwrap();

        registry.insert(1, Position { x: 1.0, y: 0.0 }).unwrap();
        registry.insert(2, Position { x: 2.0, y: 0.0 }).unwrap();
        registry.save_frame();

        registry.assign(frozen, 1).unwrap();
        registry.unassign(position, 2).unwrap();
        assert_eq!(registry.group_len(group), 0);
        registry.save_frame();

        assert_eq!(registry.rollback(1), 1);
        assert_eq!(registry.group_len(group), 2);
        assert_eq!(registry.get::<Position>(2).map(|p| p.x), Some(2.0));
        assert!(!registry.is_assigned(frozen, 1));
    }

    #[test]
    fn test_rollback_without_frames() {
        let mut registry = Registry::default();
        let frozen = registry.register_tag::<Frozen>(false).unwrap();
        registry.assign(frozen, 1).unwrap();

        assert_eq!(registry.rollback(3), 0);
        assert!(registry.is_assigned(frozen, 1));
    }

    #[test]
    fn test_late_set_rolls_back_to_empty() {
        let mut registry = Registry::default();
        registry.register_data::<Position>(false).unwrap();
        registry.save_frame();

        let frozen = registry.register_tag::<Frozen>(false).unwrap();
        registry.assign(frozen, 6).unwrap();
        registry.save_frame();

        registry.rollback(1);
        assert!(!registry.is_assigned(frozen, 6));
    }

    #[test]
    fn test_invalid_config() {
        let config = RegistryConfig {
            page_size: 3,
            ..RegistryConfig::default()
        };
        assert!(matches!(Registry::new(config), Err(StorageError::InvalidConfig(_))));
    }
}
