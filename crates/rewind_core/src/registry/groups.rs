//! # Group Registry
//!
//! Builds groups, chains owning groups that share owned sets, and routes
//! structural events to them.
//!
//! ## Chains
//!
//! Owning groups that share an owned set must nest: each link's filter is
//! stricter than the previous one, so every prefix lies inside the prefix of
//! the link before it.
//!
//! ```text
//! owned_base[A] ──► [own A]  ──►  [own A, inc B]  ──►  [own A, inc B, exc C]
//!                   depth 0       depth 1              depth 2
//! ```
//!
//! A new definition is placed after the last link it refines, or in front of
//! the chain if it generalizes the current root. Anything else is a conflict.

use std::collections::HashMap;
use std::fmt;

use crate::ecs::{GroupSets, Id, NonOwningGroup, OwningGroup, SetId, SetSource};
use crate::error::{StorageError, StorageResult};
use crate::rollback::Rewindable;

/// Handle of a registered group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupId {
    /// Index into the owning groups.
    Owning(usize),
    /// Index into the non-owning groups.
    NonOwning(usize),
}

/// Normalized group definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GroupKey {
    owned: Box<[SetId]>,
    included: Box<[SetId]>,
    excluded: Box<[SetId]>,
}

impl GroupKey {
    fn new(owned: &[SetId], included: &[SetId], excluded: &[SetId]) -> Self {
        let normalize = |ids: &[SetId]| {
            let mut ids = ids.to_vec();
            ids.sort_unstable();
            ids.dedup();
            ids.into_boxed_slice()
        };
        Self {
            owned: normalize(owned),
            included: normalize(included),
            excluded: normalize(excluded),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "owned {:?}, include {:?}, exclude {:?}",
            self.owned, self.included, self.excluded
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ChainLink {
    base: Option<usize>,
    extension: Option<usize>,
    depth: usize,
}

#[derive(Clone, Debug, Default)]
struct Route {
    non_owning: Vec<usize>,
    // Owning groups by chain depth, split by the role `set` plays in them.
    including: Vec<usize>,
    excluding: Vec<usize>,
}

fn is_subset(small: &[SetId], large: &[SetId]) -> bool {
    small.iter().all(|set| large.binary_search(set).is_ok())
}

/// Checks whether `general` can sit before `specific` in a chain.
fn is_base_for(general: &OwningGroup, specific: &OwningGroup) -> bool {
    is_subset(general.owned(), specific.owned())
        && is_subset(general.filter().included(), specific.filter().included())
        && is_subset(general.excluded(), specific.excluded())
}

/// Every group of a registry.
pub struct GroupRegistry {
    owning: Vec<Rewindable<OwningGroup>>,
    links: Vec<ChainLink>,
    non_owning: Vec<Rewindable<NonOwningGroup>>,
    lookup: HashMap<GroupKey, GroupId>,
    owned_base: HashMap<SetId, usize>,
    routes: Vec<Route>,
    frames_capacity: usize,
}

impl GroupRegistry {
    /// Creates an empty registry whose groups keep `frames_capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `frames_capacity` is zero.
    #[must_use]
    pub fn new(frames_capacity: usize) -> Self {
        assert!(frames_capacity > 0, "Frames capacity must be greater than zero");

        Self {
            owning: Vec::new(),
            links: Vec::new(),
            non_owning: Vec::new(),
            lookup: HashMap::new(),
            owned_base: HashMap::new(),
            routes: Vec::new(),
            frames_capacity,
        }
    }

    /// Returns the group for a definition, creating and syncing it first if
    /// needed. An empty `owned` list creates a non-owning group.
    ///
    /// # Errors
    ///
    /// - [`StorageError::HoleyOwnedSet`] if an owned set keeps holes
    /// - [`StorageError::UnboundedGroup`] for a non-owning group without
    ///   included sets
    /// - [`StorageError::OwnedSetsInDifferentChains`] if the owned sets are
    ///   already ordered by unrelated chains
    /// - [`StorageError::ConflictingGroup`] if the definition does not nest
    ///   into the chain of its owned sets
    pub fn get_or_create<S: GroupSets + ?Sized>(
        &mut self,
        owned: &[SetId],
        included: &[SetId],
        excluded: &[SetId],
        sets: &mut S,
    ) -> StorageResult<GroupId> {
        let key = GroupKey::new(owned, included, excluded);
        if let Some(&group) = self.lookup.get(&key) {
            self.ensure_synced(group, sets);
            return Ok(group);
        }

        let group = if owned.is_empty() {
            self.add_non_owning(included, excluded)?
        } else {
            self.add_owning(owned, included, excluded, &key, &*sets)?
        };

        tracing::debug!("registered group {:?}: {}", group, key);

        self.lookup.insert(key, group);
        self.rebuild_routes();
        self.ensure_synced(group, sets);
        Ok(group)
    }

    fn add_non_owning(&mut self, included: &[SetId], excluded: &[SetId]) -> StorageResult<GroupId> {
        let mut group = Rewindable::new(NonOwningGroup::new(included, excluded)?, self.frames_capacity);
        group.save_frame();

        self.non_owning.push(group);
        Ok(GroupId::NonOwning(self.non_owning.len() - 1))
    }

    fn add_owning<S: SetSource + ?Sized>(
        &mut self,
        owned: &[SetId],
        included: &[SetId],
        excluded: &[SetId],
        key: &GroupKey,
        sets: &S,
    ) -> StorageResult<GroupId> {
        let group = OwningGroup::new(owned, included, excluded, sets)?;

        let mut root: Option<(SetId, usize)> = None;
        for &set in group.owned() {
            let Some(&found) = self.owned_base.get(&set) else {
                continue;
            };
            match root {
                None => root = Some((set, found)),
                Some((first, existing)) if existing != found => {
                    return Err(StorageError::OwnedSetsInDifferentChains { first, second: set });
                }
                Some(_) => {}
            }
        }

        let index = self.owning.len();
        let conflict = || StorageError::ConflictingGroup {
            definition: key.to_string(),
        };

        let (link, chain_root) = match root {
            None => (ChainLink::default(), index),
            Some((_, root)) if is_base_for(&self.owning[root], &group) => {
                let mut node = root;
                while let Some(next) = self.links[node].extension {
                    if !is_base_for(&self.owning[next], &group) {
                        break;
                    }
                    node = next;
                }

                let extension = self.links[node].extension;
                if let Some(next) = extension {
                    if !is_base_for(&group, &self.owning[next]) {
                        return Err(conflict());
                    }
                    self.links[next].base = Some(index);
                }
                self.links[node].extension = Some(index);

                let link = ChainLink {
                    base: Some(node),
                    extension,
                    depth: 0,
                };
                (link, root)
            }
            Some((_, root)) if is_base_for(&group, &self.owning[root]) => {
                self.links[root].base = Some(index);
                for mapped in self.owned_base.values_mut() {
                    if *mapped == root {
                        *mapped = index;
                    }
                }

                let link = ChainLink {
                    base: None,
                    extension: Some(root),
                    depth: 0,
                };
                (link, index)
            }
            Some(_) => return Err(conflict()),
        };

        for &set in group.owned() {
            self.owned_base.insert(set, chain_root);
        }

        let mut group = Rewindable::new(group, self.frames_capacity);
        group.save_frame();
        self.owning.push(group);
        self.links.push(link);
        self.renumber_chain(index);

        Ok(GroupId::Owning(index))
    }

    fn renumber_chain(&mut self, member: usize) {
        let mut root = member;
        while let Some(base) = self.links[root].base {
            root = base;
        }

        let mut depth = 0;
        let mut node = Some(root);
        while let Some(current) = node {
            self.links[current].depth = depth;
            depth += 1;
            node = self.links[current].extension;
        }
    }

    fn rebuild_routes(&mut self) {
        let set_count = self
            .owning
            .iter()
            .flat_map(|group| group.filter().included().iter().chain(group.excluded()))
            .chain(
                self.non_owning
                    .iter()
                    .flat_map(|group| group.filter().included().iter().chain(group.filter().excluded())),
            )
            .max()
            .map_or(0, |&max| max + 1);

        let mut routes = vec![Route::default(); set_count];
        for (index, group) in self.non_owning.iter().enumerate() {
            for &set in group.filter().included().iter().chain(group.filter().excluded()) {
                routes[set].non_owning.push(index);
            }
        }

        let mut by_depth: Vec<usize> = (0..self.owning.len()).collect();
        by_depth.sort_by_key(|&index| (self.links[index].depth, index));
        for index in by_depth {
            let group = &self.owning[index];
            for &set in group.filter().included() {
                routes[set].including.push(index);
            }
            for &set in group.excluded() {
                routes[set].excluding.push(index);
            }
        }

        self.routes = routes;
    }

    /// Syncs a group. Owning groups first sync the more general links of
    /// their chain; a link that resorts desyncs every link after it.
    pub fn ensure_synced<S: GroupSets + ?Sized>(&mut self, group: GroupId, sets: &mut S) {
        match group {
            GroupId::NonOwning(index) => {
                self.non_owning[index].ensure_synced(&*sets);
            }
            GroupId::Owning(index) => {
                let mut path = vec![index];
                while let Some(base) = self.links[path[path.len() - 1]].base {
                    path.push(base);
                }

                for &node in path.iter().rev() {
                    if self.owning[node].ensure_synced(sets) {
                        let mut next = self.links[node].extension;
                        while let Some(extension) = next {
                            self.owning[extension].desync();
                            next = self.links[extension].extension;
                        }
                    }
                }
            }
        }
    }

    /// Marks a group stale.
    pub fn desync(&mut self, group: GroupId) {
        match group {
            GroupId::Owning(index) => self.owning[index].desync(),
            GroupId::NonOwning(index) => self.non_owning[index].desync(),
        }
    }

    /// Marks every group stale.
    pub fn desync_all(&mut self) {
        for group in &mut self.owning {
            group.desync();
        }
        for group in &mut self.non_owning {
            group.desync();
        }
    }

    /// Routes an assignment to the groups over `set`.
    ///
    /// Owning groups that lose `id` run first, most specific first, then
    /// the groups that may gain it, most general first. A chain link never
    /// swaps an id across the prefix boundary of a more specific link.
    pub fn on_assigned<S: GroupSets + ?Sized>(&mut self, set: SetId, id: Id, sets: &mut S) {
        let Some(route) = self.routes.get(set) else {
            return;
        };
        for &index in &route.non_owning {
            self.non_owning[index].on_assigned(set, id, &*sets);
        }
        for &index in route.excluding.iter().rev() {
            self.owning[index].on_assigned(set, id, sets);
        }
        for &index in &route.including {
            self.owning[index].on_assigned(set, id, sets);
        }
    }

    /// Routes an upcoming unassignment to the groups over `set`, with the
    /// same removal-before-addition order as [`Self::on_assigned`].
    pub fn on_before_unassigned<S: GroupSets + ?Sized>(&mut self, set: SetId, id: Id, sets: &mut S) {
        let Some(route) = self.routes.get(set) else {
            return;
        };
        for &index in &route.non_owning {
            self.non_owning[index].on_before_unassigned(set, id, &*sets);
        }
        for &index in route.including.iter().rev() {
            self.owning[index].on_before_unassigned(set, id, sets);
        }
        for &index in &route.excluding {
            self.owning[index].on_before_unassigned(set, id, sets);
        }
    }

    /// Saves a frame for every group.
    pub fn save_frame(&mut self) {
        for group in &mut self.owning {
            group.save_frame();
        }
        for group in &mut self.non_owning {
            group.save_frame();
        }
    }

    /// Rolls every group back. Groups created after the target frame land on
    /// their creation frame, which is unsynced.
    pub fn rollback(&mut self, frames: usize) {
        for group in &mut self.owning {
            let available = group.can_rollback_frames();
            group.rollback(frames.min(available));
            if frames > available {
                group.desync();
            }
        }
        for group in &mut self.non_owning {
            let available = group.can_rollback_frames();
            group.rollback(frames.min(available));
            if frames > available {
                group.desync();
            }
        }
    }

    /// An owning group.
    #[must_use]
    pub fn owning(&self, index: usize) -> Option<&OwningGroup> {
        self.owning.get(index).map(|group| group.inner())
    }

    /// A non-owning group.
    #[must_use]
    pub fn non_owning(&self, index: usize) -> Option<&NonOwningGroup> {
        self.non_owning.get(index).map(|group| group.inner())
    }

    /// Chain depth of an owning group, 0 for a chain root.
    #[must_use]
    pub fn depth(&self, index: usize) -> Option<usize> {
        self.links.get(index).map(|link| link.depth)
    }

    /// More general neighbour of an owning group in its chain.
    #[must_use]
    pub fn base_of(&self, index: usize) -> Option<usize> {
        self.links.get(index)?.base
    }

    /// More specific neighbour of an owning group in its chain.
    #[must_use]
    pub fn extension_of(&self, index: usize) -> Option<usize> {
        self.links.get(index)?.extension
    }

    /// Chain root ordering `set`, if any owning group owns it.
    #[must_use]
    pub fn owned_base(&self, set: SetId) -> Option<usize> {
        self.owned_base.get(&set).copied()
    }

    /// Number of groups of both kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owning.len() + self.non_owning.len()
    }

    /// Returns `true` if no group is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
