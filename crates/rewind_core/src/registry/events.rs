//! # Structural Events
//!
//! The registry owns one publish/subscribe channel for every set.
//!
//! ## Notification Order
//!
//! For a single event on set `S`:
//!
//! 1. Non-owning groups over `S`, in registration order
//! 2. Owning groups over `S`, most general first on assignment and most
//!    specific first before unassignment
//! 3. External observers, in subscription order
//!
//! "Assigned" fires after the id is live. "Before unassigned" fires while
//! the id is still live, before the set moves anything.

use crate::ecs::{Id, SetId, SetSource};

/// A structural change of one set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SetEvent {
    /// `id` was just assigned into `set`.
    Assigned {
        /// The mutated set.
        set: SetId,
        /// The new id.
        id: Id,
    },
    /// `id` is about to be unassigned from `set`.
    BeforeUnassigned {
        /// The set being mutated.
        set: SetId,
        /// The leaving id.
        id: Id,
    },
}

impl SetEvent {
    /// The set the event is about.
    #[inline]
    #[must_use]
    pub const fn set(&self) -> SetId {
        match *self {
            Self::Assigned { set, .. } | Self::BeforeUnassigned { set, .. } => set,
        }
    }

    /// The id the event is about.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> Id {
        match *self {
            Self::Assigned { id, .. } | Self::BeforeUnassigned { id, .. } => id,
        }
    }
}

/// External listener for structural events.
///
/// Observers see the sets read-only; they run after every group has
/// handled the event.
pub trait SetObserver {
    /// Called once per event.
    fn on_event(&mut self, event: SetEvent, sets: &dyn SetSource);
}

impl<F> SetObserver for F
where
    F: FnMut(SetEvent, &dyn SetSource),
{
    #[inline]
    fn on_event(&mut self, event: SetEvent, sets: &dyn SetSource) {
        self(event, sets);
    }
}

/// Handle returned by a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Subscribed observers in subscription order.
#[derive(Default)]
pub struct ObserverList {
    next: u64,
    entries: Vec<(ObserverId, Box<dyn SetObserver>)>,
}

impl ObserverList {
    /// Adds an observer at the end of the list.
    pub fn subscribe(&mut self, observer: Box<dyn SetObserver>) -> ObserverId {
        let id = ObserverId(self.next);
        self.next += 1;
        self.entries.push((id, observer));
        id
    }

    /// Removes an observer, keeping the order of the rest.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn SetObserver>> {
        let position = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(position).1)
    }

    /// Number of observers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nobody listens.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delivers `event` to every observer.
    pub fn dispatch(&mut self, event: SetEvent, sets: &dyn SetSource) {
        for (_, observer) in &mut self.entries {
            observer.on_event(event, sets);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Packing, SparseSet};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = ObserverList::default();

        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            observers.subscribe(Box::new(move |event: SetEvent, _: &dyn SetSource| {
                log.borrow_mut().push((tag, event.id()));
            }));
        }

        let sets = vec![SparseSet::new(Packing::Continuous)];
        observers.dispatch(SetEvent::Assigned { set: 0, id: 4 }, &sets);

        assert_eq!(*log.borrow(), vec![("first", 4), ("second", 4)]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut observers = ObserverList::default();
        let first = observers.subscribe(Box::new(|_: SetEvent, _: &dyn SetSource| {}));
        let second = observers.subscribe(Box::new(|_: SetEvent, _: &dyn SetSource| {}));

        assert!(observers.unsubscribe(first).is_some());
        assert!(observers.unsubscribe(first).is_none());
        assert_eq!(observers.len(), 1);
        assert!(observers.unsubscribe(second).is_some());
        assert!(observers.is_empty());
    }

    #[test]
    fn test_event_accessors() {
        let event = SetEvent::BeforeUnassigned { set: 2, id: 9 };
        assert_eq!(event.set(), 2);
        assert_eq!(event.id(), 9);
    }
}
