//! Flat storage for in-flight events.
//!
//! Content builds event trees inline: a `Sequence` owns its children as
//! [`EventRef::Pending`] boxes. When a tree enters the arena every pending
//! child (including children hidden inside `Value`s) is placed first and the
//! reference is rewritten to [`EventRef::Placed`]. From then on events only
//! refer to each other by id, which keeps the stack, the arena and the
//! checkpoint format plain data.
//!
//! ## Take / Restore
//!
//! An event being resolved needs `&mut GameState` while the state owns the
//! event. The scheduler takes the event out of its slot for the duration of
//! `resolve` and puts it back afterwards.

use serde::{Deserialize, Serialize};

use super::Event;
use crate::core::{EngineError, EventId};

/// A child event, either still inline or already placed in the arena.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum EventRef {
    Placed(EventId),
    Pending(Box<Event>),
}

impl EventRef {
    /// Arena id. Fails for a reference that was never placed.
    pub fn id(&self) -> Result<EventId, EngineError> {
        match self {
            EventRef::Placed(id) => Ok(*id),
            EventRef::Pending(_) => Err(EngineError::UnplacedChild),
        }
    }

    /// Move a pending event into the arena and point at it.
    pub(crate) fn place(&mut self, arena: &mut EventArena) {
        if matches!(self, EventRef::Pending(_)) {
            let taken = std::mem::replace(self, EventRef::Placed(EventId::new(u32::MAX)));
            if let EventRef::Pending(event) = taken {
                *self = EventRef::Placed(arena.insert(*event));
            }
        }
    }
}

impl From<Event> for EventRef {
    fn from(event: Event) -> Self {
        EventRef::Pending(Box::new(event))
    }
}

impl From<EventId> for EventRef {
    fn from(id: EventId) -> Self {
        EventRef::Placed(id)
    }
}

/// Slot storage for events. Ids are indices and are never reused until the
/// arena is cleared.
///
/// Ids are `u32`. The arena is cleared at every turn boundary, so a single
/// turn would have to place 2^32 events before an id could alias.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventArena {
    slots: Vec<Option<Event>>,
}

impl EventArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an event and all of its pending descendants.
    pub fn insert(&mut self, mut event: Event) -> EventId {
        event.visit_refs(&mut |child| child.place(self));
        let id = EventId::new(self.slots.len() as u32);
        self.slots.push(Some(event));
        id
    }

    #[must_use]
    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Remove an event from its slot while it resolves.
    pub(crate) fn take(&mut self, id: EventId) -> Result<Event, EngineError> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(EngineError::UnknownId {
                kind: "event",
                id: id.raw(),
            })
    }

    /// Put a taken event back.
    pub(crate) fn restore(&mut self, id: EventId, event: Event) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = Some(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every event. Only valid while nothing is on the stack.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}
