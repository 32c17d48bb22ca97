//! The four parallel stacks.
//!
//! `events` may run one frame ahead of the other three: a frame is pushed
//! first and opened (interrupts computed, log entry created) on the next
//! scheduler step. Outside that window all four have the same length.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::log::EventLog;
use crate::content::Owner;
use crate::core::{CharacterId, EngineError, EventId, LogId};
use crate::events::Event;

/// Whether an optional response comes before or after its event resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timing {
    Before,
    After,
}

/// A point where characters may use optional responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsableWindow {
    pub event: EventId,
    pub timing: Timing,
}

/// An optional response on offer.
#[derive(Clone, Debug)]
pub struct Usable {
    pub character: CharacterId,
    pub owner: Owner,
    pub event: Event,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventStack {
    events: Vec<EventId>,
    interrupts: Vec<VecDeque<EventId>>,
    triggers: Vec<Option<VecDeque<EventId>>>,
    logs: Vec<LogId>,
    done_using: BTreeMap<UsableWindow, BTreeSet<CharacterId>>,
}

impl EventStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: EventId) {
        self.events.push(event);
    }

    #[must_use]
    pub fn top(&self) -> Option<EventId> {
        self.events.last().copied()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Frames from bottom to top.
    #[must_use]
    pub fn events(&self) -> &[EventId] {
        &self.events
    }

    #[must_use]
    pub fn contains(&self, event: EventId) -> bool {
        self.events.contains(&event)
    }

    /// Lengths of the four stacks: events, interrupts, triggers, logs.
    #[must_use]
    pub fn lengths(&self) -> (usize, usize, usize, usize) {
        (
            self.events.len(),
            self.interrupts.len(),
            self.triggers.len(),
            self.logs.len(),
        )
    }

    pub(crate) fn check_lockstep(&self) -> Result<(), EngineError> {
        let (events, interrupts, triggers, logs) = self.lengths();
        let aligned = interrupts == triggers
            && interrupts == logs
            && (events == interrupts || events == interrupts + 1);
        if aligned {
            Ok(())
        } else {
            Err(EngineError::StackMismatch {
                events,
                interrupts,
                triggers,
                logs,
            })
        }
    }

    /// The top frame has not been opened yet.
    #[must_use]
    pub fn top_is_new(&self) -> bool {
        self.interrupts.len() < self.events.len()
    }

    pub(crate) fn open(&mut self, interrupts: Vec<EventId>, log: LogId) {
        self.interrupts.push(interrupts.into());
        self.triggers.push(None);
        self.logs.push(log);
    }

    pub(crate) fn next_interrupt(&mut self) -> Option<EventId> {
        self.interrupts.last_mut()?.pop_front()
    }

    /// Triggers of the top frame have been computed.
    #[must_use]
    pub fn triggers_computed(&self) -> bool {
        matches!(self.triggers.last(), Some(Some(_)))
    }

    pub(crate) fn set_triggers(&mut self, triggers: Vec<EventId>) {
        if let Some(slot) = self.triggers.last_mut() {
            *slot = Some(triggers.into());
        }
    }

    pub(crate) fn next_trigger(&mut self) -> Option<EventId> {
        self.triggers.last_mut()?.as_mut()?.pop_front()
    }

    #[must_use]
    pub fn top_log(&self) -> Option<LogId> {
        self.logs.last().copied()
    }

    /// The nearest open log entry that is not flattened.
    #[must_use]
    pub fn log_parent(&self, log: &EventLog) -> Option<LogId> {
        self.logs
            .iter()
            .rev()
            .copied()
            .find(|&id| log.get(id).is_some_and(|entry| !entry.flatten))
    }

    /// Pop the top frame from all four stacks.
    pub(crate) fn pop(&mut self) -> Result<EventId, EngineError> {
        self.check_lockstep()?;
        let (events, interrupts, triggers, logs) = self.lengths();
        if events != interrupts {
            return Err(EngineError::StackMismatch {
                events,
                interrupts,
                triggers,
                logs,
            });
        }
        let (Some(event), Some(_), Some(_), Some(_)) = (
            self.events.pop(),
            self.interrupts.pop(),
            self.triggers.pop(),
            self.logs.pop(),
        ) else {
            return Err(EngineError::StackMismatch {
                events,
                interrupts,
                triggers,
                logs,
            });
        };
        self.done_using.retain(|window, _| window.event != event);
        Ok(event)
    }

    pub(crate) fn mark_done(&mut self, window: UsableWindow, character: CharacterId) {
        self.done_using.entry(window).or_default().insert(character);
    }

    #[must_use]
    pub fn is_done(&self, window: UsableWindow, character: CharacterId) -> bool {
        self.done_using
            .get(&window)
            .is_some_and(|done| done.contains(&character))
    }

    /// Characters holding an offer in `window` who have not passed yet, in
    /// seat order.
    #[must_use]
    pub fn waiting(&self, window: UsableWindow, usables: &[Usable]) -> Vec<CharacterId> {
        let waiting: BTreeSet<CharacterId> = usables
            .iter()
            .map(|u| u.character)
            .filter(|&c| !self.is_done(window, c))
            .collect();
        waiting.into_iter().collect()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_pop_in_lockstep() {
        let mut stack = EventStack::new();
        stack.push(EventId::new(0));
        assert!(stack.top_is_new());
        assert!(stack.check_lockstep().is_ok());

        stack.open(vec![EventId::new(1), EventId::new(2)], LogId::new(0));
        assert!(!stack.top_is_new());
        assert_eq!(stack.next_interrupt(), Some(EventId::new(1)));
        assert_eq!(stack.next_interrupt(), Some(EventId::new(2)));
        assert_eq!(stack.next_interrupt(), None);

        assert!(!stack.triggers_computed());
        stack.set_triggers(Vec::new());
        assert!(stack.triggers_computed());
        assert_eq!(stack.pop(), Ok(EventId::new(0)));
        assert_eq!(stack.lengths(), (0, 0, 0, 0));
    }

    #[test]
    fn test_pop_unopened_frame_is_mismatch() {
        let mut stack = EventStack::new();
        stack.push(EventId::new(0));
        assert!(matches!(stack.pop(), Err(EngineError::StackMismatch { events: 1, .. })));
    }

    #[test]
    fn test_done_using_is_per_window() {
        let mut stack = EventStack::new();
        let before = UsableWindow {
            event: EventId::new(3),
            timing: Timing::Before,
        };
        let after = UsableWindow {
            timing: Timing::After,
            ..before
        };
        stack.mark_done(before, CharacterId::new(0));
        assert!(stack.is_done(before, CharacterId::new(0)));
        assert!(!stack.is_done(after, CharacterId::new(0)));
        assert!(!stack.is_done(before, CharacterId::new(1)));
    }
}
