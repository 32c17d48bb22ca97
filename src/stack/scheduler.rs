//! The resolution loop.
//!
//! `step` advances the top frame by one move. `resolve_loop` repeats it until
//! the engine has to wait for somebody. There is no hidden continuation: the
//! four stacks and the event arena are the whole suspended state.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::frames::{Timing, UsableWindow};
use crate::core::{CharacterId, EngineError, EventId, GameState};
use crate::events::InputRequest;
use crate::rules::GameStage;

/// Why the loop returned control to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suspension {
    /// A choice-type event wants an answer.
    Choice {
        event: EventId,
        character: Option<CharacterId>,
    },
    /// A dice roll waits for its roll button.
    DiceRoll {
        event: EventId,
        character: Option<CharacterId>,
    },
    /// A slider window is open.
    Sliders {
        event: EventId,
        character: Option<CharacterId>,
    },
    /// Characters with optional responses have not passed yet.
    Usable {
        event: EventId,
        timing: Timing,
        characters: Vec<CharacterId>,
    },
    /// Devoured seats must pick a new character before the round ends.
    Replacement { characters: Vec<CharacterId> },
    /// Test mode with nothing on the stack.
    Idle,
    GameOver(GameStage),
}

enum Step {
    Continue,
    Suspend(Suspension),
}

impl GameState {
    /// Run until the engine needs input, idles, or the game ends.
    pub fn resolve_loop(&mut self) -> Result<Suspension, EngineError> {
        loop {
            if let Step::Suspend(suspension) = self.step()? {
                debug!(?suspension, depth = self.stack().depth(), "suspended");
                return Ok(suspension);
            }
        }
    }

    /// The decision the loop is currently suspended on, recomputed from the
    /// stacks without advancing anything.
    pub fn pending(&self) -> Result<Option<Suspension>, EngineError> {
        if self.stage().is_over() {
            return Ok(Some(Suspension::GameOver(self.stage())));
        }
        let Some(top) = self.stack().top() else {
            let characters = self.unfilled_seats();
            return Ok((!characters.is_empty()).then_some(Suspension::Replacement { characters }));
        };
        if self.stack().top_is_new() {
            return Ok(None);
        }
        if !self.event(top)?.is_resolved() {
            if let Some(suspension) = self.awaiting_input(top)? {
                return Ok(Some(suspension));
            }
            return self.awaiting_usables(top, Timing::Before);
        }
        if !self.stack().triggers_computed() {
            return Ok(None);
        }
        self.awaiting_usables(top, Timing::After)
    }

    fn step(&mut self) -> Result<Step, EngineError> {
        if self.stage().is_over() {
            return Ok(Step::Suspend(Suspension::GameOver(self.stage())));
        }
        self.stack().check_lockstep()?;

        let Some(top) = self.stack().top() else {
            if self.config().test_mode {
                return Ok(Step::Suspend(Suspension::Idle));
            }
            self.clear_events();
            return Ok(match self.next_turn()? {
                Some(suspension) => Step::Suspend(suspension),
                None => Step::Continue,
            });
        };

        if self.stack().top_is_new() {
            self.open_frame(top)?;
            return Ok(Step::Continue);
        }

        if let Some(interrupt) = self.stack_mut().next_interrupt() {
            trace!(event = %interrupt, parent = %top, "interrupt");
            self.push_existing(interrupt);
            return Ok(Step::Continue);
        }

        if !self.event(top)?.is_resolved() {
            if let Some(suspension) = self.awaiting_input(top)? {
                return Ok(Step::Suspend(suspension));
            }
            if let Some(suspension) = self.awaiting_usables(top, Timing::Before)? {
                return Ok(Step::Suspend(suspension));
            }
            self.resolve_top(top)?;
            return Ok(Step::Continue);
        }

        if !self.stack().triggers_computed() {
            self.close_frame(top)?;
            return Ok(Step::Continue);
        }

        if let Some(trigger) = self.stack_mut().next_trigger() {
            trace!(event = %trigger, parent = %top, "trigger");
            self.push_existing(trigger);
            return Ok(Step::Continue);
        }

        if let Some(suspension) = self.awaiting_usables(top, Timing::After)? {
            return Ok(Step::Suspend(suspension));
        }

        let popped = self.stack_mut().pop()?;
        trace!(event = %popped, depth = self.stack().depth(), "pop");
        Ok(Step::Continue)
    }

    /// Create the frame's log entry and queue its interrupts.
    fn open_frame(&mut self, top: EventId) -> Result<(), EngineError> {
        let event = self.event(top)?;
        let text = event.log(self);
        let flatten = event.flatten();
        let interrupts = if event.is_resolved() {
            Vec::new()
        } else {
            self.interrupts_for(top, event)
        };

        let parent = self.stack().log_parent(self.log());
        let log = self.log_mut().open(parent, text, flatten)?;
        let ids: Vec<EventId> = interrupts
            .into_iter()
            .map(|interrupt| self.events_mut().insert(interrupt))
            .collect();
        trace!(event = %top, interrupts = ids.len(), depth = self.stack().depth(), "open");
        self.stack_mut().open(ids, log);
        Ok(())
    }

    fn awaiting_input(&self, top: EventId) -> Result<Option<Suspension>, EngineError> {
        let event = self.event(top)?;
        let character = event.character();
        Ok(match event.input() {
            Some(InputRequest::Choice) => Some(Suspension::Choice { event: top, character }),
            Some(InputRequest::DiceRoll) if !self.config().test_mode => {
                Some(Suspension::DiceRoll { event: top, character })
            }
            Some(InputRequest::Sliders) => Some(Suspension::Sliders { event: top, character }),
            _ => None,
        })
    }

    /// Characters holding an offer in `window` who have not passed on it.
    pub(crate) fn usable_holders(&self, window: UsableWindow) -> Result<Vec<CharacterId>, EngineError> {
        let usables = self.usables_for(window.event, self.event(window.event)?, window.timing);
        Ok(self.stack().waiting(window, &usables))
    }

    fn awaiting_usables(&self, top: EventId, timing: Timing) -> Result<Option<Suspension>, EngineError> {
        let characters = self.usable_holders(UsableWindow { event: top, timing })?;
        Ok((!characters.is_empty()).then_some(Suspension::Usable {
            event: top,
            timing,
            characters,
        }))
    }

    /// Call `resolve` once and check the post-condition: finished with
    /// nothing pushed, or unfinished with exactly one frame pushed.
    fn resolve_top(&mut self, top: EventId) -> Result<(), EngineError> {
        let before = self.stack().depth();
        let mut event = self.events_mut().take(top)?;
        let result = event.resolve(top, self);
        self.events_mut().restore(top, event);
        let finished = result?;

        let pushed = self.stack().depth().saturating_sub(before);
        let resolved = self.event(top)?.is_resolved();
        debug!(event = %top, kind = self.event(top)?.kind.name(), finished, pushed, "resolve");
        match (finished, resolved, pushed) {
            (true, true, 0) | (false, false, 1) => Ok(()),
            _ => Err(EngineError::BrokenContract { event: top, pushed }),
        }
    }

    /// Refresh the log text and queue the frame's triggers.
    fn close_frame(&mut self, top: EventId) -> Result<(), EngineError> {
        let event = self.event(top)?;
        let text = event.log(self);
        let triggers = if event.is_cancelled() {
            Vec::new()
        } else {
            self.triggers_for(top, event)
        };

        if let Some(log) = self.stack().top_log() {
            self.log_mut().set_text(log, text);
        }
        let ids: Vec<EventId> = triggers
            .into_iter()
            .map(|trigger| self.events_mut().insert(trigger))
            .collect();
        trace!(event = %top, triggers = ids.len(), "close");
        self.stack_mut().set_triggers(ids);
        Ok(())
    }
}
