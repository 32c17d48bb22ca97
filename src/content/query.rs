//! Asking every provider about an event, in a fixed order.
//!
//! Order: structural rules, global effects by slot (ancient one,
//! environment, rumor, others), each seated character's possessions in seat
//! order, then the monster the event involves.

use super::provider::{Hook, Owner, Provider, Subject};
use crate::core::{CharacterId, EventId, GameState};
use crate::events::Event;
use crate::rules::StructuralRules;
use crate::stack::{Timing, Usable};

impl GameState {
    fn global_providers(&self) -> impl Iterator<Item = (Owner, &dyn Provider)> {
        self.globals().filter_map(|(slot, effect)| {
            self.registry()
                .behaviour(&effect.name)
                .map(|b| (Owner::Global(slot), b))
        })
    }

    fn possession_providers(&self, character: CharacterId) -> Vec<(Owner, &dyn Provider)> {
        let Ok(holder) = self.character(character) else {
            return Vec::new();
        };
        if holder.gone {
            return Vec::new();
        }
        holder
            .possessions
            .iter()
            .enumerate()
            .filter_map(|(slot, possession)| {
                self.registry()
                    .behaviour(&possession.name)
                    .map(|b| (Owner::Possession { character, slot }, b))
            })
            .collect()
    }

    /// Every provider with an opinion on `event`, in query order.
    fn providers_for(&self, event: &Event) -> Vec<(Owner, &dyn Provider)> {
        let rules: &dyn Provider = &StructuralRules;
        let mut providers = vec![(Owner::Rules, rules)];
        providers.extend(self.global_providers());
        for character in self.character_ids() {
            providers.extend(self.possession_providers(character));
        }
        if let Some(monster) = event.monster() {
            if let Some(b) = self
                .monster(monster)
                .ok()
                .and_then(|m| self.registry().behaviour(&m.name))
            {
                providers.push((Owner::Monster(monster), b));
            }
        }
        providers
    }

    /// Forced interrupts for `event`, in query order.
    pub(crate) fn interrupts_for(&self, event_id: EventId, event: &Event) -> Vec<Event> {
        self.providers_for(event)
            .into_iter()
            .filter_map(|(owner, provider)| {
                provider.interrupt(&Hook {
                    event_id,
                    event,
                    owner,
                    state: self,
                })
            })
            .collect()
    }

    /// Forced triggers for `event`, in query order.
    pub(crate) fn triggers_for(&self, event_id: EventId, event: &Event) -> Vec<Event> {
        self.providers_for(event)
            .into_iter()
            .filter_map(|(owner, provider)| {
                provider.trigger(&Hook {
                    event_id,
                    event,
                    owner,
                    state: self,
                })
            })
            .collect()
    }

    /// Optional responses to `event` that characters may use, in seat and
    /// possession order.
    pub(crate) fn usables_for(&self, event_id: EventId, event: &Event, timing: Timing) -> Vec<Usable> {
        let mut usables = Vec::new();
        for character in self.character_ids() {
            for (owner, provider) in self.possession_providers(character) {
                let hook = Hook {
                    event_id,
                    event,
                    owner,
                    state: self,
                };
                let offered = match timing {
                    Timing::Before => provider.usable_interrupt(&hook),
                    Timing::After => provider.usable_trigger(&hook),
                };
                if let Some(offered) = offered {
                    usables.push(Usable {
                        character,
                        owner,
                        event: offered,
                    });
                }
            }
        }
        usables
    }

    /// Providers consulted about `subject`, split into the subject's own
    /// level and the state level.
    fn levels(&self, subject: Subject) -> (Vec<(Owner, &dyn Provider)>, Vec<(Owner, &dyn Provider)>) {
        let own = match subject {
            Subject::Character(character) => self.possession_providers(character),
            Subject::Monster(monster) => self
                .monster(monster)
                .ok()
                .and_then(|m| self.registry().behaviour(&m.name))
                .map(|b| vec![(Owner::Monster(monster), b)])
                .unwrap_or_default(),
        };
        let rules: &dyn Provider = &StructuralRules;
        let mut shared = vec![(Owner::Rules, rules)];
        shared.extend(self.global_providers());
        (own, shared)
    }

    /// Sum of every provider's modifier to `attribute` of `subject`.
    #[must_use]
    pub fn modifier(&self, subject: Subject, attribute: &str) -> i32 {
        let (own, shared) = self.levels(subject);
        own.into_iter()
            .chain(shared)
            .map(|(owner, provider)| provider.modifier(owner, subject, attribute, self))
            .sum()
    }

    /// Whether `attribute` holds for `subject`.
    ///
    /// Answers within a level must all agree to hold. The subject's own
    /// level wins over the state level. With no answer at all, `can_*`
    /// attributes hold and everything else does not.
    #[must_use]
    pub fn override_for(&self, subject: Subject, attribute: &str) -> bool {
        let (own, shared) = self.levels(subject);
        let answer = |level: Vec<(Owner, &dyn Provider)>| -> Option<bool> {
            level
                .into_iter()
                .filter_map(|(owner, provider)| provider.override_for(owner, subject, attribute, self))
                .reduce(|a, b| a && b)
        };
        answer(own)
            .or_else(|| answer(shared))
            .unwrap_or_else(|| attribute.starts_with("can_"))
    }
}
