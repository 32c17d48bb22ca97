//! Rules that hold in every game, expressed as a provider that is always
//! asked first.

use super::GameStage;
use crate::content::{Hook, Provider};
use crate::core::{CharacterId, GameState, GlobalSlot};
use crate::events::{
    Awaken, Devoured, EvadeOrFightAll, Event, EventKind, GameOver, KnockedOut, Outcome, Resource,
};

/// Monsters block movement, zero stamina or sanity knocks a character out,
/// the doom track wakes the ancient one, and the game ends when nobody is
/// left or the ancient one is beaten.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralRules;

fn knock_out(state: &GameState, character: CharacterId) -> Option<Event> {
    let who = state.character(character).ok()?;
    if who.gone {
        return None;
    }
    let exhausted = (who.stamina <= 0, who.sanity <= 0);
    let awakened = state.stage() == GameStage::Awakened;
    match exhausted {
        (true, true) => Some(Devoured::new(character).into()),
        (true, false) | (false, true) if awakened => Some(Devoured::new(character).into()),
        (true, false) => Some(KnockedOut::new(character, Resource::Stamina).into()),
        (false, true) => Some(KnockedOut::new(character, Resource::Sanity).into()),
        (false, false) => None,
    }
}

fn doom(state: &GameState) -> Option<Event> {
    let ancient = state.global(GlobalSlot::AncientOne)?;
    let doom = ancient.counter("doom").unwrap_or(0);
    match state.stage() {
        GameStage::Slumber => {
            let max = ancient.counter("max_doom")?;
            (doom >= max).then(|| Awaken::new().into())
        }
        GameStage::Awakened => (doom <= 0).then(|| GameOver::new(Outcome::Victory).into()),
        _ => None,
    }
}

impl Provider for StructuralRules {
    fn interrupt(&self, hook: &Hook<'_>) -> Option<Event> {
        match &hook.event.kind {
            EventKind::Movement(_) => {
                let character = hook.event.character()?;
                let place = hook.state.character(character).ok()?.place?;
                if hook.state.monsters_at(place).is_empty() {
                    return None;
                }
                Some(EvadeOrFightAll::new(character, hook.event_id).into())
            }
            _ => None,
        }
    }

    fn trigger(&self, hook: &Hook<'_>) -> Option<Event> {
        match &hook.event.kind {
            EventKind::GainOrLoss(change) => {
                let touched = change.lost(Resource::Stamina) || change.lost(Resource::Sanity);
                touched.then_some(())?;
                knock_out(hook.state, hook.event.character()?)
            }
            EventKind::CounterChange(change)
                if change.slot() == GlobalSlot::AncientOne && change.counter() == "doom" =>
            {
                doom(hook.state)
            }
            EventKind::Devoured(_) => {
                let replaceable =
                    hook.state.stage() == GameStage::Slumber && hook.state.has_templates();
                (hook.state.living_characters().is_empty() && !replaceable)
                    .then(|| GameOver::new(Outcome::Defeat).into())
            }
            _ => None,
        }
    }
}
