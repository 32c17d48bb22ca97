//! Combat with monsters.
//!
//! A [`Combat`] runs the horror check, then repeats a Fight/Flee choice until
//! the monster is beaten, the character gets away, or the character can no
//! longer continue (knocked out, devoured or moved away).

use serde::{Deserialize, Serialize};

use super::{
    who, Check, Condition, Conditional, EventKind, GainOrLoss, MultipleChoice, Nothing, Resolve,
    Resource,
};
use crate::core::{CharacterId, EngineError, EventId, GameState, MonsterId};
use crate::entities::{CheckType, MonsterLocation, Trophy};

fn still_engaged(state: &GameState, character: CharacterId, monster: MonsterId) -> Result<bool, EngineError> {
    let who = state.character(character)?;
    let place = state.monster(monster)?.place();
    Ok(!who.gone && who.stamina > 0 && who.sanity > 0 && place.is_some() && who.place == place)
}

fn successes(state: &GameState, check: EventId) -> Result<u32, EngineError> {
    match &state.event(check)?.kind {
        EventKind::Check(check) => Ok(check.successes().unwrap_or(0)),
        _ => Ok(0),
    }
}

fn monster_name(state: &GameState, monster: MonsterId) -> String {
    state
        .monster(monster)
        .map_or_else(|_| monster.to_string(), |m| m.name.clone())
}

/// How a combat ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    Evaded,
    Defeated,
    /// The character dropped out (knocked out, devoured, moved).
    Broken,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum CombatStage {
    Start,
    Horror,
    Choosing,
    Fighting,
    Fleeing,
}

/// One full combat against one monster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Combat {
    character: CharacterId,
    monster: MonsterId,
    stage: CombatStage,
    pending: Option<EventId>,
    outcome: Option<CombatOutcome>,
}

impl Combat {
    #[must_use]
    pub fn new(character: CharacterId, monster: MonsterId) -> Self {
        Self {
            character,
            monster,
            stage: CombatStage::Start,
            pending: None,
            outcome: None,
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.outcome
    }

    fn finish(&mut self, outcome: CombatOutcome) -> Result<bool, EngineError> {
        self.outcome = Some(outcome);
        Ok(true)
    }

    fn offer_choice(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let monster = state.monster(self.monster)?;
        let mut labels = Vec::new();
        if monster.combat.is_some() {
            labels.push("Fight");
        }
        if monster.awareness.is_some() {
            labels.push("Flee");
        }
        if labels.is_empty() {
            return self.finish(CombatOutcome::Evaded);
        }
        let prompt = format!("Fight or flee from {}?", monster.name);
        let choice = MultipleChoice::new(self.character, prompt, labels);
        self.pending = Some(state.push_event(choice));
        self.stage = CombatStage::Choosing;
        Ok(false)
    }
}

impl Resolve for Combat {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        match self.stage {
            CombatStage::Start => {
                let Some(difficulty) = state.monster_rating(self.monster, "horror_difficulty")? else {
                    return self.offer_choice(state);
                };
                let damage = state.monster_rating(self.monster, "horror_damage")?.unwrap_or(0);
                let check = Check::new(self.character, CheckType::Horror, difficulty);
                let damage = GainOrLoss::loss(self.character, Resource::Sanity, damage);
                let horror_check = Conditional::pass_fail(
                    Some(self.character),
                    Condition::on(check, "successes"),
                    Nothing::new(),
                    damage,
                )?;
                self.pending = Some(state.push_event(horror_check));
                self.stage = CombatStage::Horror;
                Ok(false)
            }
            CombatStage::Horror => {
                if !still_engaged(state, self.character, self.monster)? {
                    return self.finish(CombatOutcome::Broken);
                }
                self.offer_choice(state)
            }
            CombatStage::Choosing => {
                let picked = self
                    .pending
                    .map(|id| state.event(id))
                    .transpose()?
                    .and_then(|event| match &event.kind {
                        EventKind::MultipleChoice(choice) => choice.chosen().map(str::to_string),
                        _ => None,
                    });
                let round = if picked.as_deref() == Some("Fight") {
                    self.stage = CombatStage::Fighting;
                    state.push_event(CombatRound::new(self.character, self.monster))
                } else {
                    self.stage = CombatStage::Fleeing;
                    state.push_event(EvadeRound::new(self.character, self.monster))
                };
                self.pending = Some(round);
                Ok(false)
            }
            CombatStage::Fighting | CombatStage::Fleeing => {
                let round = self.pending.map(|id| state.event(id)).transpose()?;
                let result = round.and_then(|event| match &event.kind {
                    EventKind::CombatRound(r) if r.defeated == Some(true) => Some(CombatOutcome::Defeated),
                    EventKind::EvadeRound(r) if r.evaded == Some(true) => Some(CombatOutcome::Evaded),
                    _ => None,
                });
                if let Some(outcome) = result {
                    return self.finish(outcome);
                }
                if !still_engaged(state, self.character, self.monster)? {
                    return self.finish(CombatOutcome::Broken);
                }
                self.offer_choice(state)
            }
        }
    }

    fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        let monster = monster_name(state, self.monster);
        match self.outcome {
            Some(CombatOutcome::Defeated) => format!("{name} defeats {monster}"),
            Some(CombatOutcome::Evaded) => format!("{name} evades {monster}"),
            Some(CombatOutcome::Broken) => format!("{name} is driven off by {monster}"),
            None => format!("{name} faces {monster}"),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        let outcome = self.outcome?;
        match name {
            "evaded" => Some(f64::from(u8::from(outcome == CombatOutcome::Evaded))),
            "defeated" => Some(f64::from(u8::from(outcome == CombatOutcome::Defeated))),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn monster(&self) -> Option<MonsterId> {
        Some(self.monster)
    }
}

/// Sneak past a monster: an evade check against its awareness. Failing
/// costs its combat damage in stamina.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvadeRound {
    character: CharacterId,
    monster: MonsterId,
    check: Option<EventId>,
    damage: Option<EventId>,
    pub(crate) evaded: Option<bool>,
}

impl EvadeRound {
    #[must_use]
    pub fn new(character: CharacterId, monster: MonsterId) -> Self {
        Self {
            character,
            monster,
            check: None,
            damage: None,
            evaded: None,
        }
    }
}

impl Resolve for EvadeRound {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let Some(check) = self.check else {
            let awareness = state.monster_rating(self.monster, "awareness")?.unwrap_or(0);
            let check = Check::new(self.character, CheckType::Evade, awareness);
            self.check = Some(state.push_event(check));
            return Ok(false);
        };
        if self.damage.is_some() {
            self.evaded = Some(false);
            return Ok(true);
        }
        if successes(state, check)? >= 1 {
            self.evaded = Some(true);
            return Ok(true);
        }
        let damage = state.monster_rating(self.monster, "combat_damage")?.unwrap_or(0);
        let loss = GainOrLoss::loss(self.character, Resource::Stamina, damage);
        self.damage = Some(state.push_event(loss));
        Ok(false)
    }

    fn is_resolved(&self) -> bool {
        self.evaded.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        let monster = monster_name(state, self.monster);
        match self.evaded {
            Some(true) => format!("{name} slips away from {monster}"),
            Some(false) => format!("{name} fails to evade {monster}"),
            None => format!("{name} tries to evade {monster}"),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "evaded" => self.evaded.map(|e| f64::from(u8::from(e))),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn monster(&self) -> Option<MonsterId> {
        Some(self.monster)
    }
}

/// One round of fighting: a combat check against the monster's combat
/// rating, beaten with successes equal to its toughness. Endless monsters
/// go back to the cup instead of becoming trophies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CombatRound {
    character: CharacterId,
    monster: MonsterId,
    check: Option<EventId>,
    damage: Option<EventId>,
    pub(crate) defeated: Option<bool>,
}

impl CombatRound {
    #[must_use]
    pub fn new(character: CharacterId, monster: MonsterId) -> Self {
        Self {
            character,
            monster,
            check: None,
            damage: None,
            defeated: None,
        }
    }
}

impl Resolve for CombatRound {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let Some(check) = self.check else {
            let difficulty = state.monster_rating(self.monster, "combat_difficulty")?.unwrap_or(0);
            let check = Check::new(self.character, CheckType::Combat, difficulty);
            self.check = Some(state.push_event(check));
            return Ok(false);
        };
        if self.damage.is_some() {
            self.defeated = Some(false);
            return Ok(true);
        }

        let toughness = state.monster_rating(self.monster, "toughness")?.unwrap_or(1);
        if i64::from(successes(state, check)?) >= i64::from(toughness) {
            let endless = state.monster(self.monster)?.has("endless");
            let monster = state.monster_mut(self.monster)?;
            if endless {
                monster.location = MonsterLocation::Cup;
            } else {
                monster.location = MonsterLocation::Trophy(self.character);
                state
                    .character_mut(self.character)?
                    .trophies
                    .push(Trophy::Monster(self.monster));
            }
            self.defeated = Some(true);
            return Ok(true);
        }

        let damage = state.monster_rating(self.monster, "combat_damage")?.unwrap_or(0);
        let loss = GainOrLoss::loss(self.character, Resource::Stamina, damage);
        self.damage = Some(state.push_event(loss));
        Ok(false)
    }

    fn is_resolved(&self) -> bool {
        self.defeated.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        let monster = monster_name(state, self.monster);
        match self.defeated {
            Some(true) => format!("{name} overcomes {monster}"),
            Some(false) => format!("{name} is hurt by {monster}"),
            None => format!("{name} fights {monster}"),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "defeated" => self.defeated.map(|d| f64::from(u8::from(d))),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn monster(&self) -> Option<MonsterId> {
        Some(self.monster)
    }
}

/// Structural movement interrupt: every monster sharing the mover's place
/// must be dealt with. Unless all of them were evaded, the movement is
/// cancelled and the character's remaining movement points are lost.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvadeOrFightAll {
    character: CharacterId,
    movement: EventId,
    monsters: Option<Vec<MonsterId>>,
    next: usize,
    current: Option<EventId>,
    all_evaded: bool,
    done: bool,
}

impl EvadeOrFightAll {
    #[must_use]
    pub fn new(character: CharacterId, movement: EventId) -> Self {
        Self {
            character,
            movement,
            monsters: None,
            next: 0,
            current: None,
            all_evaded: true,
            done: false,
        }
    }
}

impl Resolve for EvadeOrFightAll {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if let Some(current) = self.current.take() {
            let evaded = state.event(current)?.attribute("evaded") == Some(1.0);
            self.all_evaded &= evaded;
        }
        let monsters = match &self.monsters {
            Some(monsters) => monsters.clone(),
            None => {
                let place = state.character(self.character)?.place;
                let found = place.map(|p| state.monsters_at(p)).unwrap_or_default();
                self.monsters = Some(found.clone());
                found
            }
        };

        while let Some(&monster) = monsters.get(self.next) {
            self.next += 1;
            if still_engaged(state, self.character, monster)? {
                self.current = Some(state.push_event(Combat::new(self.character, monster)));
                return Ok(false);
            }
        }

        if !self.all_evaded {
            state.event_mut(self.movement)?.cancel();
            state.character_mut(self.character)?.movement_points = 0;
        }
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match (self.done, self.all_evaded) {
            (true, true) => format!("{name} gets past the monsters"),
            (true, false) => format!("{name} is stopped by monsters"),
            (false, _) => format!("{name} must deal with the monsters here"),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "evaded" if self.done => Some(f64::from(u8::from(self.all_evaded))),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}
