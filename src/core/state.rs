//! The game state root.
//!
//! `GameState` owns every mutable thing in a game: characters, places,
//! monsters, decks, global effects, the event arena and the four parallel
//! stacks. Everything else refers to these through ids.
//!
//! ## Setup
//!
//! ```
//! use std::sync::Arc;
//! use eldritch::content::ContentRegistry;
//! use eldritch::core::{GameConfig, GameState};
//! use eldritch::entities::{CharacterTemplate, Place, PlaceKind};
//!
//! let mut state = GameState::new(GameConfig::new(42).test_mode(), Arc::new(ContentRegistry::new()));
//! let library = state.add_place(Place::new("Library", PlaceKind::Location)).unwrap();
//! let street = state.add_place(Place::new("Miskatonic U. Streets", PlaceKind::Street)).unwrap();
//! state.connect(library, street).unwrap();
//!
//! let ada = state.add_character(&CharacterTemplate::new("Ada", "Library")).unwrap();
//! assert_eq!(state.character(ada).unwrap().place, Some(library));
//! assert_eq!(state.living_characters(), vec![ada]);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use super::config::GameConfig;
use super::error::EngineError;
use super::ids::{CharacterId, EventId, GlobalSlot, MonsterId, PlaceId};
use super::rng::GameRng;
use crate::content::{ContentRegistry, GlobalEffect, Subject};
use crate::decks::Decks;
use crate::entities::{Character, CharacterTemplate, CheckType, Monster, MonsterLocation, Place, Trophy};
use crate::events::{Event, EventArena, Resource};
use crate::rules::{GameStage, TurnTracker};
use crate::stack::{EventLog, EventStack};

fn unknown(kind: &'static str, id: u32) -> EngineError {
    EngineError::UnknownId { kind, id }
}

fn flag(on: bool) -> f64 {
    f64::from(u8::from(on))
}

/// Complete, resumable game state.
///
/// Serializes to exactly what a restart needs. The content registry is code
/// and is reattached by [`GameState::restore`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    config: GameConfig,
    rng: GameRng,
    stage: GameStage,
    turn: TurnTracker,

    characters: Vec<Character>,
    /// Characters still available to fill a devoured seat.
    templates: Vec<CharacterTemplate>,
    places: Vec<Place>,
    monsters: Vec<Monster>,
    globals: BTreeMap<GlobalSlot, GlobalEffect>,
    decks: Decks,

    events: EventArena,
    stack: EventStack,
    log: EventLog,

    #[serde(skip)]
    registry: Arc<ContentRegistry>,
}

impl GameState {
    /// Create an empty game. Add places, characters, monsters, decks and
    /// global effects before calling `start`.
    #[must_use]
    pub fn new(config: GameConfig, registry: Arc<ContentRegistry>) -> Self {
        Self {
            rng: GameRng::new(config.seed),
            config,
            stage: GameStage::Setup,
            turn: TurnTracker::default(),
            characters: Vec::new(),
            templates: Vec::new(),
            places: Vec::new(),
            monsters: Vec::new(),
            globals: BTreeMap::new(),
            decks: Decks::new(),
            events: EventArena::new(),
            stack: EventStack::new(),
            log: EventLog::new(),
            registry,
        }
    }

    // === Configuration and progression ===

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn stage(&self) -> GameStage {
        self.stage
    }

    pub fn set_stage(&mut self, stage: GameStage) {
        if self.stage != stage {
            info!(from = ?self.stage, to = ?stage, "stage");
            self.stage = stage;
        }
    }

    #[must_use]
    pub fn turn(&self) -> &TurnTracker {
        &self.turn
    }

    pub fn turn_mut(&mut self) -> &mut TurnTracker {
        &mut self.turn
    }

    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn.number
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// Script the next die faces.
    pub fn queue_rolls(&mut self, faces: impl IntoIterator<Item = u8>) {
        self.rng.queue_rolls(faces);
    }

    // === Places ===

    pub fn add_place(&mut self, place: Place) -> Result<PlaceId, EngineError> {
        let id = PlaceId::from_index(self.places.len()).ok_or(EngineError::Full { kind: "place" })?;
        self.places.push(place);
        Ok(id)
    }

    /// Make two places neighbours of each other.
    pub fn connect(&mut self, a: PlaceId, b: PlaceId) -> Result<(), EngineError> {
        self.place(b)?;
        let first = self.place_mut(a)?;
        if !first.neighbors.contains(&b) {
            first.neighbors.push(b);
        }
        let second = self.place_mut(b)?;
        if !second.neighbors.contains(&a) {
            second.neighbors.push(a);
        }
        Ok(())
    }

    pub fn place(&self, id: PlaceId) -> Result<&Place, EngineError> {
        self.places
            .get(id.index())
            .ok_or_else(|| unknown("place", u32::from(id.raw())))
    }

    pub fn place_mut(&mut self, id: PlaceId) -> Result<&mut Place, EngineError> {
        self.places
            .get_mut(id.index())
            .ok_or_else(|| unknown("place", u32::from(id.raw())))
    }

    #[must_use]
    pub fn place_by_name(&self, name: &str) -> Option<PlaceId> {
        self.places
            .iter()
            .position(|p| p.name == name)
            .map(|i| PlaceId::new(i as u16))
    }

    pub fn places(&self) -> impl Iterator<Item = (PlaceId, &Place)> {
        self.places
            .iter()
            .enumerate()
            .map(|(i, p)| (PlaceId::new(i as u16), p))
    }

    /// Readable place attributes: `clues`, `gate`, `sealed`, `monsters`,
    /// `characters`.
    pub fn place_attribute(&self, id: PlaceId, attribute: &str) -> Result<Option<f64>, EngineError> {
        let place = self.place(id)?;
        Ok(match attribute {
            "clues" => Some(f64::from(place.clues)),
            "gate" => Some(flag(place.gate.is_some())),
            "sealed" => Some(flag(place.sealed)),
            "monsters" => Some(self.monsters_at(id).len() as f64),
            "characters" => Some(
                self.characters
                    .iter()
                    .filter(|c| !c.gone && c.place == Some(id))
                    .count() as f64,
            ),
            _ => None,
        })
    }

    /// Shortest route from `from` to `to` of at most `limit` hops, not
    /// including the starting place.
    #[must_use]
    pub fn route(&self, from: PlaceId, to: PlaceId, limit: usize) -> Option<Vec<PlaceId>> {
        if from == to {
            return Some(Vec::new());
        }
        let mut previous: BTreeMap<PlaceId, PlaceId> = BTreeMap::new();
        let mut frontier = VecDeque::from([(from, 0usize)]);
        while let Some((here, hops)) = frontier.pop_front() {
            if hops >= limit {
                continue;
            }
            let Ok(place) = self.place(here) else { continue };
            for &next in &place.neighbors {
                if next == from || previous.contains_key(&next) {
                    continue;
                }
                previous.insert(next, here);
                if next == to {
                    let mut route = vec![to];
                    let mut cursor = to;
                    while let Some(&back) = previous.get(&cursor) {
                        if back == from {
                            break;
                        }
                        route.push(back);
                        cursor = back;
                    }
                    route.reverse();
                    return Some(route);
                }
                frontier.push_back((next, hops + 1));
            }
        }
        None
    }

    // === Characters ===

    /// Seat a character at their home place.
    pub fn add_character(&mut self, template: &CharacterTemplate) -> Result<CharacterId, EngineError> {
        let id = CharacterId::from_index(self.characters.len()).ok_or(EngineError::Full { kind: "seat" })?;
        let home = self.place_by_name(&template.home);
        self.characters.push(Character::from_template(template, home));
        Ok(id)
    }

    /// Offer a character for replacing devoured ones.
    pub fn add_template(&mut self, template: CharacterTemplate) {
        self.templates.push(template);
    }

    #[must_use]
    pub fn has_templates(&self) -> bool {
        !self.templates.is_empty()
    }

    #[must_use]
    pub fn templates(&self) -> &[CharacterTemplate] {
        &self.templates
    }

    /// Fill `seat` with the available template called `name`. Returns false
    /// when no such template is available.
    pub fn replace_character(&mut self, seat: CharacterId, name: &str) -> Result<bool, EngineError> {
        self.character(seat)?;
        let Some(index) = self.templates.iter().position(|t| t.name == name) else {
            return Ok(false);
        };
        let template = self.templates.remove(index);
        let home = self.place_by_name(&template.home);
        self.characters[seat.index()] = Character::from_template(&template, home);
        info!(seat = %seat, character = %template.name, "seat filled");
        Ok(true)
    }

    pub fn character(&self, id: CharacterId) -> Result<&Character, EngineError> {
        self.characters
            .get(id.index())
            .ok_or_else(|| unknown("character", u32::from(id.raw())))
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Result<&mut Character, EngineError> {
        self.characters
            .get_mut(id.index())
            .ok_or_else(|| unknown("character", u32::from(id.raw())))
    }

    #[must_use]
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Every seat, in seat order.
    pub fn character_ids(&self) -> impl Iterator<Item = CharacterId> {
        (0..self.characters.len()).map(|i| CharacterId::new(i as u8))
    }

    /// Seats whose character is still in the game.
    #[must_use]
    pub fn living_characters(&self) -> Vec<CharacterId> {
        self.character_ids()
            .filter(|&c| self.characters[c.index()].is_active())
            .collect()
    }

    /// Skill value for a check: the slider value plus every modifier to the
    /// skill and, for composite checks, to the check itself.
    pub fn stat(&self, id: CharacterId, check: CheckType) -> Result<i32, EngineError> {
        let stat = check.base_stat();
        let subject = Subject::Character(id);
        let mut value = self.character(id)?.base_stat(stat) + self.modifier(subject, stat.name());
        if let Some(composite) = check.composite() {
            value += self.modifier(subject, composite);
        }
        Ok(value)
    }

    /// Lowest face that counts as a success.
    pub fn success_threshold(&self, id: CharacterId) -> Result<u8, EngineError> {
        Ok(match self.character(id)?.bless_curse {
            b if b > 0 => 4,
            b if b < 0 => 6,
            _ => 5,
        })
    }

    pub fn max_stamina(&self, id: CharacterId) -> Result<i32, EngineError> {
        let base = self.character(id)?.base_max_stamina;
        Ok(base + self.modifier(Subject::Character(id), "max_stamina"))
    }

    pub fn max_sanity(&self, id: CharacterId) -> Result<i32, EngineError> {
        let base = self.character(id)?.base_max_sanity;
        Ok(base + self.modifier(Subject::Character(id), "max_sanity"))
    }

    pub fn resource(&self, id: CharacterId, resource: Resource) -> Result<i32, EngineError> {
        let c = self.character(id)?;
        Ok(match resource {
            Resource::Stamina => c.stamina,
            Resource::Sanity => c.sanity,
            Resource::Dollars => c.dollars,
            Resource::Clues => c.clues,
            Resource::MovementPoints => c.movement_points,
        })
    }

    pub fn set_resource(&mut self, id: CharacterId, resource: Resource, value: i32) -> Result<(), EngineError> {
        let c = self.character_mut(id)?;
        let slot = match resource {
            Resource::Stamina => &mut c.stamina,
            Resource::Sanity => &mut c.sanity,
            Resource::Dollars => &mut c.dollars,
            Resource::Clues => &mut c.clues,
            Resource::MovementPoints => &mut c.movement_points,
        };
        *slot = value;
        Ok(())
    }

    /// Readable character attributes: resources by name, `max_stamina`,
    /// `max_sanity`, `focus`, every skill and check name, status flags and
    /// trophy counts.
    pub fn character_attribute(&self, id: CharacterId, attribute: &str) -> Result<Option<f64>, EngineError> {
        if let Some(resource) = Resource::from_name(attribute) {
            return Ok(Some(f64::from(self.resource(id, resource)?)));
        }
        if let Some(check) = CheckType::from_name(attribute) {
            return Ok(Some(f64::from(self.stat(id, check)?)));
        }
        let turn = self.turn_number();
        let c = self.character(id)?;
        Ok(match attribute {
            "max_stamina" => Some(f64::from(self.max_stamina(id)?)),
            "max_sanity" => Some(f64::from(self.max_sanity(id)?)),
            "focus" => Some(f64::from(c.focus)),
            "focus_points" => Some(f64::from(c.focus_points)),
            "retainer" => Some(flag(c.retainer)),
            "lodge_membership" => Some(flag(c.lodge_membership)),
            "delayed" => Some(flag(c.delayed)),
            "arrested" => Some(flag(c.arrested_until.is_some_and(|until| turn <= until))),
            "lose_turn" => Some(flag(c.loses_turn(turn))),
            "bless_curse" => Some(f64::from(c.bless_curse)),
            "blessed" => Some(flag(c.bless_curse > 0)),
            "cursed" => Some(flag(c.bless_curse < 0)),
            "trophies" => Some(c.trophies.len() as f64),
            "monster_trophies" => Some(
                c.trophies
                    .iter()
                    .filter(|t| matches!(t, Trophy::Monster(_)))
                    .count() as f64,
            ),
            "gate_trophies" => Some(
                c.trophies
                    .iter()
                    .filter(|t| matches!(t, Trophy::Gate(_)))
                    .count() as f64,
            ),
            "possessions" => Some(c.possessions.len() as f64),
            _ => None,
        })
    }

    // === Monsters ===

    pub fn add_monster(&mut self, monster: Monster) -> Result<MonsterId, EngineError> {
        let id = MonsterId::from_index(self.monsters.len()).ok_or(EngineError::Full { kind: "monster" })?;
        self.monsters.push(monster);
        Ok(id)
    }

    pub fn monster(&self, id: MonsterId) -> Result<&Monster, EngineError> {
        self.monsters
            .get(id.index())
            .ok_or_else(|| unknown("monster", id.raw()))
    }

    pub fn monster_mut(&mut self, id: MonsterId) -> Result<&mut Monster, EngineError> {
        self.monsters
            .get_mut(id.index())
            .ok_or_else(|| unknown("monster", id.raw()))
    }

    pub fn monsters(&self) -> impl Iterator<Item = (MonsterId, &Monster)> {
        self.monsters
            .iter()
            .enumerate()
            .map(|(i, m)| (MonsterId::new(i as u32), m))
    }

    #[must_use]
    pub fn monsters_in_cup(&self) -> Vec<MonsterId> {
        self.monsters()
            .filter(|(_, m)| m.location == MonsterLocation::Cup)
            .map(|(id, _)| id)
            .collect()
    }

    #[must_use]
    pub fn monsters_at(&self, place: PlaceId) -> Vec<MonsterId> {
        self.monsters()
            .filter(|(_, m)| m.place() == Some(place))
            .map(|(id, _)| id)
            .collect()
    }

    /// A printed monster rating plus modifiers. `None` when the rating does
    /// not apply to this monster.
    pub fn monster_rating(&self, id: MonsterId, rating: &str) -> Result<Option<i32>, EngineError> {
        let printed = self.monster(id)?.attribute(rating);
        Ok(printed.map(|base| base as i32 + self.modifier(Subject::Monster(id), rating)))
    }

    // === Global effects ===

    /// Mount a global effect, replacing whatever held the slot.
    pub fn set_global(&mut self, slot: GlobalSlot, effect: GlobalEffect) -> Option<GlobalEffect> {
        info!(slot = %slot, effect = %effect.name, "global effect");
        self.globals.insert(slot, effect)
    }

    pub fn remove_global(&mut self, slot: GlobalSlot) -> Option<GlobalEffect> {
        self.globals.remove(&slot)
    }

    #[must_use]
    pub fn global(&self, slot: GlobalSlot) -> Option<&GlobalEffect> {
        self.globals.get(&slot)
    }

    pub fn global_mut(&mut self, slot: GlobalSlot) -> Option<&mut GlobalEffect> {
        self.globals.get_mut(&slot)
    }

    /// Mounted effects in query order.
    pub fn globals(&self) -> impl Iterator<Item = (GlobalSlot, &GlobalEffect)> {
        self.globals.iter().map(|(slot, effect)| (*slot, effect))
    }

    // === Decks ===

    #[must_use]
    pub fn decks(&self) -> &Decks {
        &self.decks
    }

    pub fn decks_mut(&mut self) -> &mut Decks {
        &mut self.decks
    }

    // === Events and stacks ===

    pub fn event(&self, id: EventId) -> Result<&Event, EngineError> {
        self.events.get(id).ok_or_else(|| unknown("event", id.raw()))
    }

    pub fn event_mut(&mut self, id: EventId) -> Result<&mut Event, EngineError> {
        self.events
            .get_mut(id)
            .ok_or_else(|| unknown("event", id.raw()))
    }

    /// Place `event` in the arena and push it as a new frame.
    pub fn push_event(&mut self, event: impl Into<Event>) -> EventId {
        let event = event.into();
        let kind = event.kind.name();
        let id = self.events.insert(event);
        self.stack.push(id);
        trace!(event = %id, kind, depth = self.stack.depth(), "push");
        id
    }

    /// Push an already placed event as a new frame.
    pub fn push_existing(&mut self, id: EventId) {
        self.stack.push(id);
        trace!(event = %id, depth = self.stack.depth(), "push");
    }

    #[must_use]
    pub fn events(&self) -> &EventArena {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventArena {
        &mut self.events
    }

    /// Drop finished events at a turn boundary.
    pub(crate) fn clear_events(&mut self) {
        if self.stack.is_empty() {
            self.events.clear();
            self.stack.clear();
        }
    }

    #[must_use]
    pub fn stack(&self) -> &EventStack {
        &self.stack
    }

    pub(crate) fn stack_mut(&mut self) -> &mut EventStack {
        &mut self.stack
    }

    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub(crate) fn log_mut(&mut self) -> &mut EventLog {
        &mut self.log
    }

    // === Persistence ===

    /// Encode the full resumable state.
    pub fn checkpoint(&self) -> Result<Vec<u8>, EngineError> {
        bincode::serialize(self).map_err(|e| EngineError::Checkpoint(e.to_string()))
    }

    /// Decode a checkpoint and reattach the content registry.
    pub fn restore(bytes: &[u8], registry: Arc<ContentRegistry>) -> Result<Self, EngineError> {
        let mut state: GameState =
            bincode::deserialize(bytes).map_err(|e| EngineError::Checkpoint(e.to_string()))?;
        state.registry = registry;
        Ok(state)
    }
}
