//! Moving characters around the map.

use serde::{Deserialize, Serialize};

use super::{who, InputRequest, Resolve};
use crate::core::{CharacterId, EngineError, EventId, GameState, PlaceId};

/// Walk a route one hop per tick.
///
/// Each step moves to the first place and pushes a smaller `Movement` for
/// the rest of the route, so interrupts get a chance to fire before every
/// hop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Movement {
    character: CharacterId,
    route: Vec<PlaceId>,
    rest: Option<EventId>,
    done: bool,
}

impl Movement {
    #[must_use]
    pub fn new(character: CharacterId, route: Vec<PlaceId>) -> Self {
        Self {
            character,
            route,
            rest: None,
            done: false,
        }
    }

    #[must_use]
    pub fn route(&self) -> &[PlaceId] {
        &self.route
    }
}

impl Resolve for Movement {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.rest.is_some() {
            self.done = true;
            return Ok(true);
        }
        let Some((&next, rest)) = self.route.split_first() else {
            self.done = true;
            return Ok(true);
        };

        let character = state.character_mut(self.character)?;
        character.place = Some(next);
        character.movement_points = (character.movement_points - 1).max(0);

        if rest.is_empty() {
            self.done = true;
            return Ok(true);
        }
        let rest = Movement::new(self.character, rest.to_vec());
        self.rest = Some(state.push_event(rest));
        Ok(false)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let names: Vec<&str> = self
            .route
            .iter()
            .filter_map(|&place| state.place(place).ok().map(|p| p.name.as_str()))
            .collect();
        format!("{} moves to {}", who(state, Some(self.character)), names.join(", "))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Direct relocation that nothing can stop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForceMovement {
    character: CharacterId,
    destination: PlaceId,
    done: bool,
}

impl ForceMovement {
    #[must_use]
    pub fn new(character: CharacterId, destination: PlaceId) -> Self {
        Self {
            character,
            destination,
            done: false,
        }
    }
}

impl Resolve for ForceMovement {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        state.place(self.destination)?;
        state.character_mut(self.character)?.place = Some(self.destination);
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let place = state
            .place(self.destination)
            .map_or_else(|_| self.destination.to_string(), |p| p.name.clone());
        format!("{} is moved to {place}", who(state, Some(self.character)))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// The movement phase window. The player moves with `Move` commands, each
/// pushing a `Movement`, until they send `EndMovement`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CityMovement {
    character: CharacterId,
    pub(crate) ended: bool,
    done: bool,
}

impl CityMovement {
    #[must_use]
    pub fn new(character: CharacterId) -> Self {
        Self {
            character,
            ended: false,
            done: false,
        }
    }
}

impl Resolve for CityMovement {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        state.character_mut(self.character)?.movement_points = 0;
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        format!("{} moves through the city", who(state, Some(self.character)))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn input(&self) -> Option<InputRequest> {
        (!self.ended).then_some(InputRequest::Choice)
    }
}
