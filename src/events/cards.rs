//! Drawing cards and moving monsters between the board and the cup.

use serde::{Deserialize, Serialize};

use super::{who, InputRequest, Resolve};
use crate::core::{CharacterId, EngineError, EventId, GameState, MonsterId, PlaceId};
use crate::decks::{DeckId, DeckPosition};
use crate::entities::{MonsterLocation, Possession};

/// Kept cards become possessions when the deck holds possessions. Cards
/// from any other deck go back to the bottom.
fn keep_cards(
    state: &mut GameState,
    character: CharacterId,
    deck: DeckId,
    cards: impl IntoIterator<Item = String>,
) -> Result<(), EngineError> {
    match deck.possession_kind() {
        Some(kind) => {
            let holder = state.character_mut(character)?;
            holder
                .possessions
                .extend(cards.into_iter().map(|name| Possession::new(name, kind)));
        }
        None => {
            for card in cards {
                state.decks_mut().add(deck, card, DeckPosition::Bottom);
            }
        }
    }
    Ok(())
}

/// Draw up to `count` cards and keep `keep` of them.
///
/// With no more candidates than `keep`, everything drawn is kept without a
/// choice. Otherwise a [`KeepDrawn`] choice follows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draw {
    character: CharacterId,
    deck: DeckId,
    count: u32,
    keep: u32,
    drawn: Option<Vec<String>>,
    choice: Option<EventId>,
    done: bool,
}

impl Draw {
    #[must_use]
    pub fn new(character: CharacterId, deck: DeckId, count: u32) -> Self {
        Self {
            character,
            deck,
            count,
            keep: 1,
            drawn: None,
            choice: None,
            done: false,
        }
    }

    #[must_use]
    pub fn keeping(mut self, keep: u32) -> Self {
        self.keep = keep;
        self
    }

    #[must_use]
    pub fn drawn(&self) -> Option<&[String]> {
        self.drawn.as_deref()
    }

    #[must_use]
    pub fn choice(&self) -> Option<EventId> {
        self.choice
    }
}

impl Resolve for Draw {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        if self.choice.is_some() {
            self.done = true;
            return Ok(true);
        }

        let mut drawn = Vec::new();
        while drawn.len() < self.count as usize {
            match state.decks_mut().draw(self.deck) {
                Some(card) => drawn.push(card),
                None => break,
            }
        }
        self.drawn = Some(drawn.clone());

        if drawn.len() <= self.keep as usize {
            keep_cards(state, self.character, self.deck, drawn)?;
            self.done = true;
            return Ok(true);
        }
        let choice = KeepDrawn::new(self.character, self.deck, drawn, self.keep);
        self.choice = Some(state.push_event(choice));
        Ok(false)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match &self.drawn {
            Some(cards) if cards.is_empty() => format!("{name} draws nothing, the {} deck is empty", self.deck),
            Some(cards) => format!("{name} draws {}", cards.join(", ")),
            None => format!("{name} draws {} {} cards", self.count, self.deck),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "drawn" => self.drawn.as_ref().map(|cards| cards.len() as f64),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Pick which drawn cards to keep. Rejected cards go to the bottom of the
/// deck in the order they were drawn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeepDrawn {
    character: CharacterId,
    deck: DeckId,
    candidates: Vec<String>,
    keep: u32,
    pub(crate) kept: Vec<usize>,
    done: bool,
}

impl KeepDrawn {
    #[must_use]
    pub fn new(character: CharacterId, deck: DeckId, candidates: Vec<String>, keep: u32) -> Self {
        Self {
            character,
            deck,
            candidates,
            keep,
            kept: Vec::new(),
            done: false,
        }
    }

    fn wanted(&self) -> usize {
        (self.keep as usize).min(self.candidates.len())
    }

    /// Candidates not yet kept, with their index.
    pub(crate) fn remaining(&self) -> impl Iterator<Item = (usize, &String)> {
        self.candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.kept.contains(i))
    }
}

impl Resolve for KeepDrawn {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let kept = self.kept.iter().filter_map(|&i| self.candidates.get(i).cloned());
        keep_cards(state, self.character, self.deck, kept)?;
        for (_, card) in self.remaining() {
            state.decks_mut().add(self.deck, card.clone(), DeckPosition::Bottom);
        }
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        if self.done {
            let kept: Vec<&str> = self
                .kept
                .iter()
                .filter_map(|&i| self.candidates.get(i).map(String::as_str))
                .collect();
            format!("{name} keeps {}", kept.join(", "))
        } else {
            format!("{name} chooses {} of {}", self.wanted(), self.candidates.join(", "))
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn input(&self) -> Option<InputRequest> {
        (self.kept.len() < self.wanted()).then_some(InputRequest::Choice)
    }
}

/// Take a named card out of a deck. A missing card is a normal outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DrawSpecific {
    character: CharacterId,
    deck: DeckId,
    name: String,
    found: Option<bool>,
}

impl DrawSpecific {
    #[must_use]
    pub fn new(character: CharacterId, deck: DeckId, name: impl Into<String>) -> Self {
        Self {
            character,
            deck,
            name: name.into(),
            found: None,
        }
    }
}

impl Resolve for DrawSpecific {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let card = state.decks_mut().remove_named(self.deck, &self.name);
        self.found = Some(card.is_some());
        if let Some(card) = card {
            keep_cards(state, self.character, self.deck, [card])?;
        }
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.found.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match self.found {
            Some(false) => format!("{name} finds no {} in the {} deck", self.name, self.deck),
            _ => format!("{name} takes {} from the {} deck", self.name, self.deck),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "found" => self.found.map(|f| f64::from(u8::from(f))),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}

/// Draw a random monster from the cup onto a place. An empty cup spawns
/// nothing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonsterSpawn {
    place: PlaceId,
    spawned: Option<Option<MonsterId>>,
}

impl MonsterSpawn {
    #[must_use]
    pub fn new(place: PlaceId) -> Self {
        Self { place, spawned: None }
    }
}

impl Resolve for MonsterSpawn {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        state.place(self.place)?;
        let cup = state.monsters_in_cup();
        let spawned = if cup.is_empty() {
            None
        } else {
            let pick = cup[state.rng_mut().gen_range_usize(0..cup.len())];
            state.monster_mut(pick)?.location = MonsterLocation::At(self.place);
            Some(pick)
        };
        self.spawned = Some(spawned);
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.spawned.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let place = state
            .place(self.place)
            .map_or_else(|_| self.place.to_string(), |p| p.name.clone());
        match self.spawned {
            Some(Some(monster)) => {
                let name = state
                    .monster(monster)
                    .map_or_else(|_| monster.to_string(), |m| m.name.clone());
                format!("{name} appears at {place}")
            }
            Some(None) => format!("The cup is empty, nothing appears at {place}"),
            None => format!("A monster appears at {place}"),
        }
    }

    fn monster(&self) -> Option<MonsterId> {
        self.spawned.flatten()
    }
}

/// Send a monster back to the cup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReturnToCup {
    monster: MonsterId,
    done: bool,
}

impl ReturnToCup {
    #[must_use]
    pub fn new(monster: MonsterId) -> Self {
        Self {
            monster,
            done: false,
        }
    }
}

impl Resolve for ReturnToCup {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        state.monster_mut(self.monster)?.location = MonsterLocation::Cup;
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = state
            .monster(self.monster)
            .map_or_else(|_| self.monster.to_string(), |m| m.name.clone());
        format!("{name} returns to the cup")
    }

    fn monster(&self) -> Option<MonsterId> {
        Some(self.monster)
    }
}
