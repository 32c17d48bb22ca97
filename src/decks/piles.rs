//! Named draw piles.
//!
//! Every deck is an ordered queue of card names held in a persistent
//! `im::Vector`, so cloning the whole game state stays cheap. The front of
//! the vector is the top of the deck.
//!
//! ## Usage
//!
//! ```
//! use eldritch::decks::{DeckId, Decks, DeckPosition};
//!
//! let mut decks = Decks::new();
//! decks.add(DeckId::Common, "Revolver", DeckPosition::Bottom);
//! decks.add(DeckId::Common, "Food", DeckPosition::Bottom);
//!
//! assert_eq!(decks.draw(DeckId::Common).as_deref(), Some("Revolver"));
//! assert_eq!(decks.len(DeckId::Common), 1);
//! ```

use std::collections::BTreeMap;

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::GameRng;
use crate::entities::PossessionKind;

/// The game's decks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeckId {
    Common,
    Unique,
    Spells,
    Skills,
    Allies,
    Gates,
    Mythos,
    GateCards,
}

impl DeckId {
    pub const ALL: [DeckId; 8] = [
        DeckId::Common,
        DeckId::Unique,
        DeckId::Spells,
        DeckId::Skills,
        DeckId::Allies,
        DeckId::Gates,
        DeckId::Mythos,
        DeckId::GateCards,
    ];

    /// Possession kind for cards kept from this deck, if they become
    /// possessions at all.
    #[must_use]
    pub fn possession_kind(self) -> Option<PossessionKind> {
        match self {
            DeckId::Common => Some(PossessionKind::Common),
            DeckId::Unique => Some(PossessionKind::Unique),
            DeckId::Spells => Some(PossessionKind::Spell),
            DeckId::Skills => Some(PossessionKind::Skill),
            DeckId::Allies => Some(PossessionKind::Ally),
            DeckId::Gates | DeckId::Mythos | DeckId::GateCards => None,
        }
    }

    /// Deck a possession of `kind` is discarded to.
    #[must_use]
    pub fn for_possession(kind: PossessionKind) -> Option<DeckId> {
        match kind {
            PossessionKind::Common => Some(DeckId::Common),
            PossessionKind::Unique => Some(DeckId::Unique),
            PossessionKind::Spell => Some(DeckId::Spells),
            PossessionKind::Skill => Some(DeckId::Skills),
            PossessionKind::Ally => Some(DeckId::Allies),
            PossessionKind::Ability => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DeckId::Common => "common",
            DeckId::Unique => "unique",
            DeckId::Spells => "spells",
            DeckId::Skills => "skills",
            DeckId::Allies => "allies",
            DeckId::Gates => "gates",
            DeckId::Mythos => "mythos",
            DeckId::GateCards => "gate_cards",
        }
    }
}

impl std::fmt::Display for DeckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where to put a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckPosition {
    Top,
    Bottom,
}

/// All draw piles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decks {
    piles: BTreeMap<DeckId, Vector<String>>,
}

impl Decks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card to a deck.
    pub fn add(&mut self, deck: DeckId, card: impl Into<String>, position: DeckPosition) {
        let pile = self.piles.entry(deck).or_default();
        match position {
            DeckPosition::Top => pile.push_front(card.into()),
            DeckPosition::Bottom => pile.push_back(card.into()),
        }
    }

    /// Replace a deck's contents, top first.
    pub fn fill<I, S>(&mut self, deck: DeckId, cards: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.piles
            .insert(deck, cards.into_iter().map(Into::into).collect());
    }

    /// Remove and return the top card.
    pub fn draw(&mut self, deck: DeckId) -> Option<String> {
        self.piles.get_mut(&deck)?.pop_front()
    }

    /// Remove the first card named `name`, searching from the top.
    pub fn remove_named(&mut self, deck: DeckId, name: &str) -> Option<String> {
        let pile = self.piles.get_mut(&deck)?;
        let index = pile.iter().position(|card| card == name)?;
        Some(pile.remove(index))
    }

    #[must_use]
    pub fn top(&self, deck: DeckId) -> Option<&String> {
        self.piles.get(&deck)?.front()
    }

    #[must_use]
    pub fn len(&self, deck: DeckId) -> usize {
        self.piles.get(&deck).map_or(0, Vector::len)
    }

    #[must_use]
    pub fn is_empty(&self, deck: DeckId) -> bool {
        self.len(deck) == 0
    }

    /// Cards top first.
    pub fn cards(&self, deck: DeckId) -> impl Iterator<Item = &String> {
        self.piles.get(&deck).into_iter().flat_map(|pile| pile.iter())
    }

    /// Shuffle one deck in place.
    pub fn shuffle(&mut self, deck: DeckId, rng: &mut GameRng) {
        if let Some(pile) = self.piles.get_mut(&deck) {
            let mut cards: Vec<String> = pile.iter().cloned().collect();
            rng.shuffle(&mut cards);
            *pile = cards.into_iter().collect();
        }
    }
}
