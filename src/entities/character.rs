//! Investigators.
//!
//! A [`Character`] is created from a [`CharacterTemplate`] at setup and is
//! only ever mutated by events. Skill stats come in three slider pairs: moving
//! a slider one notch raises one stat of the pair and lowers the other.

use serde::{Deserialize, Serialize};

use super::possession::Possession;
use crate::core::{MonsterId, PlaceId};

/// The six printed skills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    Speed,
    Sneak,
    Fight,
    Will,
    Lore,
    Luck,
}

impl Stat {
    /// Slider pair and whether this is the first (rising) stat of the pair.
    #[must_use]
    pub fn slider(self) -> (SliderPair, bool) {
        match self {
            Stat::Speed => (SliderPair::SpeedSneak, true),
            Stat::Sneak => (SliderPair::SpeedSneak, false),
            Stat::Fight => (SliderPair::FightWill, true),
            Stat::Will => (SliderPair::FightWill, false),
            Stat::Lore => (SliderPair::LoreLuck, true),
            Stat::Luck => (SliderPair::LoreLuck, false),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Stat::Speed => "speed",
            Stat::Sneak => "sneak",
            Stat::Fight => "fight",
            Stat::Will => "will",
            Stat::Lore => "lore",
            Stat::Luck => "luck",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "speed" => Stat::Speed,
            "sneak" => Stat::Sneak,
            "fight" => Stat::Fight,
            "will" => Stat::Will,
            "lore" => Stat::Lore,
            "luck" => Stat::Luck,
            _ => return None,
        })
    }
}

/// Every kind of skill check. Composite checks roll on a base skill but
/// collect their own modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckType {
    Speed,
    Sneak,
    Fight,
    Will,
    Lore,
    Luck,
    Evade,
    Combat,
    Horror,
    Spell,
}

impl CheckType {
    /// The skill this check rolls on.
    #[must_use]
    pub fn base_stat(self) -> Stat {
        match self {
            CheckType::Speed => Stat::Speed,
            CheckType::Sneak | CheckType::Evade => Stat::Sneak,
            CheckType::Fight | CheckType::Combat => Stat::Fight,
            CheckType::Will | CheckType::Horror => Stat::Will,
            CheckType::Lore | CheckType::Spell => Stat::Lore,
            CheckType::Luck => Stat::Luck,
        }
    }

    /// Composite checks have their own name for modifiers and overrides.
    #[must_use]
    pub fn composite(self) -> Option<&'static str> {
        match self {
            CheckType::Evade => Some("evade"),
            CheckType::Combat => Some("combat"),
            CheckType::Horror => Some("horror"),
            CheckType::Spell => Some("spell"),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.composite().unwrap_or_else(|| self.base_stat().name())
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "evade" => CheckType::Evade,
            "combat" => CheckType::Combat,
            "horror" => CheckType::Horror,
            "spell" => CheckType::Spell,
            other => match Stat::from_name(other)? {
                Stat::Speed => CheckType::Speed,
                Stat::Sneak => CheckType::Sneak,
                Stat::Fight => CheckType::Fight,
                Stat::Will => CheckType::Will,
                Stat::Lore => CheckType::Lore,
                Stat::Luck => CheckType::Luck,
            },
        })
    }
}

/// One of the three slider tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SliderPair {
    SpeedSneak,
    FightWill,
    LoreLuck,
}

impl SliderPair {
    pub const ALL: [SliderPair; 3] = [SliderPair::SpeedSneak, SliderPair::FightWill, SliderPair::LoreLuck];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            SliderPair::SpeedSneak => 0,
            SliderPair::FightWill => 1,
            SliderPair::LoreLuck => 2,
        }
    }
}

/// Printed values at slider position 0. Each notch adds one to `first` and
/// takes one from `second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderBase {
    pub first: i32,
    pub second: i32,
}

impl SliderBase {
    #[must_use]
    pub const fn new(first: i32, second: i32) -> Self {
        Self { first, second }
    }
}

/// Printed character sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterTemplate {
    pub name: String,
    /// Name of the starting place.
    pub home: String,
    pub max_stamina: i32,
    pub max_sanity: i32,
    pub focus: u8,
    pub dollars: i32,
    pub clues: i32,
    pub sliders: [SliderBase; 3],
    /// Possessions every copy of this character starts with.
    pub fixed_possessions: Vec<Possession>,
}

impl CharacterTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>, home: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            home: home.into(),
            max_stamina: 5,
            max_sanity: 5,
            focus: 2,
            dollars: 0,
            clues: 0,
            sliders: [SliderBase::new(1, 4), SliderBase::new(1, 4), SliderBase::new(1, 4)],
            fixed_possessions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_health(mut self, stamina: i32, sanity: i32) -> Self {
        self.max_stamina = stamina;
        self.max_sanity = sanity;
        self
    }

    #[must_use]
    pub fn with_focus(mut self, focus: u8) -> Self {
        self.focus = focus;
        self
    }

    #[must_use]
    pub fn with_money(mut self, dollars: i32, clues: i32) -> Self {
        self.dollars = dollars;
        self.clues = clues;
        self
    }

    #[must_use]
    pub fn with_slider(mut self, pair: SliderPair, first: i32, second: i32) -> Self {
        self.sliders[pair.index()] = SliderBase::new(first, second);
        self
    }

    #[must_use]
    pub fn with_possession(mut self, possession: Possession) -> Self {
        self.fixed_possessions.push(possession);
        self
    }
}

/// What a character has collected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trophy {
    Monster(MonsterId),
    Gate(String),
}

/// A seated investigator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub place: Option<PlaceId>,

    pub stamina: i32,
    pub sanity: i32,
    pub dollars: i32,
    pub clues: i32,
    pub movement_points: i32,
    pub(crate) base_max_stamina: i32,
    pub(crate) base_max_sanity: i32,

    pub focus: u8,
    /// Focus left to spend on slider moves this upkeep.
    pub focus_points: u8,
    pub sliders: [u8; 3],
    pub(crate) slider_bases: [SliderBase; 3],

    pub possessions: Vec<Possession>,
    pub trophies: Vec<Trophy>,

    pub retainer: bool,
    pub lodge_membership: bool,
    pub delayed: bool,
    /// Turn number through which the character sits in jail.
    pub arrested_until: Option<u32>,
    /// Turn number through which the character loses their turn.
    pub lose_turn_until: Option<u32>,
    /// +1 blessed, -1 cursed.
    pub bless_curse: i8,

    pub gone: bool,
    pub devoured: bool,
}

impl Character {
    /// Seat a fresh copy of `template`.
    #[must_use]
    pub fn from_template(template: &CharacterTemplate, place: Option<PlaceId>) -> Self {
        Self {
            name: template.name.clone(),
            place,
            stamina: template.max_stamina,
            sanity: template.max_sanity,
            dollars: template.dollars,
            clues: template.clues,
            movement_points: 0,
            base_max_stamina: template.max_stamina,
            base_max_sanity: template.max_sanity,
            focus: template.focus,
            focus_points: template.focus,
            sliders: [0; 3],
            slider_bases: template.sliders,
            possessions: template.fixed_possessions.clone(),
            trophies: Vec::new(),
            retainer: false,
            lodge_membership: false,
            delayed: false,
            arrested_until: None,
            lose_turn_until: None,
            bless_curse: 0,
            gone: false,
            devoured: false,
        }
    }

    /// Printed value of `stat` at the current slider position.
    #[must_use]
    pub fn base_stat(&self, stat: Stat) -> i32 {
        let (pair, first) = stat.slider();
        let base = self.slider_bases[pair.index()];
        let position = i32::from(self.sliders[pair.index()]);
        if first {
            base.first + position
        } else {
            base.second - position
        }
    }

    #[must_use]
    pub fn slider(&self, pair: SliderPair) -> u8 {
        self.sliders[pair.index()]
    }

    /// Whether a lost turn or jail time covers `turn`.
    #[must_use]
    pub fn loses_turn(&self, turn: u32) -> bool {
        self.lose_turn_until.is_some_and(|until| turn <= until)
            || self.arrested_until.is_some_and(|until| turn <= until)
    }

    /// Still taking part in the game.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.gone
    }
}
