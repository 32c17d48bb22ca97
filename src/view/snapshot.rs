//! Per-viewer projection of the game state.
//!
//! Everything on the table is public except the contents of other
//! characters' possessions, which only their owner sees.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{CharacterId, EngineError, GameState};
use crate::entities::{CheckType, Character, PossessionKind};
use crate::events::{EventKind, Resource};
use crate::rules::{GameStage, TurnPhase};
use crate::stack::{LogLine, Suspension, Timing};

const STATS: [CheckType; 6] = [
    CheckType::Speed,
    CheckType::Sneak,
    CheckType::Fight,
    CheckType::Will,
    CheckType::Lore,
    CheckType::Luck,
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub viewer: Option<CharacterId>,
    pub stage: GameStage,
    pub turn: u32,
    pub phase: TurnPhase,
    pub first_player: CharacterId,
    pub current: CharacterId,
    pub characters: Vec<CharacterView>,
    pub pending: Option<PendingView>,
    pub dice: Option<DiceView>,
    /// Optional responses on offer to the viewer.
    pub usables: Vec<String>,
    pub log: Vec<LogLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CharacterView {
    pub seat: CharacterId,
    pub name: String,
    pub place: Option<String>,
    pub stamina: i32,
    pub max_stamina: i32,
    pub sanity: i32,
    pub max_sanity: i32,
    pub dollars: i32,
    pub clues: i32,
    pub focus_points: u8,
    pub movement_points: i32,
    pub sliders: [u8; 3],
    /// Skill values after modifiers, keyed by skill name.
    pub stats: BTreeMap<String, i32>,
    pub statuses: Vec<String>,
    pub trophies: usize,
    pub possession_count: usize,
    /// Only filled for the viewer's own seat.
    pub possessions: Option<Vec<PossessionView>>,
    pub gone: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossessionView {
    pub name: String,
    pub kind: PossessionKind,
    pub exhausted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OptionView {
    pub label: String,
    pub cost: BTreeMap<Resource, i32>,
}

/// What the game is waiting for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PendingView {
    Choice {
        character: Option<CharacterId>,
        prompt: String,
        options: Vec<OptionView>,
        spent: BTreeMap<Resource, i32>,
    },
    KeepCards {
        character: Option<CharacterId>,
        candidates: Vec<String>,
    },
    Movement {
        character: Option<CharacterId>,
        movement_points: i32,
    },
    DiceRoll {
        character: Option<CharacterId>,
    },
    Sliders {
        character: Option<CharacterId>,
        free: bool,
    },
    Usable {
        timing: Timing,
        characters: Vec<CharacterId>,
    },
    Replacement {
        characters: Vec<CharacterId>,
        available: Vec<String>,
    },
    GameOver(GameStage),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceView {
    pub character: Option<CharacterId>,
    /// `None` until the dice are thrown.
    pub rolls: Option<Vec<u8>>,
}

fn statuses(c: &Character, turn: u32) -> Vec<String> {
    let mut statuses = Vec::new();
    if c.retainer {
        statuses.push("retainer".to_string());
    }
    if c.lodge_membership {
        statuses.push("lodge membership".to_string());
    }
    if c.delayed {
        statuses.push("delayed".to_string());
    }
    if c.arrested_until.is_some_and(|until| turn <= until) {
        statuses.push("arrested".to_string());
    }
    if c.lose_turn_until.is_some_and(|until| turn <= until) {
        statuses.push("lose turn".to_string());
    }
    match c.bless_curse {
        b if b > 0 => statuses.push("blessed".to_string()),
        b if b < 0 => statuses.push("cursed".to_string()),
        _ => {}
    }
    if c.devoured {
        statuses.push("devoured".to_string());
    }
    statuses
}

impl GameState {
    /// Render the state as `viewer` is allowed to see it. `None` views as a
    /// spectator.
    pub fn snapshot(&self, viewer: Option<CharacterId>) -> Result<Snapshot, EngineError> {
        let characters = self
            .character_ids()
            .map(|seat| self.character_view(seat, viewer == Some(seat)))
            .collect::<Result<Vec<_>, _>>()?;

        let pending = self.pending()?;
        // Offers stay open while a choice waits for its owner.
        let window = match &pending {
            Some(Suspension::Usable { event, timing, .. }) => Some((*event, *timing)),
            Some(Suspension::Choice { event, .. }) => Some((*event, Timing::Before)),
            _ => None,
        };
        let usables = match (window, viewer) {
            (Some((event, timing)), Some(viewer)) => self
                .usables_for(event, self.event(event)?, timing)
                .into_iter()
                .filter(|u| u.character == viewer)
                .map(|u| u.event.log(self))
                .collect(),
            _ => Vec::new(),
        };
        let pending = match pending {
            Some(suspension) => self.pending_view(suspension)?,
            None => None,
        };

        let turn = self.turn();
        Ok(Snapshot {
            viewer,
            stage: self.stage(),
            turn: turn.number,
            phase: turn.phase,
            first_player: turn.first_player,
            current: turn.current,
            characters,
            pending,
            dice: self.dice_view(),
            usables,
            log: self.log().lines(),
        })
    }

    fn character_view(&self, seat: CharacterId, private: bool) -> Result<CharacterView, EngineError> {
        let c = self.character(seat)?;
        let place = match c.place {
            Some(place) => Some(self.place(place)?.name.clone()),
            None => None,
        };
        let mut stats = BTreeMap::new();
        for check in STATS {
            stats.insert(check.name().to_string(), self.stat(seat, check)?);
        }
        let possessions = private.then(|| {
            c.possessions
                .iter()
                .map(|p| PossessionView {
                    name: p.name.clone(),
                    kind: p.kind,
                    exhausted: p.exhausted,
                })
                .collect()
        });
        Ok(CharacterView {
            seat,
            name: c.name.clone(),
            place,
            stamina: c.stamina,
            max_stamina: self.max_stamina(seat)?,
            sanity: c.sanity,
            max_sanity: self.max_sanity(seat)?,
            dollars: c.dollars,
            clues: c.clues,
            focus_points: c.focus_points,
            movement_points: c.movement_points,
            sliders: c.sliders,
            stats,
            statuses: statuses(c, self.turn_number()),
            trophies: c.trophies.len(),
            possession_count: c.possessions.len(),
            possessions,
            gone: c.gone,
        })
    }

    fn pending_view(&self, suspension: Suspension) -> Result<Option<PendingView>, EngineError> {
        Ok(Some(match suspension {
            Suspension::Choice { event, character } => match &self.event(event)?.kind {
                EventKind::MultipleChoice(choice) => PendingView::Choice {
                    character,
                    prompt: choice.prompt().to_string(),
                    options: choice
                        .options()
                        .iter()
                        .map(|o| OptionView {
                            label: o.label.clone(),
                            cost: o.cost.clone(),
                        })
                        .collect(),
                    spent: choice.spent().clone(),
                },
                EventKind::KeepDrawn(keep) => PendingView::KeepCards {
                    character,
                    candidates: keep.remaining().map(|(_, card)| card.clone()).collect(),
                },
                EventKind::CityMovement(_) => PendingView::Movement {
                    character,
                    movement_points: match character {
                        Some(c) => self.resource(c, Resource::MovementPoints)?,
                        None => 0,
                    },
                },
                _ => return Ok(None),
            },
            Suspension::DiceRoll { character, .. } => PendingView::DiceRoll { character },
            Suspension::Sliders { event, character } => PendingView::Sliders {
                character,
                free: matches!(&self.event(event)?.kind, EventKind::SliderInput(input) if input.is_free()),
            },
            Suspension::Usable { timing, characters, .. } => PendingView::Usable { timing, characters },
            Suspension::Replacement { characters } => PendingView::Replacement {
                characters,
                available: self.templates().iter().map(|t| t.name.clone()).collect(),
            },
            Suspension::GameOver(stage) => PendingView::GameOver(stage),
            Suspension::Idle => return Ok(None),
        }))
    }

    /// The innermost dice roll on the stack.
    fn dice_view(&self) -> Option<DiceView> {
        self.stack().events().iter().rev().find_map(|&id| {
            let event = self.event(id).ok()?;
            match &event.kind {
                EventKind::DiceRoll(roll) => Some(DiceView {
                    character: event.character(),
                    rolls: roll.rolls().map(<[u8]>::to_vec),
                }),
                _ => None,
            }
        })
    }
}
