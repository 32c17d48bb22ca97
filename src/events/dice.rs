//! Dice, skill checks and prerequisites.

use serde::{Deserialize, Serialize};

use super::{who, EventRef, InputRequest, Resolve};
use crate::content::Subject;
use crate::core::{CharacterId, EngineError, EventId, GameState, Roll};
use crate::entities::CheckType;
use crate::values::{Comparison, Value};

/// Upper bound on a dice pool. Infinite modifiers clamp here.
pub const MAX_POOL: usize = 64;

fn pool_size(count: f64) -> usize {
    if count > 0.0 {
        count.min(MAX_POOL as f64).floor() as usize
    } else {
        0
    }
}

/// Roll `count` dice. A count of zero or less rolls nothing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiceRoll {
    character: Option<CharacterId>,
    count: Value,
    rolls: Option<Roll>,
    pub(crate) roll_requested: bool,
}

impl DiceRoll {
    #[must_use]
    pub fn new(character: Option<CharacterId>, count: impl Into<Value>) -> Self {
        Self {
            character,
            count: count.into(),
            rolls: None,
            roll_requested: false,
        }
    }

    #[must_use]
    pub fn rolls(&self) -> Option<&[u8]> {
        self.rolls.as_deref()
    }
}

impl Resolve for DiceRoll {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let count = pool_size(self.count.value(state)?);
        self.rolls = Some(state.rng_mut().roll_dice(count));
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.rolls.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, self.character);
        match &self.rolls {
            Some(rolls) => format!("{name} rolls {:?}", rolls.as_slice()),
            None => format!("{name} rolls {} dice", self.count.describe()),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        let rolls = self.rolls.as_ref()?;
        match name {
            "sum" => Some(rolls.iter().map(|&face| f64::from(face)).sum()),
            "count" => Some(rolls.len() as f64),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        self.character
    }

    fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        self.count.visit_refs(f);
    }

    fn input(&self) -> Option<InputRequest> {
        (!self.roll_requested).then_some(InputRequest::DiceRoll)
    }
}

/// Skill check: roll `stat + modifier` dice and count successes.
///
/// The dice sub-event is created once and remembered, so a check never
/// re-rolls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Check {
    character: CharacterId,
    check_type: CheckType,
    modifier: Value,
    dice: Option<EventId>,
    successes: Option<u32>,
}

impl Check {
    #[must_use]
    pub fn new(character: CharacterId, check_type: CheckType, modifier: impl Into<Value>) -> Self {
        Self {
            character,
            check_type,
            modifier: modifier.into(),
            dice: None,
            successes: None,
        }
    }

    #[must_use]
    pub fn check_type(&self) -> CheckType {
        self.check_type
    }

    #[must_use]
    pub fn successes(&self) -> Option<u32> {
        self.successes
    }

    #[must_use]
    pub fn dice(&self) -> Option<EventId> {
        self.dice
    }
}

impl Resolve for Check {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let Some(dice) = self.dice else {
            let stat = f64::from(state.stat(self.character, self.check_type)?);
            let pool = pool_size(stat + self.modifier.value(state)?);
            let roll = DiceRoll::new(Some(self.character), Value::Const(pool as f64));
            self.dice = Some(state.push_event(roll));
            return Ok(false);
        };

        let threshold = state.success_threshold(self.character)?;
        let double_sixes = state.override_for(
            Subject::Character(self.character),
            &format!("double_sixes_{}", self.check_type.name()),
        );
        let faces = state.event(dice)?.rolls().unwrap_or(&[]);
        let successes = faces
            .iter()
            .map(|&face| -> u32 {
                match face {
                    6 if double_sixes => 2,
                    f if f >= threshold => 1,
                    _ => 0,
                }
            })
            .sum::<u32>();
        self.successes = Some(successes);
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.successes.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match self.successes {
            Some(n) => format!("{name} gets {n} successes on a {} check", self.check_type.name()),
            None => format!(
                "{name} makes a {} check ({})",
                self.check_type.name(),
                self.modifier.describe()
            ),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "successes" => self.successes.map(f64::from),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn visit_refs(&mut self, f: &mut dyn FnMut(&mut EventRef)) {
        self.modifier.visit_refs(f);
    }
}

/// One-tick comparison of a character attribute against a threshold.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributePrerequisite {
    character: CharacterId,
    attribute: String,
    threshold: f64,
    op: Comparison,
    result: Option<bool>,
}

impl AttributePrerequisite {
    #[must_use]
    pub fn new(
        character: CharacterId,
        attribute: impl Into<String>,
        threshold: f64,
        op: Comparison,
    ) -> Self {
        Self {
            character,
            attribute: attribute.into(),
            threshold,
            op,
            result: None,
        }
    }
}

impl Resolve for AttributePrerequisite {
    fn resolve(&mut self, state: &mut GameState) -> Result<bool, EngineError> {
        let observed = state
            .character_attribute(self.character, &self.attribute)?
            .ok_or_else(|| EngineError::missing(self.character, &self.attribute))?;
        self.result = Some(self.op.holds(observed, self.threshold));
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.result.is_some()
    }

    fn log(&self, state: &GameState) -> String {
        let verdict = match self.result {
            Some(true) => "has",
            Some(false) => "does not have",
            None => "needs",
        };
        format!(
            "{} {verdict} {} {} {}",
            who(state, Some(self.character)),
            self.attribute,
            self.op.phrase(),
            self.threshold
        )
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "successes" | "result" => self.result.map(|r| f64::from(u8::from(r))),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }
}
