//! Events that wait for a player.
//!
//! Commands fill in the answer (`chosen`, `finished`); the scheduler only
//! resolves these events once the answer is there.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{who, InputRequest, Resolve, Resource};
use crate::core::{CharacterId, EngineError, GameState};

/// One option of a multiple choice, with what it costs to pick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub cost: BTreeMap<Resource, i32>,
}

impl ChoiceOption {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cost: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn costing(mut self, resource: Resource, amount: i32) -> Self {
        self.cost.insert(resource, amount);
        self
    }
}

/// Pick one option. Costs are paid up front with `Spend` commands; the
/// spent amounts must match the picked option exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MultipleChoice {
    character: CharacterId,
    prompt: String,
    options: Vec<ChoiceOption>,
    pub(crate) spent: BTreeMap<Resource, i32>,
    pub(crate) chosen: Option<usize>,
    done: bool,
}

impl MultipleChoice {
    #[must_use]
    pub fn new<S: Into<String>>(
        character: CharacterId,
        prompt: impl Into<String>,
        labels: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::with_options(
            character,
            prompt,
            labels.into_iter().map(ChoiceOption::new).collect(),
        )
    }

    #[must_use]
    pub fn with_options(
        character: CharacterId,
        prompt: impl Into<String>,
        options: Vec<ChoiceOption>,
    ) -> Self {
        Self {
            character,
            prompt: prompt.into(),
            options,
            spent: BTreeMap::new(),
            chosen: None,
            done: false,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    #[must_use]
    pub fn spent(&self) -> &BTreeMap<Resource, i32> {
        &self.spent
    }

    #[must_use]
    pub fn chosen(&self) -> Option<&str> {
        self.chosen
            .and_then(|i| self.options.get(i))
            .map(|option| option.label.as_str())
    }

    pub(crate) fn position(&self, label: &str) -> Option<usize> {
        self.options.iter().position(|option| option.label == label)
    }

    /// Whether any option costs `resource`.
    pub(crate) fn uses(&self, resource: Resource) -> bool {
        self.options
            .iter()
            .any(|option| option.cost.get(&resource).is_some_and(|&n| n > 0))
    }

    /// Spent amounts match `option`'s cost exactly.
    pub(crate) fn paid_for(&self, option: usize) -> bool {
        let Some(option) = self.options.get(option) else {
            return false;
        };
        let spent: BTreeMap<Resource, i32> =
            self.spent.iter().filter(|(_, &n)| n != 0).map(|(r, n)| (*r, *n)).collect();
        let cost: BTreeMap<Resource, i32> =
            option.cost.iter().filter(|(_, &n)| n != 0).map(|(r, n)| (*r, *n)).collect();
        spent == cost
    }
}

impl Resolve for MultipleChoice {
    fn resolve(&mut self, _state: &mut GameState) -> Result<bool, EngineError> {
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        let name = who(state, Some(self.character));
        match self.chosen() {
            Some(label) => format!("{name} chooses {label}"),
            None => format!("{name}: {}", self.prompt),
        }
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "choice_index" => self.chosen.map(|i| i as f64),
            _ => None,
        }
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn input(&self) -> Option<InputRequest> {
        self.chosen.is_none().then_some(InputRequest::Choice)
    }
}

/// Let a character move sliders. `free` is for setup; in upkeep every notch
/// costs one focus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SliderInput {
    character: CharacterId,
    free: bool,
    pub(crate) finished: bool,
    done: bool,
}

impl SliderInput {
    #[must_use]
    pub fn new(character: CharacterId, free: bool) -> Self {
        Self {
            character,
            free,
            finished: false,
            done: false,
        }
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.free
    }
}

impl Resolve for SliderInput {
    fn resolve(&mut self, _state: &mut GameState) -> Result<bool, EngineError> {
        self.done = true;
        Ok(true)
    }

    fn is_resolved(&self) -> bool {
        self.done
    }

    fn log(&self, state: &GameState) -> String {
        format!("{} sets sliders", who(state, Some(self.character)))
    }

    fn character(&self) -> Option<CharacterId> {
        Some(self.character)
    }

    fn input(&self) -> Option<InputRequest> {
        (!self.finished).then_some(InputRequest::Sliders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_for_requires_exact_spend() {
        let mut choice = MultipleChoice::with_options(
            CharacterId::new(0),
            "Buy the tome?",
            vec![
                ChoiceOption::new("Buy").costing(Resource::Dollars, 3),
                ChoiceOption::new("Leave"),
            ],
        );
        assert!(choice.uses(Resource::Dollars));
        assert!(!choice.uses(Resource::Clues));
        assert!(!choice.paid_for(0));
        assert!(choice.paid_for(1));

        choice.spent.insert(Resource::Dollars, 3);
        assert!(choice.paid_for(0));
        assert!(!choice.paid_for(1));
        assert!(!choice.paid_for(5));
    }
}
