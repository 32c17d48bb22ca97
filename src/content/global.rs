//! Global effects: the ancient one, the environment, rumors and headlines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A mounted global effect.
///
/// Behaviour is looked up in the registry by `name`. Persistent progress
/// (doom tokens, rumor counters) lives in `counters` and changes only
/// through `CounterChange` events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalEffect {
    pub name: String,
    pub counters: BTreeMap<String, i64>,
}

impl GlobalEffect {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_counter(mut self, counter: impl Into<String>, value: i64) -> Self {
        self.counters.insert(counter.into(), value);
        self
    }

    #[must_use]
    pub fn counter(&self, counter: &str) -> Option<i64> {
        self.counters.get(counter).copied()
    }

    pub fn set_counter(&mut self, counter: String, value: i64) {
        self.counters.insert(counter, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut ancient = GlobalEffect::new("Azathoth").with_counter("max_doom", 14);
        assert_eq!(ancient.counter("max_doom"), Some(14));
        assert_eq!(ancient.counter("doom"), None);

        ancient.set_counter("doom".to_string(), 3);
        assert_eq!(ancient.counter("doom"), Some(3));
    }
}
