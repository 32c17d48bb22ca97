//! The audit log tree.
//!
//! Every frame opens one entry. Entries nest under the nearest open entry
//! that is not flattened, so a `Sequence`'s steps read as siblings of the
//! sequence itself. Flattened entries are kept for bookkeeping but not
//! rendered.

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, LogId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub parent: Option<LogId>,
    pub children: Vec<LogId>,
    pub flatten: bool,
}

/// One rendered line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub depth: usize,
    pub text: String,
}

/// Append-only log tree.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    roots: Vec<LogId>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, parent: Option<LogId>, text: String, flatten: bool) -> Result<LogId, EngineError> {
        let id = LogId::from_index(self.entries.len()).ok_or(EngineError::Full { kind: "log entry" })?;
        self.entries.push(LogEntry {
            text,
            parent,
            children: Vec::new(),
            flatten,
        });
        match parent.and_then(|p| self.entries.get_mut(p.index())) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Rewrite an entry once its event has resolved.
    pub fn set_text(&mut self, id: LogId, text: String) {
        if let Some(entry) = self.entries.get_mut(id.index()) {
            entry.text = text;
        }
    }

    #[must_use]
    pub fn get(&self, id: LogId) -> Option<&LogEntry> {
        self.entries.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Depth-first rendering, flattened entries omitted.
    #[must_use]
    pub fn lines(&self) -> Vec<LogLine> {
        let mut lines = Vec::new();
        let mut pending: Vec<(LogId, usize)> = self.roots.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, depth)) = pending.pop() {
            let Some(entry) = self.get(id) else { continue };
            let child_depth = if entry.flatten {
                depth
            } else {
                lines.push(LogLine {
                    depth,
                    text: entry.text.clone(),
                });
                depth + 1
            };
            pending.extend(entry.children.iter().rev().map(|&c| (c, child_depth)));
        }
        lines
    }
}
