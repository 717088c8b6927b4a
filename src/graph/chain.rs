use serde::{Deserialize, Serialize};

/// One forward hop taken since the last return to root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub element_id: String,
    pub element_name: String,
    pub from_state_id: String,
    pub to_state_id: String,
}

/// Stack of forward hops, consumed by reverse-navigation backtracking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationChain {
    entries: Vec<ChainEntry>,
}

impl NavigationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ChainEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<ChainEntry> {
        self.entries.pop()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChainEntry> {
        self.entries.last()
    }

    /// Drop every entry above the most recent hop that left `state_id`,
    /// keeping the chain consistent after jumping back to that state.
    pub fn truncate_to(&mut self, state_id: &str) {
        match self.entries.iter().rposition(|e| e.from_state_id == state_id) {
            Some(index) => self.entries.truncate(index),
            None => self.entries.clear(),
        }
    }
}
