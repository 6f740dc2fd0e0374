//! Bounded linear undo history with provenance tags.
//!
//! Entries are stored most-recent-first. `cursor` points at the entry the
//! buffer currently shows; undo moves it towards older entries, and any new
//! edit abandons the entries in front of the cursor. Undo never crosses the
//! point where such a branch was abandoned.

use serde::{Deserialize, Serialize};

pub const DEFAULT_INPUT_HISTORY_CAPACITY: usize = 250;

/// Which input channel produced an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    Typed,
    Backspace,
    Delete,
    SuggestedWord,
    /// Index of the accepted sentence chip.
    SuggestedSentence(usize),
    /// Index of the reused history sentence.
    HistorySentence(usize),
    Snackbar,
}

impl InputSource {
    pub fn is_suggestion(self) -> bool {
        matches!(self, Self::SuggestedWord | Self::SuggestedSentence(_))
    }

    pub fn is_local_history(self) -> bool {
        matches!(self, Self::HistorySentence(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub value: String,
    pub sources: Vec<InputSource>,
}

impl HistoryEntry {
    pub fn new(value: impl Into<String>, sources: Vec<InputSource>) -> Self {
        Self {
            value: value.into(),
            sources,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputHistory {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    /// Entries reachable by undo, counted from the front.
    branch_len: usize,
    capacity: usize,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_HISTORY_CAPACITY)
    }
}

impl InputHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            branch_len: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn add(&mut self, entry: HistoryEntry) {
        if self.cursor > 0 {
            self.entries.drain(..self.cursor);
            self.branch_len = 0;
        }
        self.entries.insert(0, entry);
        self.cursor = 0;
        self.branch_len += 1;
        self.entries.truncate(self.capacity);
        self.branch_len = self.branch_len.min(self.entries.len());
    }

    pub fn undo(&mut self) {
        if self.can_undo() {
            self.cursor += 1;
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor + 1 < self.branch_len
    }

    /// Entry under the cursor; `None` before the first edit.
    pub fn last_input(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    /// True when the entry under the cursor came from a word or sentence chip.
    pub fn is_last_input_suggested(&self) -> bool {
        self.last_input()
            .is_some_and(|entry| entry.sources.iter().any(|source| source.is_suggestion()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}
