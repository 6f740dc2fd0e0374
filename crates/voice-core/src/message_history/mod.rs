//! Local phrase-reuse index over previously composed sentences.
//!
//! Every committed edit updates the entry for the sentence being composed.
//! `user_prefix` approximates how much of that sentence the user typed by
//! hand; searching matches the current tail against it (or against the
//! sentence itself) to offer a network-free completion.

mod persistence;


use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::input_history::InputSource;
use crate::language::LanguageProfile;
use crate::sentence::split_last_sentence;

pub const DEFAULT_MESSAGE_HISTORY_CAPACITY: usize = 1024;
pub const DEFAULT_CONTINUATION_WINDOW: usize = 10;
pub const DEFAULT_MIN_SEARCH_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHistoryEntry {
    pub sentence: String,
    pub user_prefix: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub capacity: usize,
    /// Max length difference for an edit to count as the same sentence.
    pub continuation_window: usize,
    /// Entries shorter than this are never offered by `search`.
    pub min_search_length: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MESSAGE_HISTORY_CAPACITY,
            continuation_window: DEFAULT_CONTINUATION_WINDOW,
            min_search_length: DEFAULT_MIN_SEARCH_LENGTH,
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Ordered oldest-first; the last entry is the most recent.
#[derive(Debug, Clone, Default)]
pub struct MessageHistory {
    entries: Vec<MessageHistoryEntry>,
    limits: HistoryLimits,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: HistoryLimits) -> Self {
        Self {
            entries: Vec::new(),
            limits,
        }
    }

    /// Build from stored entries, keeping the last occurrence of each sentence.
    pub fn from_entries(entries: Vec<MessageHistoryEntry>, limits: HistoryLimits) -> Self {
        let mut history = Self::with_limits(limits);
        for entry in entries {
            history.entries.retain(|e| e.sentence != entry.sentence);
            history.entries.push(entry);
        }
        history.evict();
        history
    }

    pub fn entries(&self) -> &[MessageHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Update the index after an edit produced `text`.
    pub fn record(
        &mut self,
        text: &str,
        sources: &[InputSource],
        profile: &LanguageProfile,
        now: u64,
    ) {
        let (_, sentence) = split_last_sentence(text);
        if sentence.is_empty() {
            return;
        }
        let prefix = profile.hand_typed_prefix(&sentence);

        let continues_top = self
            .entries
            .last()
            .is_some_and(|top| self.is_continuation(top, &sentence, sources));

        if continues_top {
            let last = self.entries.len() - 1;
            let top = &mut self.entries[last];
            top.user_prefix = longer(std::mem::take(&mut top.user_prefix), prefix);
            top.sentence = sentence;
            top.timestamp = now;
            self.dedup_top();
            tracing::debug!(sentence = %self.entries[self.entries.len() - 1].sentence, "history: continued");
        } else {
            let prefix = self.take_same_sentence(&sentence, prefix);
            tracing::debug!(sentence = %sentence, "history: new entry");
            self.entries.push(MessageHistoryEntry {
                sentence,
                user_prefix: prefix,
                timestamp: now,
            });
        }
        self.evict();
    }

    /// Most recent stored sentence completing the last sentence of `text`,
    /// prefixed with the preceding sentences of `text`.
    pub fn search(&self, text: &str) -> Option<String> {
        let (preceding, tail) = split_last_sentence(text);
        self.entries
            .iter()
            .rev()
            .find(|e| {
                e.sentence.chars().count() >= self.limits.min_search_length
                    && e.sentence != tail
                    && (e.user_prefix.starts_with(&tail) || e.sentence.starts_with(&tail))
            })
            .map(|e| format!("{}{}", preceding, e.sentence))
    }

    fn is_continuation(
        &self,
        top: &MessageHistoryEntry,
        sentence: &str,
        sources: &[InputSource],
    ) -> bool {
        if sources
            .iter()
            .any(|s| s.is_suggestion() || s.is_local_history())
        {
            return true;
        }
        let old = top.sentence.as_str();
        let old_len = old.chars().count();
        let new_len = sentence.chars().count();
        if old_len.abs_diff(new_len) > self.limits.continuation_window {
            return false;
        }
        old.starts_with(sentence)
            || sentence.starts_with(old)
            || old.ends_with(sentence)
            || sentence.ends_with(old)
    }

    /// Remove entries other than the top that share its sentence, folding
    /// their prefixes into it.
    fn dedup_top(&mut self) {
        let Some(top) = self.entries.pop() else {
            return;
        };
        let prefix = self.take_same_sentence(&top.sentence, top.user_prefix);
        self.entries.push(MessageHistoryEntry {
            user_prefix: prefix,
            ..top
        });
    }

    /// Remove every entry for `sentence`, returning the longest of their
    /// prefixes and `prefix`.
    fn take_same_sentence(&mut self, sentence: &str, prefix: String) -> String {
        let mut widest = prefix;
        self.entries.retain_mut(|e| {
            if e.sentence != sentence {
                return true;
            }
            widest = longer(std::mem::take(&mut widest), std::mem::take(&mut e.user_prefix));
            false
        });
        widest
    }

    fn evict(&mut self) {
        let capacity = self.limits.capacity.max(1);
        if self.entries.len() > capacity {
            let excess = self.entries.len() - capacity;
            self.entries.drain(..excess);
        }
    }
}

fn longer(a: String, b: String) -> String {
    if b.chars().count() > a.chars().count() {
        b
    } else {
        a
    }
}
