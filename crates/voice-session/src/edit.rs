use std::time::Instant;

use voice_core::input_history::{HistoryEntry, InputSource};
use voice_core::language::{LanguageId, Script};
use voice_core::message_history::now_millis;
use voice_core::normalize::normalize;
use voice_core::suggestion::{CandidateSource, SuggestionCandidate};

use super::scheduler::ScheduleAction;
use super::types::{EditResponse, SessionEvent};
use super::SessionContext;

impl SessionContext {
    /// Replace the buffer with `text` produced by `source`.
    pub fn set_text(&mut self, text: &str, source: InputSource, now: Instant) -> EditResponse {
        self.commit(text, vec![source], now)
    }

    /// Append hand-typed text.
    pub fn type_text(&mut self, typed: &str, now: Instant) -> EditResponse {
        let text = format!("{}{}", self.text, typed);
        self.commit(&text, vec![InputSource::Typed], now)
    }

    /// Delete the last character. `None` when the buffer is already empty.
    pub fn backspace(&mut self, now: Instant) -> Option<EditResponse> {
        let mut text = self.text.clone();
        text.pop()?;
        Some(self.commit(&text, vec![InputSource::Backspace], now))
    }

    /// Delete the last word as the language segments it.
    pub fn delete_word(&mut self, now: Instant) -> Option<EditResponse> {
        if self.text.is_empty() {
            return None;
        }
        let mut words = self.profile.segment(&self.text);
        words.pop();
        let text = match self.profile.script {
            // join() always leaves a separator; drop it when nothing is left.
            Script::SpaceDelimited if words.is_empty() => String::new(),
            _ => self.profile.join(&words),
        };
        Some(self.commit(&text, vec![InputSource::Delete], now))
    }

    /// Append the word chip at `index`.
    pub fn accept_word(&mut self, index: usize, now: Instant) -> Option<EditResponse> {
        let word = self.words.get(index)?.clone();
        let text = self.profile.append_word(&self.text, &word);
        Some(self.commit(&text, vec![InputSource::SuggestedWord], now))
    }

    /// Replace the buffer with the sentence chip at `index`.
    pub fn accept_sentence(&mut self, index: usize, now: Instant) -> Option<EditResponse> {
        let candidate = self.sentences.get(index)?.clone();
        let source = match candidate.source {
            CandidateSource::Llm => InputSource::SuggestedSentence(index),
            CandidateSource::LocalHistory => InputSource::HistorySentence(index),
        };
        Some(self.commit(&candidate.value, vec![source], now))
    }

    /// Replace the buffer with the local-history reuse candidate.
    pub fn accept_history_suggestion(&mut self, now: Instant) -> Option<EditResponse> {
        let value = self.history_suggestion.as_ref()?.value.clone();
        Some(self.commit(&value, vec![InputSource::HistorySentence(0)], now))
    }

    /// Insert a stock phrase from the snackbar.
    pub fn insert_phrase(&mut self, phrase: &str, now: Instant) -> EditResponse {
        let text = self.profile.append_word(&self.text, phrase);
        self.commit(&text, vec![InputSource::Snackbar], now)
    }

    pub fn clear(&mut self, now: Instant) -> EditResponse {
        self.commit("", vec![InputSource::Delete], now)
    }

    /// Restore the previous buffer. `None` when there is nothing to undo.
    pub fn undo(&mut self, now: Instant) -> Option<EditResponse> {
        if !self.input_history.can_undo() {
            return None;
        }
        self.input_history.undo();
        let text = self
            .input_history
            .last_input()
            .map(|entry| entry.value.clone())
            .unwrap_or_default();
        Some(self.apply_text(text, now))
    }

    /// Switch language. The buffer is kept; suggestions are refreshed.
    pub fn set_language(&mut self, language: LanguageId, now: Instant) -> EditResponse {
        self.profile = *language.profile();
        self.publish_suggestions(Vec::new(), Vec::new());
        let text = self.text.clone();
        self.apply_text(text, now)
    }

    fn commit(&mut self, text: &str, sources: Vec<InputSource>, now: Instant) -> EditResponse {
        let text = normalize(text, self.input_history.is_last_input_suggested());
        self.message_history
            .record(&text, &sources, &self.profile, now_millis());
        tracing::debug!(?sources, len = text.len(), "commit");
        self.input_history
            .add(HistoryEntry::new(text.clone(), sources));
        self.apply_text(text, now)
    }

    /// Show `text` and schedule suggestions for it, without touching the
    /// histories.
    fn apply_text(&mut self, text: String, now: Instant) -> EditResponse {
        self.text = text;
        self.emit(SessionEvent::TextChanged(self.text.clone()));
        self.refresh_history_suggestion();

        let schedule = self.scheduler.on_edit(&self.text, now);
        if schedule == ScheduleAction::Abort {
            self.publish_suggestions(Vec::new(), Vec::new());
            self.set_loading(false);
        }
        EditResponse {
            text: self.text.clone(),
            schedule,
        }
    }

    fn refresh_history_suggestion(&mut self) {
        let found = if self.text.trim().is_empty() {
            None
        } else {
            self.message_history
                .search(&self.text)
                .map(SuggestionCandidate::local_history)
        };
        if found != self.history_suggestion {
            self.history_suggestion = found;
            self.emit(SessionEvent::HistorySuggestionChanged(
                self.history_suggestion.clone(),
            ));
        }
    }
}
