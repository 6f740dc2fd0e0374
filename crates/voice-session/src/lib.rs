//! Stateful composition session: buffer, histories and suggestions.
//!
//! `SessionContext` owns all mutable editing state. Edit operations are
//! synchronous and return an [`EditResponse`] telling the caller when the
//! next suggestion fetch is due; the caller runs fetches (see [`driver`])
//! and feeds results back through [`SessionContext::receive_suggestions`].

pub mod driver;
pub mod feedback;
pub mod scheduler;

mod edit;
mod fetch;
mod types;

#[cfg(test)]
mod tests;

use std::time::Instant;

use voice_core::input_history::{HistoryEntry, InputHistory};
use voice_core::language::{LanguageId, LanguageProfile};
use voice_core::message_history::MessageHistory;
use voice_core::settings::{Settings, SettingsError};
use voice_core::suggestion::SuggestionCandidate;

pub use types::{ConversationContext, EditResponse, FetchJob, SessionEvent, SubscriptionId};

use scheduler::{SchedulerConfig, SuggestionScheduler};
use types::Listener;

/// One composition session.
pub struct SessionContext {
    settings: Settings,
    profile: LanguageProfile,

    text: String,
    input_history: InputHistory,
    message_history: MessageHistory,
    scheduler: SuggestionScheduler,

    // Published suggestion state
    sentences: Vec<SuggestionCandidate>,
    words: Vec<String>,
    history_suggestion: Option<SuggestionCandidate>,
    loading: bool,

    // Request options
    model_id: String,
    persona: String,
    conversation: ConversationContext,

    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl SessionContext {
    pub fn new(settings: Settings, language: LanguageId) -> Result<Self, SettingsError> {
        let model_id = settings.model_id(None)?.to_string();
        let persona = settings.ai.persona.clone();
        // The blank buffer is the oldest undo target.
        let mut input_history = InputHistory::new(settings.history.input_capacity);
        input_history.add(HistoryEntry::new("", Vec::new()));
        Ok(Self {
            input_history,
            message_history: MessageHistory::with_limits(settings.history_limits()),
            scheduler: SuggestionScheduler::new(SchedulerConfig::from_settings(&settings)),
            settings,
            profile: *language.profile(),
            text: String::new(),
            sentences: Vec::new(),
            words: Vec::new(),
            history_suggestion: None,
            loading: false,
            model_id,
            persona,
            conversation: ConversationContext::default(),
            listeners: Vec::new(),
            next_subscription: 0,
        })
    }

    /// Replace the sentence history, e.g. with one loaded from disk.
    pub fn with_message_history(mut self, history: MessageHistory) -> Self {
        self.message_history = history;
        self
    }

    /// Use a custom profile (typically one with a different segmenter).
    pub fn with_profile(mut self, profile: LanguageProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> LanguageId {
        self.profile.id
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sentence_suggestions(&self) -> &[SuggestionCandidate] {
        &self.sentences
    }

    pub fn word_suggestions(&self) -> &[String] {
        &self.words
    }

    /// Stock phrases for the current language, offered by the UI while the
    /// buffer is blank.
    pub fn initial_phrases(&self) -> &[String] {
        self.settings.initial_phrases(self.profile.id)
    }

    pub fn history_suggestion(&self) -> Option<&SuggestionCandidate> {
        self.history_suggestion.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn input_history(&self) -> &InputHistory {
        &self.input_history
    }

    pub fn message_history(&self) -> &MessageHistory {
        &self.message_history
    }

    pub fn scheduler(&self) -> &SuggestionScheduler {
        &self.scheduler
    }

    /// When the pending fetch is due, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Select a named AI config from settings.
    pub fn set_ai_config(&mut self, name: &str) -> Result<(), SettingsError> {
        self.model_id = self.settings.model_id(Some(name))?.to_string();
        Ok(())
    }

    pub fn set_persona(&mut self, persona: impl Into<String>) {
        self.persona = persona.into();
    }

    pub fn set_conversation_context(&mut self, conversation: ConversationContext) {
        self.conversation = conversation;
    }

    pub fn subscribe(&mut self, listener: impl Fn(&SessionEvent) + Send + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn emit(&self, event: SessionEvent) {
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.emit(SessionEvent::LoadingChanged(loading));
        }
    }

    fn publish_suggestions(&mut self, sentences: Vec<SuggestionCandidate>, words: Vec<String>) {
        self.sentences = sentences;
        self.words = words;
        self.emit(SessionEvent::SuggestionsChanged {
            sentences: self.sentences.clone(),
            words: self.words.clone(),
        });
    }
}
