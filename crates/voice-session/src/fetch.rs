use std::time::Instant;

use voice_core::client::{SuggestionOptions, SuggestionReply, SuggestionRequest};
use voice_core::suggestion::SuggestionCandidate;

use super::scheduler::{FetchTicket, Settled};
use super::types::FetchJob;
use super::SessionContext;

impl SessionContext {
    /// Start the pending fetch if its debounce deadline has passed.
    pub fn fire_due(&mut self, now: Instant) -> Option<FetchJob> {
        let plan = self.scheduler.fire_due(&self.text, now)?;
        self.set_loading(true);
        Some(FetchJob {
            ticket: plan.ticket,
            request: SuggestionRequest {
                text: plan.tail,
                language: self.profile.id,
                model_id: self.model_id.clone(),
                options: self.request_options(),
            },
        })
    }

    /// Consume the outcome of a fetch started by [`fire_due`](Self::fire_due).
    /// `None` means the fetch failed; the previous suggestions stay.
    pub fn receive_suggestions(&mut self, ticket: FetchTicket, reply: Option<SuggestionReply>) {
        let settled = self.scheduler.settle(
            ticket,
            reply,
            &self.text,
            self.input_history.is_last_input_suggested(),
        );
        let Settled::Done { loading, update } = settled else {
            return;
        };
        self.set_loading(loading);
        let Some(update) = update else {
            return;
        };

        let limits = &self.settings.suggestions;
        let sentences = update
            .sentences
            .into_iter()
            .take(limits.max_sentence_suggestions)
            .map(SuggestionCandidate::llm)
            .collect();
        let words = update
            .words
            .into_iter()
            .take(limits.max_word_suggestions)
            .collect();
        self.publish_suggestions(sentences, words);
    }

    fn request_options(&self) -> SuggestionOptions {
        let language = self.settings.language(self.profile.id);
        SuggestionOptions {
            sentence_macro_id: language
                .map(|l| l.sentence_macro_id.clone())
                .unwrap_or_default(),
            word_macro_id: language
                .map(|l| l.word_macro_id.clone())
                .unwrap_or_default(),
            persona: self.persona.clone(),
            last_input_speech: self.conversation.last_input_speech.clone(),
            last_output_speech: self.conversation.last_output_speech.clone(),
            conversation_history: self.conversation.history.clone(),
            sentence_emotion: self.conversation.sentence_emotion.clone(),
            temperature: self.settings.ai.temperature,
        }
    }
}
