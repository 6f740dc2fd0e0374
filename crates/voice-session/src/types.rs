use std::time::Instant;

use voice_core::client::SuggestionRequest;
use voice_core::suggestion::SuggestionCandidate;

use crate::scheduler::{FetchTicket, ScheduleAction};

/// Result of an edit operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResponse {
    /// Buffer text after normalization.
    pub text: String,
    pub schedule: ScheduleAction,
}

impl EditResponse {
    pub fn deadline(&self) -> Option<Instant> {
        match self.schedule {
            ScheduleAction::Arm { deadline, .. } => Some(deadline),
            ScheduleAction::Abort => None,
        }
    }

    /// True when outstanding fetches must be cancelled.
    pub fn aborts_fetches(&self) -> bool {
        self.schedule == ScheduleAction::Abort
    }
}

/// A fetch the caller must run and report back with
/// [`SessionContext::receive_suggestions`](crate::SessionContext::receive_suggestions).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchJob {
    pub ticket: FetchTicket,
    pub request: SuggestionRequest,
}

/// Side-channel context forwarded with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationContext {
    pub last_input_speech: String,
    pub last_output_speech: String,
    /// Recent conversation turns, oldest first.
    pub history: Vec<String>,
    pub sentence_emotion: String,
}

/// Notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    TextChanged(String),
    SuggestionsChanged {
        sentences: Vec<SuggestionCandidate>,
        words: Vec<String>,
    },
    /// Reuse candidate from the local sentence history; `None` clears it.
    HistorySuggestionChanged(Option<SuggestionCandidate>),
    LoadingChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub(crate) type Listener = Box<dyn Fn(&SessionEvent) + Send>;
