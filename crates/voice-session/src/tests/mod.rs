mod basic;
mod driver;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use voice_core::client::SuggestionReply;
use voice_core::language::LanguageId;
use voice_core::settings::Settings;

use super::{SessionContext, SessionEvent};

pub(super) fn make_session(language: LanguageId) -> SessionContext {
    SessionContext::new(Settings::default(), language).unwrap()
}

pub(super) fn reply(sentences: &[&str], words: &[&str]) -> SuggestionReply {
    SuggestionReply {
        sentences: sentences.iter().map(|s| s.to_string()).collect(),
        words: words.iter().map(|w| w.to_string()).collect(),
    }
}

pub(super) fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Record every event the session emits.
pub(super) fn record_events(session: &mut SessionContext) -> Arc<Mutex<Vec<SessionEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
    events
}

/// Type `text` one character at a time, all at `now`.
pub(super) fn type_string(session: &mut SessionContext, text: &str, now: Instant) {
    for c in text.chars() {
        session.type_text(&c.to_string(), now);
    }
}
