use std::time::Instant;

use voice_core::input_history::InputSource;
use voice_core::language::{LanguageId, MorphSegmenter};

use super::{make_session, ms, record_events, reply, type_string};
use crate::SessionEvent;

struct PairSegmenter;

impl MorphSegmenter for PairSegmenter {
    fn segment(&self, text: &str) -> Option<Vec<String>> {
        let chars: Vec<char> = text.chars().collect();
        Some(chars.chunks(2).map(|c| c.iter().collect()).collect())
    }
}

static PAIRS: PairSegmenter = PairSegmenter;

#[test]
fn test_new_session_starts_blank() {
    let session = make_session(LanguageId::English);
    assert_eq!(session.text(), "");
    assert!(session.word_suggestions().is_empty());
    assert_eq!(session.initial_phrases()[0], "I");
    assert_eq!(session.input_history().len(), 1);
    assert!(!session.input_history().can_undo());
    assert!(session.sentence_suggestions().is_empty());
    assert!(!session.is_loading());
    assert_eq!(session.model_id(), "gemini-1.5-flash-002");
}

#[test]
fn test_typing_appends_and_records() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    type_string(&mut session, "Hi", t0);
    assert_eq!(session.text(), "Hi");
    assert_eq!(session.input_history().len(), 3);
    assert_eq!(session.input_history().last_input().unwrap().sources, vec![InputSource::Typed]);
    assert_eq!(session.message_history().len(), 1);
}

#[test]
fn test_commit_normalizes() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    let resp = session.type_text("  Hello   there", t0);
    assert_eq!(resp.text, "Hello there");
    assert_eq!(session.text(), "Hello there");
}

#[test]
fn test_suggested_word_then_punctuation() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    type_string(&mut session, "How are", t0);
    let job = session.fire_due(t0 + ms(300)).unwrap();
    session.receive_suggestions(job.ticket, Some(reply(&[], &["you"])));
    assert_eq!(session.word_suggestions(), ["you"]);

    let resp = session.accept_word(0, t0 + ms(400)).unwrap();
    assert_eq!(resp.text, "How are you ");
    assert!(session.input_history().is_last_input_suggested());

    session.type_text("?", t0 + ms(500));
    assert_eq!(session.text(), "How are you?");
}

#[test]
fn test_accept_out_of_range() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    assert!(session.accept_sentence(0, t0).is_none());
    assert!(session.accept_word(100, t0).is_none());
    assert!(session.accept_history_suggestion(t0).is_none());
}

#[test]
fn test_accept_sentence_tags_index() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    type_string(&mut session, "How are", t0);
    let job = session.fire_due(t0 + ms(300)).unwrap();
    session.receive_suggestions(
        job.ticket,
        Some(reply(&["How are you?", "How are things?"], &[])),
    );
    let resp = session.accept_sentence(1, t0 + ms(400)).unwrap();
    assert_eq!(resp.text, "How are things?");
    assert_eq!(
        session.input_history().last_input().unwrap().sources,
        vec![InputSource::SuggestedSentence(1)]
    );
}

#[test]
fn test_backspace() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    assert!(session.backspace(t0).is_none());
    type_string(&mut session, "abc", t0);
    let resp = session.backspace(t0).unwrap();
    assert_eq!(resp.text, "ab");
    assert_eq!(
        session.input_history().last_input().unwrap().sources,
        vec![InputSource::Backspace]
    );
}

#[test]
fn test_delete_word_english() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    session.set_text("How are you", InputSource::Typed, t0);
    assert_eq!(session.delete_word(t0).unwrap().text, "How are ");
    assert_eq!(session.delete_word(t0).unwrap().text, "How ");
    assert_eq!(session.delete_word(t0).unwrap().text, "");
    assert!(session.delete_word(t0).is_none());
}

#[test]
fn test_delete_word_japanese_uses_segmenter() {
    let t0 = Instant::now();
    let profile = LanguageId::Japanese.profile().with_segmenter(Some(&PAIRS));
    let mut session = make_session(LanguageId::Japanese).with_profile(profile);
    session.set_text("今日は晴れ", InputSource::Typed, t0);
    assert_eq!(session.delete_word(t0).unwrap().text, "今日は晴");
}

#[test]
fn test_delete_word_mandarin_drops_one_char() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::Mandarin);
    session.set_text("你好吗", InputSource::Typed, t0);
    assert_eq!(session.delete_word(t0).unwrap().text, "你好");
}

#[test]
fn test_undo_walks_back_without_recording() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    type_string(&mut session, "ab", t0);
    assert_eq!(session.undo(t0).unwrap().text, "a");
    assert_eq!(session.input_history().len(), 3);
    let resp = session.undo(t0).unwrap();
    assert_eq!(resp.text, "");
    assert!(resp.aborts_fetches());
    assert!(session.undo(t0).is_none());

    // A new edit drops the undone entries, and undo stops at that edit.
    session.type_text("c", t0);
    assert_eq!(session.input_history().len(), 2);
    assert!(!session.input_history().can_undo());
    assert!(session.undo(t0).is_none());
}

#[test]
fn test_clear_empties_suggestions() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    type_string(&mut session, "How are", t0);
    let job = session.fire_due(t0 + ms(300)).unwrap();
    session.receive_suggestions(job.ticket, Some(reply(&["How are you?"], &["you"])));
    assert_eq!(session.sentence_suggestions().len(), 1);

    let resp = session.clear(t0 + ms(400));
    assert!(resp.aborts_fetches());
    assert!(session.sentence_suggestions().is_empty());
    assert!(session.word_suggestions().is_empty());
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn test_history_suggestion_offered_and_accepted() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    session.set_text("I want to eat ramen.", InputSource::Typed, t0);
    session.clear(t0);
    assert!(session.history_suggestion().is_none());

    type_string(&mut session, "I want", t0);
    assert_eq!(
        session.history_suggestion().map(|c| c.value.as_str()),
        Some("I want to eat ramen.")
    );

    let resp = session.accept_history_suggestion(t0).unwrap();
    assert_eq!(resp.text, "I want to eat ramen.");
    assert_eq!(
        session.input_history().last_input().unwrap().sources,
        vec![InputSource::HistorySentence(0)]
    );
    assert_eq!(session.message_history().len(), 1);
    assert!(session.history_suggestion().is_none());
}

#[test]
fn test_insert_phrase() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    let resp = session.insert_phrase("Could you", t0);
    assert_eq!(resp.text, "Could you ");
    assert_eq!(
        session.input_history().last_input().unwrap().sources,
        vec![InputSource::Snackbar]
    );
}

#[test]
fn test_set_language_switches_phrases() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    session.set_language(LanguageId::Japanese, t0);
    assert_eq!(session.language(), LanguageId::Japanese);
    assert_eq!(session.initial_phrases()[0], "私は");
    assert!(session.word_suggestions().is_empty());
}

#[test]
fn test_ai_config_selection() {
    let mut session = make_session(LanguageId::English);
    session.set_ai_config("gemini_flash_2").unwrap();
    assert_eq!(session.model_id(), "gemini-2.0-flash-001");
    assert!(session.set_ai_config("missing").is_err());
    assert_eq!(session.model_id(), "gemini-2.0-flash-001");
}

#[test]
fn test_subscribe_and_unsubscribe() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&events);
    let id = session.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    session.type_text("a", t0);
    assert!(events
        .lock()
        .unwrap()
        .contains(&SessionEvent::TextChanged("a".to_string())));

    assert!(session.unsubscribe(id));
    let before = events.lock().unwrap().len();
    session.type_text("b", t0);
    assert_eq!(events.lock().unwrap().len(), before);
    assert!(!session.unsubscribe(id));
}

#[test]
fn test_history_suggestion_event() {
    let t0 = Instant::now();
    let mut session = make_session(LanguageId::English);
    session.set_text("Good night everyone.", InputSource::Typed, t0);
    session.clear(t0);
    let events = record_events(&mut session);
    session.type_text("Good", t0);
    let events = events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::HistorySuggestionChanged(Some(c)) if c.value == "Good night everyone."
    )));
}
