use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{sleep, Instant};

use voice_core::client::{SuggestionClient, SuggestionReply, SuggestionRequest};
use voice_core::language::LanguageId;

use super::{make_session, ms, record_events, reply};
use crate::driver::{spawn, SessionCommand};
use crate::SessionEvent;

/// Answers every request with the same reply after `latency`.
struct ScriptedClient {
    start: Instant,
    latency: Duration,
    reply: SuggestionReply,
    calls: Mutex<Vec<(Duration, String)>>,
}

impl ScriptedClient {
    fn new(latency: Duration, reply: SuggestionReply) -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            latency,
            reply,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<(Duration, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SuggestionClient for ScriptedClient {
    async fn fetch_suggestions(&self, request: &SuggestionRequest) -> Option<SuggestionReply> {
        self.calls
            .lock()
            .unwrap()
            .push((self.start.elapsed(), request.text.clone()));
        sleep(self.latency).await;
        Some(self.reply.clone())
    }
}

fn within(actual: Duration, expected_ms: u64) -> bool {
    let expected = ms(expected_ms);
    actual >= expected && actual < expected + ms(5)
}

#[tokio::test(start_paused = true)]
async fn test_first_edit_fetches_immediately() {
    let client = ScriptedClient::new(ms(50), reply(&["How are you?"], &["you"]));
    let session = make_session(LanguageId::English);
    let (handle, task) = spawn(session, client.clone());

    handle.type_text("How are").await.unwrap();
    assert_eq!(handle.sync().await.unwrap(), "How are");
    sleep(ms(500)).await;
    drop(handle);
    let session = task.await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert!(within(calls[0].0, 0), "fetched at {:?}", calls[0].0);
    assert_eq!(calls[0].1, "How are");
    assert_eq!(session.sentence_suggestions()[0].value, "How are you?");
    assert_eq!(session.word_suggestions(), ["you"]);
    assert!(!session.is_loading());
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_stretch_debounce() {
    let client = ScriptedClient::new(ms(50), reply(&[], &[]));
    let session = make_session(LanguageId::English);
    let (handle, task) = spawn(session, client.clone());

    handle.type_text("H").await.unwrap();
    handle.sync().await.unwrap();
    sleep(ms(10)).await;
    // Second edit in the window: 150 ms.
    handle.type_text("e").await.unwrap();
    handle.sync().await.unwrap();
    sleep(ms(10)).await;
    // Third edit: capped at 300 ms, replacing the pending 150 ms timer.
    handle.type_text("y").await.unwrap();
    handle.sync().await.unwrap();
    sleep(ms(2000)).await;
    drop(handle);
    task.await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 2, "calls: {calls:?}");
    assert!(within(calls[0].0, 0));
    assert_eq!(calls[0].1, "H");
    assert!(within(calls[1].0, 320), "fetched at {:?}", calls[1].0);
    assert_eq!(calls[1].1, "Hey");
}

#[tokio::test(start_paused = true)]
async fn test_second_edit_waits_one_step() {
    let client = ScriptedClient::new(ms(10), reply(&[], &[]));
    let session = make_session(LanguageId::English);
    let (handle, task) = spawn(session, client.clone());

    handle.type_text("H").await.unwrap();
    handle.sync().await.unwrap();
    sleep(ms(100)).await;
    handle.type_text("i").await.unwrap();
    handle.sync().await.unwrap();
    sleep(ms(1000)).await;
    drop(handle);
    task.await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 2);
    assert!(within(calls[1].0, 250), "fetched at {:?}", calls[1].0);
}

#[tokio::test(start_paused = true)]
async fn test_blank_buffer_aborts_fetch() {
    let client = ScriptedClient::new(ms(5000), reply(&["Hi there."], &["there"]));
    let mut session = make_session(LanguageId::English);
    let events = record_events(&mut session);
    let (handle, task) = spawn(session, client.clone());

    handle.type_text("Hi").await.unwrap();
    handle.sync().await.unwrap();
    sleep(ms(100)).await;
    handle.send(SessionCommand::Clear).await.unwrap();
    assert_eq!(handle.sync().await.unwrap(), "");
    sleep(ms(10_000)).await;
    drop(handle);
    let session = task.await.unwrap();

    assert_eq!(client.calls().len(), 1);
    assert!(!session.is_loading());
    assert!(session.sentence_suggestions().is_empty());
    assert!(session.word_suggestions().is_empty());

    let events = events.lock().unwrap();
    let loading: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::LoadingChanged(v) => Some(*v),
            _ => None,
        })
        .collect();
    assert_eq!(loading, vec![true, false]);
    assert!(!events.iter().any(|e| matches!(
        e,
        SessionEvent::SuggestionsChanged { sentences, .. } if !sentences.is_empty()
    )));
}

#[tokio::test(start_paused = true)]
async fn test_commands_apply_in_order() {
    let client = ScriptedClient::new(ms(10), reply(&[], &[]));
    let session = make_session(LanguageId::English);
    let (handle, task) = spawn(session, client);

    handle.type_text("Hello").await.unwrap();
    handle.send(SessionCommand::Backspace).await.unwrap();
    handle.send(SessionCommand::InsertPhrase("you".to_string())).await.unwrap();
    handle.send(SessionCommand::Undo).await.unwrap();
    assert_eq!(handle.sync().await.unwrap(), "Hell");
    drop(handle);
    let session = task.await.unwrap();
    assert_eq!(session.input_history().len(), 4);
}
