//! Tokio event loop around a [`SessionContext`].
//!
//! One task owns the session. Commands arrive over a channel and are applied
//! in order; the debounce timer and fetch completions are awaited in the same
//! `select!`, so session state is never shared across tasks. Each fetch runs
//! in its own task under a cancellation token that a blank buffer cancels.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use voice_core::client::{SuggestionClient, SuggestionReply};
use voice_core::input_history::InputSource;
use voice_core::language::LanguageId;

use crate::scheduler::FetchTicket;
use crate::types::{ConversationContext, EditResponse, FetchJob};
use crate::SessionContext;

const COMMAND_BUFFER: usize = 64;

/// Operations forwarded to the session task.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    SetText(String, InputSource),
    TypeText(String),
    Backspace,
    DeleteWord,
    AcceptWord(usize),
    AcceptSentence(usize),
    AcceptHistorySuggestion,
    InsertPhrase(String),
    Clear,
    Undo,
    SetLanguage(LanguageId),
    SetConversationContext(ConversationContext),
}

enum Message {
    Command(SessionCommand),
    /// Reply with the current buffer once every earlier message is applied.
    Sync(oneshot::Sender<String>),
}

#[derive(Debug, thiserror::Error)]
#[error("session task has stopped")]
pub struct SessionClosed;

/// Cheap handle for sending commands to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Message>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.tx
            .send(Message::Command(command))
            .await
            .map_err(|_| SessionClosed)
    }

    pub async fn type_text(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(SessionCommand::TypeText(text.into())).await
    }

    /// Wait until all previously sent commands are applied; returns the buffer.
    pub async fn sync(&self) -> Result<String, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Message::Sync(tx))
            .await
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }
}

/// Spawn the session loop. The task ends when every handle is dropped and
/// returns the session so callers can persist its histories.
pub fn spawn(
    session: SessionContext,
    client: Arc<dyn SuggestionClient>,
) -> (SessionHandle, JoinHandle<SessionContext>) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(run(session, client, rx));
    (SessionHandle { tx }, task)
}

type FetchResult = (FetchTicket, Option<SuggestionReply>);

async fn run(
    mut session: SessionContext,
    client: Arc<dyn SuggestionClient>,
    mut messages: mpsc::Receiver<Message>,
) -> SessionContext {
    let (result_tx, mut results) = mpsc::unbounded_channel::<FetchResult>();
    let mut fetch_scope = CancellationToken::new();

    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            message = messages.recv() => {
                let Some(message) = message else { break };
                match message {
                    Message::Command(command) => {
                        let aborts = apply(&mut session, command, now())
                            .is_some_and(|resp| resp.aborts_fetches());
                        if aborts {
                            fetch_scope.cancel();
                            fetch_scope = CancellationToken::new();
                        }
                    }
                    Message::Sync(reply) => {
                        let _ = reply.send(session.text().to_string());
                    }
                }
            }
            Some((ticket, reply)) = results.recv() => {
                session.receive_suggestions(ticket, reply);
            }
            _ = wait_until(deadline) => {
                if let Some(job) = session.fire_due(now()) {
                    spawn_fetch(job, Arc::clone(&client), fetch_scope.child_token(), result_tx.clone());
                }
            }
        }
    }

    fetch_scope.cancel();
    tracing::debug!("session loop stopped");
    session
}

fn apply(session: &mut SessionContext, command: SessionCommand, now: Instant) -> Option<EditResponse> {
    match command {
        SessionCommand::SetText(text, source) => Some(session.set_text(&text, source, now)),
        SessionCommand::TypeText(text) => Some(session.type_text(&text, now)),
        SessionCommand::Backspace => session.backspace(now),
        SessionCommand::DeleteWord => session.delete_word(now),
        SessionCommand::AcceptWord(i) => session.accept_word(i, now),
        SessionCommand::AcceptSentence(i) => session.accept_sentence(i, now),
        SessionCommand::AcceptHistorySuggestion => session.accept_history_suggestion(now),
        SessionCommand::InsertPhrase(phrase) => Some(session.insert_phrase(&phrase, now)),
        SessionCommand::Clear => Some(session.clear(now)),
        SessionCommand::Undo => session.undo(now),
        SessionCommand::SetLanguage(language) => Some(session.set_language(language, now)),
        SessionCommand::SetConversationContext(conversation) => {
            session.set_conversation_context(conversation);
            None
        }
    }
}

fn spawn_fetch(
    job: FetchJob,
    client: Arc<dyn SuggestionClient>,
    cancel: CancellationToken,
    results: mpsc::UnboundedSender<FetchResult>,
) {
    tokio::spawn(async move {
        let reply = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(id = job.ticket.id, "fetch cancelled");
                return;
            }
            reply = client.fetch_suggestions(&job.request) => reply,
        };
        // The loop may already be gone; nothing to deliver to then.
        let _ = results.send((job.ticket, reply));
    });
}

/// The session clock. Tokio's clock so paused-time tests see virtual time.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
