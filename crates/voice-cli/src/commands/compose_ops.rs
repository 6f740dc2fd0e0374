//! Line-oriented composition over the session driver.
//!
//! Each stdin line is typed into the buffer; lines starting with `:` are
//! editing commands. Session events are printed as they arrive.

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use voice_core::client::SuggestionClient;
use voice_core::language::LanguageId;
use voice_core::message_history::MessageHistory;
use voice_core::settings::Settings;
use voice_session::driver::{self, SessionCommand};
use voice_session::{SessionContext, SessionEvent};

use crate::http::HttpSuggestionClient;
use crate::simulator::OfflineClient;

/// Longest wait for an outstanding fetch once input ends.
const LINGER: Duration = Duration::from_secs(10);

pub struct ComposeArgs<'a> {
    pub language: LanguageId,
    pub endpoint: &'a str,
    pub offline: bool,
    pub history: Option<&'a str>,
}

/// Map one input line to a session command.
pub fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(SessionCommand::TypeText(line.to_string()));
    };
    // "::" escapes a literal colon.
    if rest.starts_with(':') {
        return Ok(SessionCommand::TypeText(rest.to_string()));
    }
    let (name, arg) = match rest.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let index = || {
        arg.parse::<usize>()
            .map_err(|_| format!("expected an index after :{name}, got {arg:?}"))
    };
    match name {
        "bs" => Ok(SessionCommand::Backspace),
        "dw" => Ok(SessionCommand::DeleteWord),
        "w" => Ok(SessionCommand::AcceptWord(index()?)),
        "s" => Ok(SessionCommand::AcceptSentence(index()?)),
        "h" => Ok(SessionCommand::AcceptHistorySuggestion),
        "p" if !arg.is_empty() => Ok(SessionCommand::InsertPhrase(arg.to_string())),
        "clear" => Ok(SessionCommand::Clear),
        "undo" => Ok(SessionCommand::Undo),
        "lang" => LanguageId::from_code(arg)
            .map(SessionCommand::SetLanguage)
            .ok_or_else(|| format!("unknown language {arg:?}")),
        _ => Err(format!(
            "unknown command :{name} (bs, dw, w N, s N, h, p PHRASE, clear, undo, lang CODE)"
        )),
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::TextChanged(text) => println!("> {text}"),
        SessionEvent::SuggestionsChanged { sentences, words } => {
            for (i, s) in sentences.iter().enumerate() {
                println!("  s{i}: {}", s.value);
            }
            if !words.is_empty() {
                println!("  words: {}", words.join(" | "));
            }
        }
        SessionEvent::HistorySuggestionChanged(Some(c)) => println!("  h: {}", c.value),
        SessionEvent::HistorySuggestionChanged(None) | SessionEvent::LoadingChanged(_) => {}
    }
}

pub fn compose(args: &ComposeArgs, settings: Settings) {
    let limits = settings.history_limits();
    let cap = settings.scheduler.debounce_cap();
    let mut session = die!(
        SessionContext::new(settings, args.language),
        "Error: {}"
    );
    if let Some(file) = args.history {
        let history = die!(
            MessageHistory::open(Path::new(file), limits),
            "Error reading {file}: {}"
        );
        session = session.with_message_history(history);
    }

    let (loading_tx, mut loading_rx) = watch::channel(false);
    session.subscribe(move |event| {
        if let SessionEvent::LoadingChanged(loading) = event {
            loading_tx.send_replace(*loading);
        }
        print_event(event);
    });

    let client: Arc<dyn SuggestionClient> = if args.offline {
        Arc::new(OfflineClient)
    } else {
        Arc::new(HttpSuggestionClient::new(args.endpoint))
    };

    let session = super::runtime().block_on(async move {
        let (handle, task) = driver::spawn(session, client);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = die!(lines.next_line().await, "Error reading stdin: {}") {
            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(msg) => {
                    eprintln!("{msg}");
                    continue;
                }
            };
            if handle.send(command).await.is_err() {
                break;
            }
        }

        // Give the last debounced fetch a chance to land.
        if handle.sync().await.is_ok() {
            tokio::time::sleep(cap).await;
            let _ = tokio::time::timeout(LINGER, loading_rx.wait_for(|loading| !*loading)).await;
        }
        drop(handle);
        die!(task.await, "Error: session task failed: {}")
    });

    if let Some(file) = args.history {
        die!(
            session.message_history().save(Path::new(file)),
            "Error writing {file}: {}"
        );
        tracing::info!(entries = session.message_history().len(), file, "history saved");
    }
}
