//! Contract with the AI suggestion backend.
//!
//! The engine only knows this trait; the HTTP transport lives in the CLI
//! crate and tests plug in scripted clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::language::LanguageId;

/// Conversation context forwarded with every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionOptions {
    pub sentence_macro_id: String,
    pub word_macro_id: String,
    pub persona: String,
    pub last_input_speech: String,
    pub last_output_speech: String,
    pub conversation_history: Vec<String>,
    pub sentence_emotion: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// Trailing text the backend should complete.
    pub text: String,
    pub language: LanguageId,
    pub model_id: String,
    pub options: SuggestionOptions,
}

impl SuggestionRequest {
    /// Name of the language as it appears in prompts (`English`, `Japanese`).
    pub fn prompt_language(&self) -> &'static str {
        self.language.profile().prompt_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionReply {
    pub sentences: Vec<String>,
    pub words: Vec<String>,
}

/// Source of AI suggestions.
///
/// Implementations convert every failure (network, timeout, parse) into
/// `None`; the scheduler treats `None` as "no update".
#[async_trait]
pub trait SuggestionClient: Send + Sync {
    async fn fetch_suggestions(&self, request: &SuggestionRequest) -> Option<SuggestionReply>;
}

/// Extract the items of a numbered list (`1. foo`) from model output.
///
/// Lines not starting with `<digits>.` are dropped. A backslash at the end
/// of a line joins it with the next one.
pub fn parse_numbered_lines(text: &str) -> Vec<String> {
    text.replace("\\\n", "")
        .split('\n')
        .filter(|line| numbered_prefix_len(line).is_some())
        .map(|line| {
            let line = line.trim();
            let Some(len) = numbered_prefix_len(line) else {
                return line.to_string();
            };
            let rest = &line[len..];
            rest.strip_prefix(char::is_whitespace)
                .unwrap_or(rest)
                .to_string()
        })
        .collect()
}

/// Byte length of a leading `<digits>.` marker.
fn numbered_prefix_len(line: &str) -> Option<usize> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    (digits > 0 && line.as_bytes().get(digits) == Some(&b'.')).then_some(digits + 1)
}
