//! HTTP transport for the `/run-macro` suggestion backend.
//!
//! One request runs one prompt macro. A suggestion fetch issues the sentence
//! macro and the word macro in turn; both answers are numbered lists wrapped
//! in `{"messages":[{"text": ...}]}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use voice_core::client::{
    parse_numbered_lines, SuggestionClient, SuggestionReply, SuggestionRequest,
};

/// Candidates asked from the backend per macro call.
const CANDIDATES_PER_CALL: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("invalid response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("worker failed: {0}")]
    Worker(String),
}

/// Template inputs, named as the backend's macro placeholders.
/// Empty fields are left out so `#ifdef` blocks stay closed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserInputs<'a> {
    language: &'a str,
    num: String,
    text: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    persona: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    last_input_speech: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    last_output_speech: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    conversation_history: String,
    #[serde(skip_serializing_if = "is_empty")]
    sentence_emotion: &'a str,
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

impl<'a> UserInputs<'a> {
    fn from_request(request: &'a SuggestionRequest) -> Self {
        let options = &request.options;
        Self {
            language: request.prompt_language(),
            num: CANDIDATES_PER_CALL.to_string(),
            text: &request.text,
            persona: &options.persona,
            last_input_speech: &options.last_input_speech,
            last_output_speech: &options.last_output_speech,
            conversation_history: options.conversation_history.join("\n"),
            sentence_emotion: &options.sentence_emotion,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MacroResponse {
    messages: Vec<MacroMessage>,
}

#[derive(Debug, Deserialize)]
struct MacroMessage {
    text: String,
}

/// Extract candidates from a `/run-macro` response body.
/// `{"messages": []}` (the backend's "no text") yields an empty list.
pub fn parse_macro_response(body: &str) -> Result<Vec<String>, ClientError> {
    let response: MacroResponse = serde_json::from_str(body)?;
    Ok(response
        .messages
        .first()
        .map(|m| parse_numbered_lines(&m.text))
        .unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct HttpSuggestionClient {
    endpoint: String,
}

impl HttpSuggestionClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoint: format!("{}/run-macro", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run one macro. Blocking.
    pub fn run_macro(
        &self,
        macro_id: &str,
        request: &SuggestionRequest,
    ) -> Result<Vec<String>, ClientError> {
        let inputs = serde_json::to_string(&UserInputs::from_request(request))?;
        let temperature = request.options.temperature.to_string();
        let body = ureq::post(&self.endpoint)
            .send_form([
                ("id", macro_id),
                ("userInputs", inputs.as_str()),
                ("temperature", temperature.as_str()),
                ("model_id", request.model_id.as_str()),
            ])
            .map_err(|e| ClientError::Http(format!("{}: {e}", self.endpoint)))?
            .into_body()
            .read_to_string()
            .map_err(|e| ClientError::Http(format!("{}: {e}", self.endpoint)))?;
        parse_macro_response(&body)
    }

    /// Sentence and word candidates for `request`. Blocking.
    /// A macro with an empty id is skipped.
    pub fn fetch_blocking(&self, request: &SuggestionRequest) -> Result<SuggestionReply, ClientError> {
        let options = &request.options;
        let sentences = if options.sentence_macro_id.is_empty() {
            Vec::new()
        } else {
            self.run_macro(&options.sentence_macro_id, request)?
        };
        let words = if options.word_macro_id.is_empty() {
            Vec::new()
        } else {
            self.run_macro(&options.word_macro_id, request)?
        };
        Ok(SuggestionReply { sentences, words })
    }
}

#[async_trait]
impl SuggestionClient for HttpSuggestionClient {
    async fn fetch_suggestions(&self, request: &SuggestionRequest) -> Option<SuggestionReply> {
        let client = self.clone();
        let request = request.clone();
        let result = tokio::task::spawn_blocking(move || client.fetch_blocking(&request))
            .await
            .map_err(|e| ClientError::Worker(e.to_string()))
            .and_then(|r| r);
        match result {
            Ok(reply) => {
                tracing::debug!(
                    sentences = reply.sentences.len(),
                    words = reply.words.len(),
                    "suggestions fetched"
                );
                Some(reply)
            }
            Err(e) => {
                tracing::warn!(error = %e, "suggestion fetch failed");
                None
            }
        }
    }
}
