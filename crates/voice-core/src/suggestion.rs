//! Suggestion candidates shown to the user.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSource {
    Llm,
    LocalHistory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionCandidate {
    pub source: CandidateSource,
    /// Full buffer text the candidate would produce when accepted.
    pub value: String,
}

impl SuggestionCandidate {
    pub fn llm(value: impl Into<String>) -> Self {
        Self {
            source: CandidateSource::Llm,
            value: value.into(),
        }
    }

    pub fn local_history(value: impl Into<String>) -> Self {
        Self {
            source: CandidateSource::LocalHistory,
            value: value.into(),
        }
    }
}
