//! Per-language text capabilities: segment, join, append a word.
//!
//! Each supported language maps to one immutable [`LanguageProfile`] in a
//! static table. Behavior is selected by the profile's [`Script`] tag, not by
//! a type hierarchy.

mod segmenter;


use serde::{Deserialize, Serialize};

pub use segmenter::{IcuWordSegmenter, MorphSegmenter};

use crate::unicode::{
    is_bopomofo, is_hiragana, is_kanji, is_latin, is_trailing_punctuation, PROLONGED_SOUND_MARK,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    English,
    Japanese,
    Mandarin,
}

impl LanguageId {
    pub const ALL: [LanguageId; 3] = [Self::English, Self::Japanese, Self::Mandarin];

    pub fn profile(self) -> &'static LanguageProfile {
        match self {
            Self::English => &PROFILES[0],
            Self::Japanese => &PROFILES[1],
            Self::Mandarin => &PROFILES[2],
        }
    }

    /// Look up by short code (`en`, `ja`, `zh`).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.profile().code == code)
    }

    pub fn code(self) -> &'static str {
        self.profile().code
    }
}

/// How words are delimited in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// Words separated by spaces (English).
    SpaceDelimited,
    /// Agglutinative text without spaces; needs a morphological segmenter (Japanese).
    NoSpace,
    /// Every character is chosen individually (Mandarin via phonetic keyboards).
    CharacterCell,
}

#[derive(Clone, Copy)]
pub struct LanguageProfile {
    pub id: LanguageId,
    pub code: &'static str,
    /// Language name passed to the AI backend's prompt templates.
    pub prompt_name: &'static str,
    pub script: Script,
    segmenter: Option<&'static dyn MorphSegmenter>,
}

impl std::fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("id", &self.id)
            .field("code", &self.code)
            .field("prompt_name", &self.prompt_name)
            .field("script", &self.script)
            .field("has_segmenter", &self.segmenter.is_some())
            .finish()
    }
}

static ICU_SEGMENTER: IcuWordSegmenter = IcuWordSegmenter;

static PROFILES: [LanguageProfile; 3] = [
    LanguageProfile {
        id: LanguageId::English,
        code: "en",
        prompt_name: "English",
        script: Script::SpaceDelimited,
        segmenter: None,
    },
    LanguageProfile {
        id: LanguageId::Japanese,
        code: "ja",
        prompt_name: "Japanese",
        script: Script::NoSpace,
        segmenter: Some(&ICU_SEGMENTER),
    },
    LanguageProfile {
        id: LanguageId::Mandarin,
        code: "zh",
        prompt_name: "Mandarin",
        script: Script::CharacterCell,
        segmenter: None,
    },
];

impl LanguageProfile {
    /// Copy of this profile using a different morphological segmenter.
    /// `None` models an unavailable segmenter.
    pub fn with_segmenter(&self, segmenter: Option<&'static dyn MorphSegmenter>) -> Self {
        Self { segmenter, ..*self }
    }

    pub fn segment(&self, text: &str) -> Vec<String> {
        match self.script {
            Script::SpaceDelimited => text
                .split(' ')
                .filter(|w| !w.is_empty())
                .map(str::to_string)
                .collect(),
            Script::NoSpace => {
                if text.is_empty() {
                    return Vec::new();
                }
                match self.segmenter.and_then(|s| s.segment(text)) {
                    Some(fragments) => segmenter::merge_split_clusters(fragments),
                    None => vec![text.to_string()],
                }
            }
            Script::CharacterCell => text.chars().map(String::from).collect(),
        }
    }

    pub fn join<S: AsRef<str>>(&self, words: &[S]) -> String {
        match self.script {
            Script::SpaceDelimited => {
                let mut text = words
                    .iter()
                    .map(|w| w.as_ref())
                    .collect::<Vec<&str>>()
                    .join(" ");
                text.push(' ');
                remove_space_before_punctuation_runs(&text)
            }
            Script::NoSpace | Script::CharacterCell => words
                .iter()
                .map(|w| w.as_ref())
                .collect::<Vec<&str>>()
                .concat(),
        }
    }

    /// Append a suggested word to `text`. A word starting with `-` is a
    /// suffix completing the word being typed.
    pub fn append_word(&self, text: &str, word: &str) -> String {
        match self.script {
            Script::SpaceDelimited => {
                let mut words = self.segment(text);
                match (word.strip_prefix('-'), words.last_mut()) {
                    (Some(suffix), Some(last)) => last.push_str(suffix),
                    (Some(suffix), None) => words.push(suffix.to_string()),
                    (None, _) => words.push(word.to_string()),
                }
                self.join(&words)
            }
            Script::NoSpace => {
                format!("{}{}", text, word.strip_prefix('-').unwrap_or(word))
            }
            Script::CharacterCell => {
                let kept = text.trim_end_matches(is_latin);
                format!("{}{}", kept, word)
            }
        }
    }

    /// Whether `c` is plausibly typed by hand on this language's keyboard,
    /// as opposed to appended by a completion.
    pub fn is_hand_typed(&self, c: char) -> bool {
        match self.id {
            LanguageId::English => {
                c.is_ascii_alphanumeric() || c == ' ' || c == '\'' || is_trailing_punctuation(c)
            }
            LanguageId::Japanese => is_hiragana(c) || c == PROLONGED_SOUND_MARK,
            LanguageId::Mandarin => is_kanji(c) || is_bopomofo(c),
        }
    }

    /// Longest leading run of hand-typed characters of `sentence`.
    pub fn hand_typed_prefix(&self, sentence: &str) -> String {
        let end = sentence
            .char_indices()
            .find(|&(_, c)| !self.is_hand_typed(c))
            .map_or(sentence.len(), |(i, _)| i);
        sentence[..end].to_string()
    }
}

/// Drop the space in front of a `,.?!` run that ends a word (followed by a
/// space or the end of text).
fn remove_space_before_punctuation_runs(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == ' ' {
            let run_end = chars[i + 1..]
                .iter()
                .position(|&c| !is_trailing_punctuation(c))
                .map_or(chars.len(), |p| i + 1 + p);
            let has_run = run_end > i + 1;
            if has_run && (run_end == chars.len() || chars[run_end] == ' ') {
                i += 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
