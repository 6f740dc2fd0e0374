//! Sentence segmentation of the running buffer.
//!
//! Boundaries are found without any NLP model: a CJK sentence-ending mark
//! always closes a sentence, a Latin `.?!` closes one only when followed by
//! whitespace (so `.NET` or `3.14` stay intact). The delimiter and the
//! whitespace that follows it belong to the sentence they close.

use crate::unicode::{is_cjk_sentence_end, is_latin_sentence_end};

/// Default number of characters of trailing context sent to the AI backend.
pub const DEFAULT_LLM_THRESHOLD_CHARS: usize = 30;

/// Split `text` into sentences. Concatenating the result yields `text`.
pub fn split_to_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let closes = is_cjk_sentence_end(c)
            || (is_latin_sentence_end(c)
                && chars.peek().is_some_and(|&(_, next)| next.is_whitespace()));
        if !closes {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                break;
            }
            end = j + ws.len_utf8();
            chars.next();
        }
        sentences.push(text[start..end].to_string());
        start = end;
    }

    if start < text.len() {
        sentences.push(text[start..].to_string());
    }
    sentences
}

/// Split into (all preceding sentences joined verbatim, last sentence with
/// trailing whitespace trimmed).
pub fn split_last_sentence(text: &str) -> (String, String) {
    let mut sentences = split_to_sentences(text);
    let Some(last) = sentences.pop() else {
        return (String::new(), String::new());
    };
    (sentences.concat(), last.trim_end().to_string())
}

/// Split into (context, tail) where `tail` is the shortest run of trailing
/// sentences whose length reaches `threshold_chars`. Text shorter than the
/// threshold is returned whole as the tail.
pub fn split_last_few_sentences_for_llm(text: &str, threshold_chars: usize) -> (String, String) {
    let sentences = split_to_sentences(text);
    let mut accumulated = 0;
    for i in (0..sentences.len()).rev() {
        accumulated += sentences[i].chars().count();
        if accumulated >= threshold_chars {
            return (sentences[..i].concat(), sentences[i..].concat());
        }
    }
    (String::new(), text.to_string())
}

/// Longest common prefix of all `strings`, respecting char boundaries.
pub fn shared_prefix<S: AsRef<str>>(strings: &[S]) -> String {
    let Some((first, rest)) = strings.split_first() else {
        return String::new();
    };
    let first = first.as_ref();
    let mut end = first.len();
    for s in rest {
        let common: usize = first
            .chars()
            .zip(s.as_ref().chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        end = end.min(common);
    }
    first[..end].to_string()
}
