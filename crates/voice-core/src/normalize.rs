//! Canonicalization of buffer text before it is stored or published.
//!
//! Sound marks are folded through NFKC so that `か` + `゛` becomes `が`, while
//! marks that cannot compose keep their standalone spacing glyph.

use unicode_normalization::UnicodeNormalization;

use crate::unicode::{
    is_trailing_punctuation, COMBINING_DAKUTEN, COMBINING_HANDAKUTEN, DAKUTEN, HANDAKUTEN,
};

/// Normalize buffer text.
///
/// `last_edit_was_suggestion` is true when the previous committed edit came
/// from a suggestion chip; those insert a separator that must not linger in
/// front of terminal punctuation.
pub fn normalize(text: &str, last_edit_was_suggestion: bool) -> String {
    let composed = compose_sound_marks(text);
    let mut result = collapse_first_whitespace_run(composed.trim_start());
    if last_edit_was_suggestion {
        remove_space_before_trailing_punctuation(&mut result);
    }
    result
}

fn compose_sound_marks(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            DAKUTEN => COMBINING_DAKUTEN,
            HANDAKUTEN => COMBINING_HANDAKUTEN,
            _ => c,
        })
        .nfkc()
        .map(|c| match c {
            COMBINING_DAKUTEN => DAKUTEN,
            COMBINING_HANDAKUTEN => HANDAKUTEN,
            _ => c,
        })
        .collect()
}

/// Replace the first run of two or more whitespace characters with a single
/// space. Later runs are left untouched.
fn collapse_first_whitespace_run(text: &str) -> String {
    let mut run_start = None;
    let mut prev: Option<(usize, char)> = None;
    for (i, c) in text.char_indices() {
        if let Some((prev_i, prev_c)) = prev {
            if prev_c.is_whitespace() && c.is_whitespace() {
                run_start = Some(prev_i);
                break;
            }
        }
        prev = Some((i, c));
    }
    let Some(start) = run_start else {
        return text.to_string();
    };
    let end = text[start..]
        .char_indices()
        .find(|&(_, c)| !c.is_whitespace())
        .map_or(text.len(), |(i, _)| start + i);

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push(' ');
    out.push_str(&text[end..]);
    out
}

fn remove_space_before_trailing_punctuation(text: &mut String) {
    let mut rev = text.char_indices().rev();
    let Some((_, last)) = rev.next() else {
        return;
    };
    if !is_trailing_punctuation(last) {
        return;
    }
    if let Some((space_at, ' ')) = rev.next() {
        text.remove(space_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_standalone_dakuten_composes() {
        assert_eq!(normalize("か\u{309B}", false), "が");
        assert_eq!(normalize("は\u{309C}", false), "ぱ");
    }

    #[test]
    fn test_combining_dakuten_composes() {
        assert_eq!(normalize("か\u{3099}", false), "が");
    }

    #[test]
    fn test_uncomposable_mark_stays_standalone() {
        assert_eq!(normalize("a\u{309B}", false), "a\u{309B}");
        assert_eq!(normalize("あ\u{3099}", false), "あ\u{309B}");
    }

    #[test]
    fn test_nfkc_folds_fullwidth() {
        assert_eq!(normalize("ＡＢＣ", false), "ABC");
    }

    #[test]
    fn test_strip_leading_whitespace() {
        assert_eq!(normalize("  hello", false), "hello");
        assert_eq!(normalize("\u{3000}こんにちは", false), "こんにちは");
    }

    #[test]
    fn test_only_first_whitespace_run_collapsed() {
        assert_eq!(normalize("a  b", false), "a b");
        assert_eq!(normalize("a  b   c", false), "a b   c");
        assert_eq!(normalize("a\t\nb", false), "a b");
    }

    #[test]
    fn test_trailing_whitespace_run_collapsed() {
        assert_eq!(normalize("hello   ", false), "hello ");
    }

    #[test]
    fn test_space_before_punctuation_after_suggestion() {
        assert_eq!(normalize("I am fine .", true), "I am fine.");
        assert_eq!(normalize("Really ?", true), "Really?");
        assert_eq!(normalize("Really ?", false), "Really ?");
        // Only a single space is removed.
        assert_eq!(normalize("Yes ,", true), "Yes,");
        assert_eq!(normalize("Hello world", true), "Hello world");
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize("", false), "");
        assert_eq!(normalize("", true), "");
        assert_eq!(normalize("   ", false), "");
    }

    fn at_most_one_whitespace_run(s: &str) -> bool {
        let chars: Vec<char> = s.trim_start().chars().collect();
        let mut runs = 0;
        let mut i = 0;
        while i < chars.len() {
            if chars[i].is_whitespace() {
                let start = i;
                while i < chars.len() && chars[i].is_whitespace() {
                    i += 1;
                }
                if i - start >= 2 {
                    runs += 1;
                }
            } else {
                i += 1;
            }
        }
        runs <= 1
    }

    fn arb_text() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop::sample::select(vec![
                'a', 'I', 'か', 'は', 'あ', 'ン', '漢', '.', '?', ',', ' ', '\t', DAKUTEN,
                HANDAKUTEN, COMBINING_DAKUTEN,
            ]),
            0..24,
        )
        .prop_map(|chars| chars.into_iter().collect::<String>())
        .prop_filter("at most one collapsible whitespace run", |s| {
            at_most_one_whitespace_run(s)
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in arb_text()) {
            let once = normalize(&s, false);
            prop_assert_eq!(normalize(&once, false), once);
        }
    }
}
