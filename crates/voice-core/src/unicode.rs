//! Character-level Unicode classification used by the language profiles.

/// Voiced sound mark (dakuten) as a standalone spacing glyph.
pub const DAKUTEN: char = '\u{309B}';
/// Semi-voiced sound mark (handakuten) as a standalone spacing glyph.
pub const HANDAKUTEN: char = '\u{309C}';
/// Combining form of [`DAKUTEN`].
pub const COMBINING_DAKUTEN: char = '\u{3099}';
/// Combining form of [`HANDAKUTEN`].
pub const COMBINING_HANDAKUTEN: char = '\u{309A}';
/// Katakana-hiragana prolonged sound mark.
pub const PROLONGED_SOUND_MARK: char = 'ー';

/// Check the full Hiragana block (U+3040..U+309F). The combining and
/// standalone sound marks live in this block too.
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

pub fn is_kanji(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{20000}'..='\u{2A6DF}').contains(&c)
}

/// Bopomofo (U+3100..U+312F) and its extension block (U+31A0..U+31BF).
pub fn is_bopomofo(c: char) -> bool {
    ('\u{3100}'..='\u{312F}').contains(&c) || ('\u{31A0}'..='\u{31BF}').contains(&c)
}

pub fn is_latin(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Sentence-ending marks of CJK scripts. Each one closes a sentence on its own.
pub fn is_cjk_sentence_end(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '｡')
}

/// Latin sentence-ending marks. These close a sentence only when followed by
/// whitespace.
pub fn is_latin_sentence_end(c: char) -> bool {
    matches!(c, '.' | '?' | '!')
}

/// Punctuation that suggestion chips must not leave a space in front of.
pub fn is_trailing_punctuation(c: char) -> bool {
    matches!(c, ',' | '.' | '?' | '!')
}

/// Fold katakana to hiragana so readings compare equal across the two
/// kana scripts. Other characters, including ー, are kept.
pub fn katakana_to_hiragana(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'ァ'..='ヶ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .collect()
}
