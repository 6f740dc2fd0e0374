use std::sync::OnceLock;

use icu_segmenter::options::WordBreakInvariantOptions;
use icu_segmenter::{WordSegmenter, WordSegmenterBorrowed};
use unicode_segmentation::UnicodeSegmentation;

/// Word segmentation for scripts written without spaces.
///
/// Returns `None` when the segmenter cannot run (missing dictionary, failed
/// initialization); callers then treat the whole text as one word.
pub trait MorphSegmenter: Send + Sync {
    fn segment(&self, text: &str) -> Option<Vec<String>>;
}

/// Dictionary-backed word segmentation from ICU4X compiled data.
#[derive(Debug, Default, Clone, Copy)]
pub struct IcuWordSegmenter;

impl IcuWordSegmenter {
    fn segmenter() -> &'static WordSegmenterBorrowed<'static> {
        static INSTANCE: OnceLock<WordSegmenterBorrowed<'static>> = OnceLock::new();
        INSTANCE.get_or_init(|| WordSegmenter::new_auto(WordBreakInvariantOptions::default()))
    }
}

impl MorphSegmenter for IcuWordSegmenter {
    fn segment(&self, text: &str) -> Option<Vec<String>> {
        if text.is_empty() {
            return Some(Vec::new());
        }
        let mut breakpoints: Vec<usize> = Self::segmenter().segment_str(text).collect();
        if breakpoints.first().copied() != Some(0) {
            breakpoints.insert(0, 0);
        }
        if breakpoints.last().copied() != Some(text.len()) {
            breakpoints.push(text.len());
        }
        Some(
            breakpoints
                .windows(2)
                .filter(|w| w[0] < w[1])
                .map(|w| text[w[0]..w[1]].to_string())
                .collect(),
        )
    }
}

/// Re-merge fragments that a segmenter split inside one user-perceived
/// character (a base and its combining mark, an emoji ZWJ sequence, a flag).
pub(crate) fn merge_split_clusters(fragments: Vec<String>) -> Vec<String> {
    let joined = fragments.concat();
    let boundaries: Vec<usize> = joined
        .grapheme_indices(true)
        .map(|(i, _)| i)
        .chain(std::iter::once(joined.len()))
        .collect();

    let mut merged: Vec<String> = Vec::with_capacity(fragments.len());
    let mut offset = 0;
    for fragment in fragments {
        if fragment.is_empty() {
            continue;
        }
        let len = fragment.len();
        match merged.last_mut() {
            Some(prev) if boundaries.binary_search(&offset).is_err() => prev.push_str(&fragment),
            _ => merged.push(fragment),
        }
        offset += len;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icu_segments_cover_text() {
        let text = "今日はいい天気ですね";
        let words = IcuWordSegmenter.segment(text).unwrap();
        assert!(words.len() > 1);
        assert_eq!(words.concat(), text);
    }

    #[test]
    fn test_icu_segmenter_built_once() {
        assert!(std::ptr::eq(
            IcuWordSegmenter::segmenter(),
            IcuWordSegmenter::segmenter()
        ));
        let first = IcuWordSegmenter.segment("私は学生です").unwrap();
        let second = IcuWordSegmenter.segment("私は学生です").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_icu_empty() {
        assert_eq!(IcuWordSegmenter.segment(""), Some(Vec::new()));
    }

    #[test]
    fn test_merge_split_combining_mark() {
        let fragments = vec!["か".to_string(), "\u{3099}".to_string(), "ね".to_string()];
        assert_eq!(
            merge_split_clusters(fragments),
            vec!["か\u{3099}".to_string(), "ね".to_string()]
        );
    }

    #[test]
    fn test_merge_split_zwj_sequence() {
        // 👩‍💻 is woman + ZWJ + laptop: one grapheme cluster.
        let fragments = vec![
            "私".to_string(),
            "\u{1F469}".to_string(),
            "\u{200D}\u{1F4BB}".to_string(),
        ];
        assert_eq!(
            merge_split_clusters(fragments),
            vec!["私".to_string(), "\u{1F469}\u{200D}\u{1F4BB}".to_string()]
        );
    }

    #[test]
    fn test_merge_keeps_clean_segments() {
        let fragments = vec!["今日".to_string(), "は".to_string(), String::new()];
        assert_eq!(
            merge_split_clusters(fragments),
            vec!["今日".to_string(), "は".to_string()]
        );
    }
}
