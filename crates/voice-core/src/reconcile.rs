//! Merge an AI candidate into the user's in-progress tail.
//!
//! Text near the front of the tail has already been seen by the user, so
//! edits the model makes there are dropped; edits near the end (where the
//! user has not typed further yet) are adopted. This keeps suggestions from
//! flickering while the model extends or fixes the tail.

use dissimilar::Chunk;

/// Edit scripts longer than this are treated as unrelated text.
pub const DEFAULT_MAX_DIFF_OPS: usize = 10;
/// Number of trailing characters of the old tail the model may rewrite.
pub const DEFAULT_STABILITY_MARGIN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub max_ops: usize,
    pub stability_margin: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            max_ops: DEFAULT_MAX_DIFF_OPS,
            stability_margin: DEFAULT_STABILITY_MARGIN,
        }
    }
}

/// One unit of a character-level edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp<'a> {
    Delete(&'a str),
    Equal(&'a str),
    Insert(&'a str),
}

/// Character-level diff with semantic cleanup.
pub fn diff_ops<'a>(old: &'a str, new: &'a str) -> Vec<DiffOp<'a>> {
    dissimilar::diff(old, new)
        .into_iter()
        .map(|chunk| match chunk {
            Chunk::Delete(s) => DiffOp::Delete(s),
            Chunk::Equal(s) => DiffOp::Equal(s),
            Chunk::Insert(s) => DiffOp::Insert(s),
        })
        .collect()
}

/// Reconcile with the default thresholds.
pub fn reconcile(old_tail: &str, candidate: &str) -> String {
    reconcile_with(old_tail, candidate, ReconcileOptions::default())
}

pub fn reconcile_with(old_tail: &str, candidate: &str, opts: ReconcileOptions) -> String {
    let ops = diff_ops(old_tail, candidate);
    if ops.len() > opts.max_ops || !ops.iter().any(|op| matches!(op, DiffOp::Equal(_))) {
        tracing::debug!(ops = ops.len(), "reconcile: candidate unrelated, taking as is");
        return candidate.to_string();
    }

    let stable_len = old_tail
        .chars()
        .count()
        .saturating_sub(opts.stability_margin);
    let mut merged = String::with_capacity(candidate.len());
    let mut merged_len = 0;
    let mut skip_insert = false;

    for op in &ops {
        let in_stable_zone = merged_len < stable_len;
        match *op {
            DiffOp::Equal(s) => {
                merged.push_str(s);
                merged_len += s.chars().count();
                skip_insert = false;
            }
            DiffOp::Delete(s) if in_stable_zone => {
                merged.push_str(s);
                merged_len += s.chars().count();
                skip_insert = true;
            }
            DiffOp::Insert(s) if !in_stable_zone && !skip_insert => {
                merged.push_str(s);
                merged_len += s.chars().count();
            }
            DiffOp::Delete(_) | DiffOp::Insert(_) => {
                skip_insert = false;
            }
        }
    }

    if merged == old_tail {
        return candidate.to_string();
    }
    merged
}
