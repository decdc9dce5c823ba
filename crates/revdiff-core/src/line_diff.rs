//! Line-level diff: set membership plus fuzzy modification pairing.
//!
//! Lines are compared as whole trimmed strings. Lines present on only one
//! side are candidates for `removed`/`added`; candidate pairs whose
//! normalized edit-distance similarity exceeds 0.5 are reclassified as
//! `modified`. The pairing scan is first-match-wins from the tail of each
//! list -- not globally optimal, but the `> 0.5` threshold semantics must
//! stay stable because callers persist the resulting summaries.

use crate::types::{DiffLine, DiffLineKind, DiffResult, DiffSummary};
use std::collections::HashSet;
use tracing::debug;

/// Similarity above which a removed/added pair counts as one modified line.
const MODIFIED_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Compare two plain-text revisions line by line.
pub fn diff_lines(old_text: &str, new_text: &str) -> DiffResult {
    let old_lines = normalize(old_text);
    let new_lines = normalize(new_text);

    let old_set: HashSet<&str> = old_lines.iter().map(String::as_str).collect();
    let new_set: HashSet<&str> = new_lines.iter().map(String::as_str).collect();

    let mut removed: Vec<DiffLine> = old_lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !new_set.contains(line.as_str()))
        .map(|(i, line)| {
            let mut dl = DiffLine::new(i as u32 + 1, line.clone(), DiffLineKind::Removed);
            dl.old_line_number = Some(i as u32 + 1);
            dl
        })
        .collect();

    let mut added: Vec<DiffLine> = new_lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !old_set.contains(line.as_str()))
        .map(|(i, line)| {
            let mut dl = DiffLine::new(i as u32 + 1, line.clone(), DiffLineKind::Added);
            dl.new_line_number = Some(i as u32 + 1);
            dl
        })
        .collect();

    let unchanged: Vec<DiffLine> = new_lines
        .iter()
        .enumerate()
        .filter(|(_, line)| old_set.contains(line.as_str()))
        .map(|(i, line)| DiffLine::new(i as u32 + 1, line.clone(), DiffLineKind::Unchanged))
        .collect();

    let modified = pair_modifications(&mut removed, &mut added);

    debug!(
        added = added.len(),
        removed = removed.len(),
        modified = modified.len(),
        unchanged = unchanged.len(),
        "line diff computed"
    );

    let summary = DiffSummary {
        added: added.len(),
        removed: removed.len(),
        modified: modified.len(),
        unchanged: unchanged.len(),
    };
    DiffResult {
        added,
        removed,
        modified,
        unchanged,
        summary,
    }
}

/// Split on line breaks, trim, and drop empty lines. Order and duplicates
/// are preserved.
fn normalize(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reclassify similar removed/added pairs as modified.
///
/// Scans both lists from their ends; each removed line pairs with at most
/// one added line, the first whose similarity clears the threshold. Every
/// reclassified pair leaves both input lists, so
/// `removed_before == removed_after + modified` (and symmetrically for
/// added) holds by construction.
fn pair_modifications(removed: &mut Vec<DiffLine>, added: &mut Vec<DiffLine>) -> Vec<DiffLine> {
    let mut modified = Vec::new();

    let mut i = removed.len();
    while i > 0 {
        i -= 1;
        let mut paired = None;
        let mut j = added.len();
        while j > 0 {
            j -= 1;
            if similarity(&removed[i].content, &added[j].content) > MODIFIED_SIMILARITY_THRESHOLD {
                paired = Some(j);
                break;
            }
        }
        if let Some(j) = paired {
            let old = removed.remove(i);
            let new = added.remove(j);
            let mut line = DiffLine::new(
                new.line_number,
                new.content.clone(),
                DiffLineKind::Modified,
            );
            line.old_line_number = old.old_line_number;
            line.new_line_number = new.new_line_number;
            modified.push(line);
        }
    }

    // The backward scan accumulates in reverse document order.
    modified.sort_by_key(|l| l.new_line_number);
    modified
}

/// Normalized similarity in [0, 1]: `(max_len - levenshtein) / max_len`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    (max_len - levenshtein(a, b)) as f64 / max_len as f64
}

/// Character-level edit distance, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
