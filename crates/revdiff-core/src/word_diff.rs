//! Word-level diff resolved back to page positions.
//!
//! Both sides are flattened into ordered word arrays, space-joined, and run
//! through a word-level LCS diff (`similar`, Myers). Diff parts are walked
//! with independent cursors into the old and new word arrays; each changed
//! word is matched back to a bounding box near its cursor. Extraction noise
//! (run splitting, ligatures) means exact alignment is not guaranteed, so
//! the lookup searches a bounded window and falls back to the cursor's box:
//! a change always renders near its true location instead of being dropped.

use crate::types::{ChangeKind, TextChange, WordDiff};
use shared_pdf::{PageText, WordBox};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;
use tracing::debug;

/// How far from the cursor an exact text match is trusted.
const ALIGNMENT_WINDOW: usize = 5;

/// Estimated glyph advance as a fraction of box height, for fallback widths.
const FALLBACK_GLYPH_FACTOR: f64 = 0.5;

/// Diff two extracted revisions word by word.
pub fn diff_words(old_pages: &[PageText], new_pages: &[PageText]) -> WordDiff {
    let old_words = flatten(old_pages);
    let new_words = flatten(new_pages);
    let old_widths = page_widths(old_pages);
    let new_widths = page_widths(new_pages);

    let old_joined = join(&old_words);
    let new_joined = join(&new_words);
    let diff = TextDiff::from_words(&old_joined, &new_joined);

    let mut changes = Vec::new();
    let mut added = 0usize;
    let mut deleted = 0usize;
    let mut unchanged = 0usize;
    let mut old_cursor = 0usize;
    let mut new_cursor = 0usize;

    for change in diff.iter_all_changes() {
        let token = change.value();
        // Word-mode diffing emits whitespace separators as their own
        // tokens; only word tokens move the cursors.
        if token.trim().is_empty() {
            continue;
        }
        match change.tag() {
            ChangeTag::Equal => {
                unchanged += 1;
                old_cursor += 1;
                new_cursor += 1;
            }
            ChangeTag::Insert => {
                if let Some(tc) =
                    resolve_change(ChangeKind::Added, token, &new_words, new_cursor, &new_widths)
                {
                    changes.push(tc);
                    added += 1;
                }
                new_cursor += 1;
            }
            ChangeTag::Delete => {
                if let Some(tc) = resolve_change(
                    ChangeKind::Deleted,
                    token,
                    &old_words,
                    old_cursor,
                    &old_widths,
                ) {
                    changes.push(tc);
                    deleted += 1;
                }
                old_cursor += 1;
            }
        }
    }

    debug!(added, deleted, unchanged, "word diff computed");
    WordDiff {
        changes,
        added,
        deleted,
        unchanged,
    }
}

fn flatten(pages: &[PageText]) -> Vec<WordBox> {
    pages.iter().flat_map(|p| p.words.iter().cloned()).collect()
}

fn join(words: &[WordBox]) -> String {
    words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn page_widths(pages: &[PageText]) -> BTreeMap<u32, f64> {
    pages.iter().map(|p| (p.page_number, p.width)).collect()
}

/// Locate the box for a changed word.
///
/// Searches outward from the cursor for an exact text match within
/// [`ALIGNMENT_WINDOW`] positions; on a miss, uses the box at the cursor
/// position with a width estimated from the word's character count, clamped
/// to the anchor page's right edge. Returns `None` only when the word array
/// is empty.
fn resolve_change(
    kind: ChangeKind,
    text: &str,
    words: &[WordBox],
    cursor: usize,
    widths: &BTreeMap<u32, f64>,
) -> Option<TextChange> {
    if words.is_empty() {
        return None;
    }

    for delta in 0..=ALIGNMENT_WINDOW {
        let forward = cursor + delta;
        if forward < words.len() && words[forward].text == text {
            return Some(change_from_box(kind, text, &words[forward], None));
        }
        if delta > 0 {
            if let Some(back) = cursor.checked_sub(delta) {
                if back < words.len() && words[back].text == text {
                    return Some(change_from_box(kind, text, &words[back], None));
                }
            }
        }
    }

    let anchor = &words[cursor.min(words.len() - 1)];
    let mut estimated =
        (text.chars().count() as f64 * anchor.height * FALLBACK_GLYPH_FACTOR).max(1.0);
    if let Some(page_width) = widths.get(&anchor.page) {
        estimated = estimated.min((page_width - anchor.x).max(1.0));
    }
    Some(change_from_box(kind, text, anchor, Some(estimated)))
}

fn change_from_box(
    kind: ChangeKind,
    text: &str,
    word: &WordBox,
    width_override: Option<f64>,
) -> TextChange {
    TextChange {
        kind,
        text: text.to_string(),
        page: word.page,
        x: word.x,
        y: word.y,
        width: width_override.unwrap_or(word.width),
        height: word.height,
    }
}
