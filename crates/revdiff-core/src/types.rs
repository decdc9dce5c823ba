//! Diff result types. The JSON shape of [`DiffResult`] is persisted by the
//! workflow layer, so field names are stable.

use serde::{Deserialize, Serialize};

/// Classification of a line in a line-level diff. The four kinds partition
/// the diff: a line belongs to exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Added,
    Removed,
    Unchanged,
    Modified,
}

/// One line of a line-level diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffLine {
    /// 1-based line number in the side the line came from (old for removed,
    /// new for added/unchanged, new for modified).
    pub line_number: u32,
    pub content: String,
    /// Serialized as `type`: the persisted JSON shape predates this code.
    #[serde(rename = "type")]
    pub kind: DiffLineKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line_number: Option<u32>,
}

impl DiffLine {
    pub fn new(line_number: u32, content: impl Into<String>, kind: DiffLineKind) -> Self {
        Self {
            line_number,
            content: content.into(),
            kind,
            old_line_number: None,
            new_line_number: None,
        }
    }
}

/// Per-kind counts for a line diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

/// Full line-level diff between two revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub added: Vec<DiffLine>,
    pub removed: Vec<DiffLine>,
    pub modified: Vec<DiffLine>,
    pub unchanged: Vec<DiffLine>,
    pub summary: DiffSummary,
}

impl DiffResult {
    /// Human-readable summary, e.g. "3 lines added, 1 removed, 2 modified".
    pub fn describe(&self) -> String {
        format!(
            "{} lines added, {} removed, {} modified",
            self.summary.added, self.summary.removed, self.summary.modified
        )
    }
}

/// Classification of a word-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Deleted,
    Unchanged,
}

/// A word-granular change resolved to a page position, used for rendering.
/// Coordinates are in viewport space (top-left origin, y down).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub text: String,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Word-level diff output: positioned changes plus counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordDiff {
    pub changes: Vec<TextChange>,
    pub added: usize,
    pub deleted: usize,
    pub unchanged: usize,
}
