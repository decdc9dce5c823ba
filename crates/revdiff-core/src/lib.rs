//! Revision comparison engines for legal-article documents.
//!
//! Two granularities:
//! - [`line_diff::diff_lines`] -- set/similarity comparison over trimmed
//!   lines, producing the persisted [`DiffResult`] summary.
//! - [`word_diff::diff_words`] -- sequence-alignment comparison over
//!   position-tagged words, producing [`TextChange`]s for visual markup.

pub mod line_diff;
pub mod types;
pub mod word_diff;

pub use line_diff::diff_lines;
pub use types::{
    ChangeKind, DiffLine, DiffLineKind, DiffResult, DiffSummary, TextChange, WordDiff,
};
pub use word_diff::diff_words;
