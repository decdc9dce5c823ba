//! Position-tagged text types produced by extraction.

use serde::{Deserialize, Serialize};

/// A single word and its bounding rectangle on a page.
///
/// Coordinates are in viewport space: origin at the top-left of the page,
/// y growing downward. Pages are 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordBox {
    pub text: String,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WordBox {
    /// Clamp the box so it lies entirely within the page and has positive
    /// dimensions. Degenerate boxes are nudged to a minimum of 1pt.
    pub fn clamped(mut self, page_width: f64, page_height: f64) -> Self {
        self.width = self.width.max(1.0).min(page_width);
        self.height = self.height.max(1.0).min(page_height);
        self.x = self.x.clamp(0.0, (page_width - self.width).max(0.0));
        self.y = self.y.clamp(0.0, (page_height - self.height).max(0.0));
        self
    }
}

/// All words extracted from one page, in content-stream order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    pub page_number: u32,
    pub words: Vec<WordBox>,
    pub width: f64,
    pub height: f64,
}

impl PageText {
    /// Words grouped into visual lines.
    ///
    /// Words are kept in content-stream order and a new line starts
    /// whenever the vertical position shifts by more than a point, which
    /// covers the ordinary top-down layout of article text.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut last_y: Option<f64> = None;

        for word in &self.words {
            let line_break = last_y.is_some_and(|y| (word.y - y).abs() > 1.0);
            if line_break && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word.text);
            last_y = Some(word.y);
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    /// The page text with words space-joined and lines newline-joined.
    pub fn joined(&self) -> String {
        self.lines().join("\n")
    }
}
