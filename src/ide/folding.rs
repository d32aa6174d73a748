//! Folding ranges — collapsible elements and comments.

use crate::base::{LineIndex, TextRange, TextSize, TextSource};
use crate::syntax::XDocument;

/// A folding range with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldingRange {
    /// Start line (0-indexed)
    pub start_line: u32,
    /// Start column (0-indexed)
    pub start_col: u32,
    /// End line (0-indexed)
    pub end_line: u32,
    /// End column (0-indexed)
    pub end_col: u32,
    /// Whether this is a comment region
    pub is_comment: bool,
}

/// Get folding ranges for a document.
///
/// Returns every element and `<!-- -->` comment spanning more than one line.
pub fn folding_ranges(doc: &XDocument) -> Vec<FoldingRange> {
    let index = doc.line_index();
    let elements = doc.elements().into_iter().map(|el| (el.range, false));
    let comments = comment_ranges(doc.text()).into_iter().map(|r| (r, true));

    let mut ranges: Vec<FoldingRange> = elements
        .chain(comments)
        .filter_map(|(range, is_comment)| multiline(index, range, is_comment))
        .collect();

    // Sort by start line
    ranges.sort_by_key(|r| (r.start_line, r.start_col));

    ranges
}

fn multiline(index: &LineIndex, range: TextRange, is_comment: bool) -> Option<FoldingRange> {
    let (start, end) = index.line_cols(range);
    (end.line > start.line).then_some(FoldingRange {
        start_line: start.line,
        start_col: start.col,
        end_line: end.line,
        end_col: end.col,
        is_comment,
    })
}

fn comment_ranges(text: &str) -> Vec<TextRange> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(open) = text[pos..].find("<!--").map(|i| pos + i) {
        let end = text[open + 4..].find("-->").map_or(text.len(), |i| open + 4 + i + 3);
        out.push(TextRange::new(TextSize::from(open as u32), TextSize::from(end as u32)));
        pos = end;
    }
    out
}
