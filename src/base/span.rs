//! Source text positions and ranges.

use std::fmt;

// Re-export from text-size for compatibility
pub use text_size::TextRange;
pub use text_size::TextSize;

/// A line and column position in source text.
///
/// Both line and column are 0-indexed internally, but displayed as 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord)]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes, not characters)
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Index for converting between byte offsets and line/column positions.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }
        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a line/column position.
    ///
    /// Offsets past the end of the text clamp to the last position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Convert a range to its start and end line/column positions.
    pub fn line_cols(&self, range: TextRange) -> (LineCol, LineCol) {
        (self.line_col(range.start()), self.line_col(range.end()))
    }

    /// Convert a line/column position to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let line_start = self.line_starts.get(line_col.line as usize)?;
        let offset = *line_start + TextSize::from(line_col.col);
        (offset <= self.len).then_some(offset)
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == TextSize::from(0)
    }
}

/// Offset to text access over a document.
///
/// Expression nodes and XML spans are offsets into the *original* document;
/// a `TextSource` turns them back into text.
pub trait TextSource {
    /// The complete document text.
    fn text(&self) -> &str;

    /// Slice the document, returning `None` for out-of-bounds or non-boundary ranges.
    fn slice(&self, range: TextRange) -> Option<&str> {
        self.text().get(usize::from(range.start())..usize::from(range.end()))
    }

    /// Total length of the document.
    fn len(&self) -> TextSize {
        TextSize::of(self.text())
    }
}

impl TextSource for str {
    fn text(&self) -> &str {
        self
    }
}

impl TextSource for String {
    fn text(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_display() {
        assert_eq!(format!("{}", LineCol::new(0, 0)), "1:1");
        assert_eq!(format!("{}", LineCol::new(5, 10)), "6:11");
    }

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("<Project>\n  <PropertyGroup/>\n</Project>");

        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(9)), LineCol::new(0, 9));
        assert_eq!(index.line_col(TextSize::from(10)), LineCol::new(1, 0));
        assert_eq!(index.line_col(TextSize::from(13)), LineCol::new(1, 3));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_line_index_clamps_past_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_col(TextSize::from(99)), LineCol::new(1, 2));
    }

    #[test]
    fn test_line_index_offset() {
        let index = LineIndex::new("<A>\n<B/>");

        assert_eq!(index.offset(LineCol::new(0, 0)), Some(TextSize::from(0)));
        assert_eq!(index.offset(LineCol::new(1, 1)), Some(TextSize::from(5)));
        assert_eq!(index.offset(LineCol::new(1, 40)), None);
        assert_eq!(index.offset(LineCol::new(7, 0)), None);
    }

    #[test]
    fn test_text_source_slice() {
        let text = "$(Foo)";
        let range = TextRange::new(TextSize::from(2), TextSize::from(5));
        assert_eq!(text.slice(range), Some("Foo"));
        let past_end = TextRange::new(TextSize::from(2), TextSize::from(50));
        assert_eq!(text.slice(past_end), None);
    }
}
