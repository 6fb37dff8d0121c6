use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a token or instruction.
///
/// Sui is line-oriented, so a span never crosses a line boundary.
/// Line and column values are 1-based for human-readable diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub end_column: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(line: u32, column: u32, end_column: u32) -> Self {
        Self {
            line,
            column,
            end_column,
        }
    }

    /// Span covering a whole line, starting at column 1.
    pub fn line(line: u32) -> Self {
        Self::new(line, 1, 1)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Holds the source text for error reporting.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        if idx >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1)) // strip the \n
            .unwrap_or(self.source.len());
        let line = &self.source[start..end];
        Some(line.trim_end_matches('\r'))
    }

    /// Iterate over `(line_number, text)` pairs, 1-based.
    pub fn lines(&self) -> impl Iterator<Item = (u32, &str)> {
        (1..=self.line_count() as u32).filter_map(move |n| self.line(n).map(|l| (n, l)))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        let s = Span::new(3, 7, 15);
        assert_eq!(format!("{s}"), "3:7");
    }

    #[test]
    fn test_source_file_line_extraction() {
        let src = SourceFile::new("test.sui", "= g0 1\n. g0\n; done");
        assert_eq!(src.line(1), Some("= g0 1"));
        assert_eq!(src.line(2), Some(". g0"));
        assert_eq!(src.line(3), Some("; done"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.line(4), None);
    }

    #[test]
    fn test_source_file_crlf() {
        let src = SourceFile::new("test.sui", "= g0 1\r\n. g0\r\n");
        assert_eq!(src.line(1), Some("= g0 1"));
        assert_eq!(src.line(2), Some(". g0"));
    }

    #[test]
    fn test_source_file_lines_iterator() {
        let src = SourceFile::new("test.sui", "a\nb\nc");
        let lines: Vec<_> = src.lines().collect();
        assert_eq!(lines, vec![(1, "a"), (2, "b"), (3, "c")]);
    }

    #[test]
    fn test_source_file_empty() {
        let src = SourceFile::new("test.sui", "");
        assert_eq!(src.line_count(), 1);
        assert_eq!(src.line(1), Some(""));
    }
}
