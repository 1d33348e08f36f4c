//! Source span tracking for diagnostics.

use serde::Serialize;

/// Represents a position in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from the start of the file
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

/// Represents a span in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    /// Start position
    pub start: Position,
    /// End position
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Merge two spans into one that covers both
    pub fn merge(&self, other: &Span) -> Span {
        let start = if self.start.offset < other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset > other.end.offset {
            self.end
        } else {
            other.end
        };
        Span { start, end }
    }
}

/// Byte offsets of every line start, for turning offsets into positions
/// without rescanning the source.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Convert a byte offset to a position. Columns count characters, not bytes.
    pub fn position(&self, source: &str, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count())
            + 1;

        Position::new(line + 1, column, offset)
    }

    pub fn span(&self, source: &str, start: usize, end: usize) -> Span {
        Span::new(self.position(source, start), self.position(source, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_across_lines() {
        let source = "let a\n  b\nc";
        let index = LineIndex::new(source);

        assert_eq!(index.position(source, 0), Position::new(1, 1, 0));
        assert_eq!(index.position(source, 4), Position::new(1, 5, 4));
        assert_eq!(index.position(source, 8), Position::new(2, 3, 8));
        assert_eq!(index.position(source, 10), Position::new(3, 1, 10));
    }

    #[test]
    fn test_columns_count_characters() {
        let source = "\"é\" x";
        let index = LineIndex::new(source);
        let offset = source.find('x').unwrap();

        assert_eq!(index.position(source, offset).column, 5);
    }

    #[test]
    fn test_merge() {
        let a = Span::new(Position::new(1, 1, 0), Position::new(1, 4, 3));
        let b = Span::new(Position::new(1, 6, 5), Position::new(1, 9, 8));
        let merged = a.merge(&b);

        assert_eq!(merged.start.offset, 0);
        assert_eq!(merged.end.offset, 8);
    }
}
