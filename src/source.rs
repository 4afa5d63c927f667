use std::fmt;
use std::ops::Range;

/// 1-based line and column. A zero line means the position is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Location of a node in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub range: Range<usize>,
    pub begin: Position,
}

impl Span {
    pub fn new(range: Range<usize>, begin: Position) -> Self {
        Span { range, begin }
    }

    /// A span pointing at a line and column only, for programmatically built nodes.
    pub fn at(line: u32, column: u32) -> Self {
        Span {
            range: 0..0,
            begin: Position::new(line, column),
        }
    }

    /// Span covering `self` through the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            range: self.range.start..other.range.end.max(self.range.end),
            begin: self.begin,
        }
    }
}

/// Maps byte offsets to line/column positions.
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        LineIndex { line_starts }
    }

    pub fn position(&self, text: &str, offset: usize) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = text
            .get(start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(0);
        Position::new(line as u32 + 1, column as u32 + 1)
    }

    pub fn span(&self, text: &str, range: Range<usize>) -> Span {
        Span::new(range.clone(), self.position(text, range.start))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_line_index_positions() {
        let text = "var a : i32;\nfn main() {\n  a = 1;\n}";
        let index = LineIndex::new(text);
        assert_eq!(index.position(text, 0), Position::new(1, 1));
        assert_eq!(index.position(text, 4), Position::new(1, 5));
        assert_eq!(index.position(text, 13), Position::new(2, 1));
        assert_eq!(index.position(text, 27), Position::new(3, 3));
    }
}
