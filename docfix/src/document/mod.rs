use std::fmt;
use std::ops::Range;

/// A text file held as an ordered sequence of lines.
///
/// Lines keep their own terminators, so a document that was parsed and never
/// touched renders back to exactly the bytes it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub(crate) lines: Vec<Line>,
}

/// A single line of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Line content without its terminator.
    pub text: String,
    /// `"\n"`, `"\r\n"`, or empty for a final unterminated line.
    pub ending: &'static str,
    /// 0-based index of the source line this line came from. Inserted lines
    /// borrow the origin of the line they were inserted after.
    pub origin: usize,
}

impl Line {
    pub fn new(text: impl Into<String>, ending: &'static str, origin: usize) -> Self {
        Line {
            text: text.into(),
            ending,
            origin,
        }
    }

    /// True if the line contains `needle` anywhere.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// True if the line, trimmed of surrounding whitespace, is exactly `token`.
    pub fn is_token(&self, token: &str) -> bool {
        self.text.trim() == token
    }
}

impl Document {
    pub fn from_lines(lines: Vec<Line>) -> Self {
        Document { lines }
    }

    /// Split `source` into lines, recording each line's terminator.
    pub fn parse(source: &str) -> Self {
        let lines = source
            .split_inclusive('\n')
            .enumerate()
            .map(|(origin, raw)| {
                if let Some(text) = raw.strip_suffix("\r\n") {
                    Line::new(text, "\r\n", origin)
                } else if let Some(text) = raw.strip_suffix('\n') {
                    Line::new(text, "\n", origin)
                } else {
                    Line::new(raw, "", origin)
                }
            })
            .collect();
        Document { lines }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines.iter().filter(|l| l.contains(needle)).count()
    }

    /// Byte range of line `index`'s text (terminator excluded) in the
    /// rendered document. Out-of-range indices yield an empty range at the end.
    pub fn line_span(&self, index: usize) -> Range<usize> {
        let start: usize = self
            .lines
            .iter()
            .take(index)
            .map(|l| l.text.len() + l.ending.len())
            .sum();
        match self.lines.get(index) {
            Some(line) => start..start + line.text.len(),
            None => start..start,
        }
    }

    pub(crate) fn origin_of(&self, index: usize) -> usize {
        self.lines.get(index).map(|l| l.origin).unwrap_or(index)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            write!(f, "{}{}", line.text, line.ending)?;
        }
        Ok(())
    }
}
