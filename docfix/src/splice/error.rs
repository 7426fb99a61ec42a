use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::document::Document;

/// Structural errors raised while locating or splicing blocks.
///
/// `line` is always the 0-based origin line in the source file, so the error
/// still points at the right place after earlier passes removed lines.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpliceError {
    #[error("unterminated block: no line equal to `{closing}` after `{marker}`")]
    UnterminatedBlock {
        marker: String,
        closing: String,
        line: usize,
    },

    #[error("missing delimiter: no line containing `{needle}` inside the block")]
    MissingDelimiter { needle: String, line: usize },
}

impl SpliceError {
    pub fn line(&self) -> usize {
        match self {
            SpliceError::UnterminatedBlock { line, .. } => *line,
            SpliceError::MissingDelimiter { line, .. } => *line,
        }
    }

    /// Convert to a codespan-reporting Diagnostic against the document the
    /// file was originally parsed into.
    pub fn to_diagnostic(&self, source: &Document, file_id: usize) -> Diagnostic<usize> {
        let span = source.line_span(self.line());
        let (label, note) = match self {
            SpliceError::UnterminatedBlock { closing, .. } => (
                "block starts here",
                format!("the block must end with a line containing only `{}`", closing),
            ),
            SpliceError::MissingDelimiter { needle, .. } => (
                "searched from here",
                format!("nothing was written; add a `{}` line or fix the block", needle),
            ),
        };
        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![Label::primary(file_id, span).with_message(label)])
            .with_notes(vec![note])
    }
}
