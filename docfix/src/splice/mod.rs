pub mod error;

use crate::block::{Block, Delimiters};
use crate::document::{Document, Line};
use crate::splice::error::SpliceError;

impl Document {
    /// Remove every block after the first one opened by `delimiters.marker`.
    ///
    /// The first marker line is kept untouched, together with whatever
    /// follows it. Each later marker line opens a duplicate that runs to the
    /// next closing-token line; marker lines inside a duplicate belong to it.
    /// Returns the filtered document and the removed ranges, in order.
    pub fn without_duplicates(
        &self,
        delimiters: &Delimiters,
    ) -> Result<(Document, Vec<Block>), SpliceError> {
        let mut seen_first = false;
        let mut open: Option<usize> = None;
        let mut removed = Vec::new();

        for (index, line) in self.lines.iter().enumerate() {
            match open {
                Some(start) => {
                    if line.is_token(&delimiters.closing) {
                        removed.push(Block { start, end: index });
                        open = None;
                    }
                }
                None if line.contains(&delimiters.marker) => {
                    if seen_first {
                        open = Some(index);
                    } else {
                        seen_first = true;
                    }
                }
                None => {}
            }
        }

        if let Some(start) = open {
            return Err(SpliceError::UnterminatedBlock {
                marker: delimiters.marker.clone(),
                closing: delimiters.closing.clone(),
                line: self.origin_of(start),
            });
        }

        for block in &removed {
            tracing::debug!(
                start = self.origin_of(block.start) + 1,
                end = self.origin_of(block.end) + 1,
                "removing duplicate block"
            );
        }

        let mut pending = removed.iter().peekable();
        let mut kept = Vec::with_capacity(self.len());
        for (index, line) in self.lines.iter().enumerate() {
            while pending.next_if(|b| b.end < index).is_some() {}
            if pending.peek().is_some_and(|b| b.contains(index)) {
                continue;
            }
            kept.push(line.clone());
        }

        Ok((Document::from_lines(kept), removed))
    }

    /// Replace the lines strictly between the first line containing `open`
    /// and the next line containing `close`, both searched inside `block`.
    ///
    /// Inserted lines take the terminator of the `open` line (or `\n` if it
    /// has none). Lines outside the replaced span are kept as they are.
    pub fn replace_inner<S: AsRef<str>>(
        &self,
        block: &Block,
        open: &str,
        close: &str,
        replacement: &[S],
    ) -> Result<Document, SpliceError> {
        let open_at = self
            .find_within(block, open, block.start)
            .ok_or_else(|| SpliceError::MissingDelimiter {
                needle: open.to_string(),
                line: self.origin_of(block.start),
            })?;
        let close_at = self
            .find_within(block, close, open_at + 1)
            .ok_or_else(|| SpliceError::MissingDelimiter {
                needle: close.to_string(),
                line: self.origin_of(open_at),
            })?;

        let anchor = &self.lines[open_at];
        let ending = if anchor.ending.is_empty() { "\n" } else { anchor.ending };

        let mut lines = Vec::with_capacity(self.len() + replacement.len());
        lines.extend_from_slice(&self.lines[..=open_at]);
        lines.extend(
            replacement
                .iter()
                .map(|text| Line::new(text.as_ref(), ending, anchor.origin)),
        );
        lines.extend_from_slice(&self.lines[close_at..]);

        tracing::debug!(
            open = anchor.origin + 1,
            replaced = close_at - open_at - 1,
            inserted = replacement.len(),
            "replaced inner span"
        );

        Ok(Document::from_lines(lines))
    }
}
