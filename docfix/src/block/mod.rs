use std::ops::RangeInclusive;

use crate::document::Document;
use crate::splice::error::SpliceError;

/// The literal pair that delimits a block: a line containing `marker` opens
/// it, the next line whose trimmed text equals `closing` ends it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub marker: String,
    pub closing: String,
}

impl Delimiters {
    pub fn new(marker: impl Into<String>, closing: impl Into<String>) -> Self {
        Delimiters {
            marker: marker.into(),
            closing: closing.into(),
        }
    }
}

/// An inclusive line range inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Index of the marker line.
    pub start: usize,
    /// Index of the closing-token line.
    pub end: usize,
}

impl Block {
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.lines().contains(&index)
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

impl Document {
    /// Find the first block whose marker line is at or after `from`.
    ///
    /// Returns `Ok(None)` when no marker line exists past `from`, and an
    /// error when a marker is found but no closing token follows it.
    pub fn find_block(
        &self,
        delimiters: &Delimiters,
        from: usize,
    ) -> Result<Option<Block>, SpliceError> {
        let Some(start) = (from..self.len()).find(|&i| self.lines[i].contains(&delimiters.marker))
        else {
            return Ok(None);
        };
        match self.closing_after(start, &delimiters.closing) {
            Some(end) => Ok(Some(Block { start, end })),
            None => Err(SpliceError::UnterminatedBlock {
                marker: delimiters.marker.clone(),
                closing: delimiters.closing.clone(),
                line: self.origin_of(start),
            }),
        }
    }

    /// All non-overlapping blocks, in document order.
    pub fn find_blocks(&self, delimiters: &Delimiters) -> Result<Vec<Block>, SpliceError> {
        let mut blocks = Vec::new();
        let mut from = 0;
        while let Some(block) = self.find_block(delimiters, from)? {
            from = block.end + 1;
            blocks.push(block);
        }
        Ok(blocks)
    }

    /// Index of the first line within `block`, at or after `from`, that
    /// contains `needle`.
    pub fn find_within(&self, block: &Block, needle: &str, from: usize) -> Option<usize> {
        (from.max(block.start)..=block.end.min(self.len().saturating_sub(1)))
            .find(|&i| self.lines[i].contains(needle))
    }

    fn closing_after(&self, start: usize, closing: &str) -> Option<usize> {
        (start + 1..self.len()).find(|&i| self.lines[i].is_token(closing))
    }
}
