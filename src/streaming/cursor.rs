//! Forward-only record cursors with one record of lookahead.

use crate::error::{JoinError, Result};
use crate::streaming::validation::SourceOrderValidator;
use crate::variant::VariantRecord;

/// A forward-only stream of records that can look one record ahead.
///
/// Once `peek` or `advance` returns `None` the cursor is exhausted for good.
pub trait RecordCursor {
    /// Look at the next record without consuming it.
    fn peek(&mut self) -> Result<Option<&VariantRecord>>;

    /// Consume and return the next record.
    fn advance(&mut self) -> Result<Option<VariantRecord>>;

    /// Whether the cursor has no records left.
    fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_none())
    }
}

/// Lookahead adapter over any fallible record iterator.
///
/// Each record is checked for per-source sort order the moment it is pulled
/// into the lookahead slot.
pub struct PeekableCursor<I> {
    iter: I,
    peeked: Option<VariantRecord>,
    exhausted: bool,
    validator: SourceOrderValidator,
}

impl<I, E> PeekableCursor<I>
where
    I: Iterator<Item = std::result::Result<VariantRecord, E>>,
    E: Into<JoinError>,
{
    pub fn new(iter: I, source_idx: usize) -> Self {
        Self {
            iter,
            peeked: None,
            exhausted: false,
            validator: SourceOrderValidator::for_source(source_idx),
        }
    }

    /// Number of records pulled from the underlying iterator so far.
    pub fn records_read(&self) -> usize {
        self.validator.record_count()
    }

    fn fill(&mut self) -> Result<()> {
        if self.peeked.is_some() || self.exhausted {
            return Ok(());
        }
        match self.iter.next() {
            Some(result) => {
                let rec = result.map_err(Into::into)?;
                self.validator.validate(&rec.chrom, rec.pos)?;
                self.peeked = Some(rec);
            }
            None => self.exhausted = true,
        }
        Ok(())
    }
}

impl<I, E> RecordCursor for PeekableCursor<I>
where
    I: Iterator<Item = std::result::Result<VariantRecord, E>>,
    E: Into<JoinError>,
{
    fn peek(&mut self) -> Result<Option<&VariantRecord>> {
        self.fill()?;
        Ok(self.peeked.as_ref())
    }

    fn advance(&mut self) -> Result<Option<VariantRecord>> {
        self.fill()?;
        Ok(self.peeked.take())
    }
}
