//! Core variant types and span calculation.

use std::fmt;

/// One variant line from one source.
/// Positions are 1-based (VCF convention).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u64,
    pub id: Option<String>,
    /// Reference allele first, then alternates.
    pub alleles: Vec<String>,
    /// Raw per-sample GT values, carried through untouched.
    pub genotypes: Vec<String>,
}

impl VariantRecord {
    /// Create a record with no ID and no genotypes.
    pub fn new<S: Into<String>>(chrom: impl Into<String>, pos: u64, alleles: Vec<S>) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            id: None,
            alleles: alleles.into_iter().map(Into::into).collect(),
            genotypes: Vec::new(),
        }
    }

    /// Attach per-sample genotypes (builder pattern).
    pub fn with_genotypes<S: Into<String>>(mut self, genotypes: Vec<S>) -> Self {
        self.genotypes = genotypes.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    #[inline]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Genomic span of this record, or `None` if it carries no alleles.
    #[inline]
    pub fn span(&self) -> Option<VariantSpan> {
        span_of(self)
    }
}

impl fmt::Display for VariantRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.chrom, self.pos, self.alleles.join("/"))
    }
}

/// Inclusive genomic interval `[start, end]` occupied by a variant or a bin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantSpan {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl VariantSpan {
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Number of reference positions covered.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end + 1 - self.start
    }

    /// Spans are inclusive, so never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether a span starting at `start` on `chrom` reaches into this bin.
    ///
    /// Only the start is compared: spans that begin inside the bin overlap it
    /// regardless of how far they extend.
    #[inline]
    pub fn admits(&self, chrom: &str, start: u64) -> bool {
        self.chrom == chrom && start <= self.end
    }

    /// Tuple form, handy for assertions.
    pub fn as_tuple(&self) -> (&str, u64, u64) {
        (self.chrom.as_str(), self.start, self.end)
    }
}

impl fmt::Display for VariantSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// Compute the span of a record: `end = pos + longest allele - 1`.
///
/// Returns `None` when the record has no non-empty allele or the end does
/// not fit in a `u64`; the parser never produces such records.
#[inline]
pub fn span_of(record: &VariantRecord) -> Option<VariantSpan> {
    let longest = record.alleles.iter().map(String::len).max()?;
    if longest == 0 {
        return None;
    }
    Some(VariantSpan {
        chrom: record.chrom.clone(),
        start: record.pos,
        end: record.pos.checked_add(longest as u64 - 1)?,
    })
}
