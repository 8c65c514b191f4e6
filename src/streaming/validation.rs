//! Sort validation for the streaming join.
//!
//! Two layers of checks run while records are streamed:
//! 1. Per source ([`SourceOrderValidator`]): chromosomes are contiguous and
//!    positions are non-decreasing within a chromosome.
//! 2. Across sources ([`ChromosomeCursor`]): chromosomes follow the caller's
//!    processing order, a retired chromosome never reappears, and no record
//!    falls below the floor of the active chromosome.
//!
//! Any consistent chromosome order inside a single file is accepted by the
//! first layer; the second decides whether it matches the requested order.

use crate::error::{JoinError, Result};
use crate::genome::ChromOrder;
use crate::vcf::VcfReader;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::path::Path;

/// Inline sort validator for a single source.
///
/// Fed every record as it is pulled from the source, so sort order is
/// checked without a second pass over the file.
#[derive(Debug, Default)]
pub struct SourceOrderValidator {
    source_idx: Option<usize>,
    prev_chrom: Option<String>,
    prev_pos: u64,
    seen_chroms: FxHashSet<String>,
    record_count: usize,
}

impl SourceOrderValidator {
    /// Create a validator whose errors carry no source index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator whose errors name `source_idx`.
    pub fn for_source(source_idx: usize) -> Self {
        Self {
            source_idx: Some(source_idx),
            ..Self::default()
        }
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(&mut self, chrom: &str, pos: u64) -> Result<()> {
        self.record_count += 1;

        if let Some(ref pc) = self.prev_chrom {
            if chrom != pc {
                // Switching chromosomes - check we haven't seen this one before
                if self.seen_chroms.contains(chrom) {
                    return Err(JoinError::data_order(
                        chrom,
                        pos,
                        self.source_idx,
                        format!(
                            "chromosome '{}' at record {} was seen earlier (chromosomes must be contiguous)",
                            chrom, self.record_count
                        ),
                    ));
                }
                self.seen_chroms.insert(pc.clone());
            } else if pos < self.prev_pos {
                return Err(JoinError::data_order(
                    chrom,
                    pos,
                    self.source_idx,
                    format!(
                        "position {} at record {} comes after {}",
                        pos, self.record_count, self.prev_pos
                    ),
                ));
            }
        }

        if self.prev_chrom.as_deref() != Some(chrom) {
            self.prev_chrom = Some(chrom.to_string());
        }
        self.prev_pos = pos;

        Ok(())
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}

/// Chromosome progression shared by all sources during one run.
///
/// Holds the chromosomes still to process, the active one, the ones already
/// retired, and the floor: the lowest position still allowed on the active
/// chromosome.
#[derive(Debug)]
pub struct ChromosomeCursor {
    remaining: VecDeque<String>,
    active: Option<String>,
    seen: FxHashSet<String>,
    floor: u64,
    activations: usize,
}

impl ChromosomeCursor {
    /// Create a cursor over the caller's processing order.
    ///
    /// An empty order is rejected here so the run fails before any source
    /// is touched.
    pub fn new(order: ChromOrder) -> Result<Self> {
        order.ensure_not_empty()?;
        Ok(Self {
            remaining: order.into_vec().into(),
            active: None,
            seen: FxHashSet::default(),
            floor: 0,
            activations: 0,
        })
    }

    /// Make the next chromosome in the order active and reset the floor.
    pub fn activate_next(&mut self) -> Result<&str> {
        let Some(next) = self.remaining.pop_front() else {
            if self.activations == 0 {
                return Err(JoinError::Configuration(
                    "at least one chromosome should be given".to_string(),
                ));
            }
            return Err(JoinError::internal(
                "no chromosome left to activate".to_string(),
            ));
        };
        self.activations += 1;
        self.floor = 0;
        Ok(self.active.insert(next).as_str())
    }

    /// Mark the active chromosome as completed.
    pub fn retire_active(&mut self) {
        if let Some(chrom) = self.active.take() {
            self.seen.insert(chrom);
        }
    }

    /// Check a record peeked from any source against the run's progression.
    ///
    /// Records for chromosomes not yet active pass, unless that chromosome
    /// was already retired.
    pub fn validate(&self, chrom: &str, pos: u64, source_idx: Option<usize>) -> Result<()> {
        if self.seen.contains(chrom) {
            return Err(JoinError::data_order(
                chrom,
                pos,
                source_idx,
                "a chromosome already completed has reappeared",
            ));
        }
        if self.active.as_deref() == Some(chrom) && pos < self.floor {
            return Err(JoinError::data_order(
                chrom,
                pos,
                source_idx,
                format!(
                    "position regression on the active chromosome (floor {})",
                    self.floor
                ),
            ));
        }
        Ok(())
    }

    /// Raise the floor; it never goes down.
    #[inline]
    pub fn advance_floor(&mut self, pos: u64) {
        self.floor = self.floor.max(pos);
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn floor(&self) -> u64 {
        self.floor
    }

    pub fn has_remaining(&self) -> bool {
        !self.remaining.is_empty()
    }

    pub fn is_seen(&self, chrom: &str) -> bool {
        self.seen.contains(chrom)
    }
}

/// Verify that a VCF file is sorted, without joining it.
///
/// With `order`, chromosomes must also appear in that order and be listed in
/// it. Returns the number of records checked.
///
/// # Example
///
/// ```rust,no_run
/// use join_vcfs::streaming::verify_sorted;
///
/// verify_sorted("input.vcf", None).expect("File must be sorted");
/// ```
pub fn verify_sorted<P: AsRef<Path>>(path: P, order: Option<&ChromOrder>) -> Result<usize> {
    let reader = VcfReader::from_path(path.as_ref())?;
    let rank: Option<Vec<&String>> = order.map(|o| o.chromosomes().collect());

    let mut validator = SourceOrderValidator::new();
    let mut prev_rank: Option<usize> = None;

    for result in reader.records() {
        let rec = result?;
        validator.validate(&rec.chrom, rec.pos)?;

        if let Some(ref rank) = rank {
            let current = rank.iter().position(|c| **c == rec.chrom).ok_or_else(|| {
                JoinError::data_order(
                    &rec.chrom,
                    rec.pos,
                    None,
                    "chromosome not found in the processing order",
                )
            })?;
            if prev_rank.is_some_and(|prev| current < prev) {
                return Err(JoinError::data_order(
                    &rec.chrom,
                    rec.pos,
                    None,
                    "chromosome appears earlier in the processing order than its predecessor",
                ));
            }
            prev_rank = Some(current);
        }
    }

    Ok(validator.record_count())
}
