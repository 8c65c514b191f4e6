//! Bin accumulation: grouping overlapping records from all sources.
//!
//! # Algorithm
//!
//! 1. Peek every source. The record with the lowest start on the active
//!    chromosome seeds the bin span.
//! 2. Sweep all sources, consuming every record whose start falls inside the
//!    bin span and extending the span's end to cover it. A longer record can
//!    expose overlap with records already passed over in other sources, so
//!    the sweep repeats until a full pass consumes nothing.
//! 3. Raise the chromosome floor to the bin start and emit the bin.
//!
//! The growth step is an explicit loop; long overlap chains never deepen the
//! call stack.

use crate::error::{JoinError, Result};
use crate::streaming::cursor::RecordCursor;
use crate::streaming::source::Source;
use crate::streaming::validation::ChromosomeCursor;
use crate::variant::{span_of, VariantRecord, VariantSpan};
use std::collections::BTreeMap;

/// Records from one or more sources whose spans overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBin {
    pub span: VariantSpan,
    /// Source index -> records contributed, in the order consumed.
    pub vars: BTreeMap<usize, Vec<VariantRecord>>,
}

impl VarBin {
    /// Total number of records in the bin.
    pub fn len(&self) -> usize {
        self.vars.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.values().all(Vec::is_empty)
    }

    /// Records contributed by one source.
    pub fn records_from(&self, source_idx: usize) -> &[VariantRecord] {
        self.vars.get(&source_idx).map_or(&[], Vec::as_slice)
    }

    /// Indices of the sources that contributed at least one record.
    pub fn sources(&self) -> impl Iterator<Item = usize> + '_ {
        self.vars.keys().copied()
    }
}

/// Outcome of one accumulation step.
#[derive(Debug)]
pub enum Accumulation {
    Bin(VarBin),
    /// Sources still hold data, but none on the active chromosome.
    NoDataOnChromosome,
    /// Every source is exhausted.
    NoDataAnywhere,
}

enum Seed {
    Span(VariantSpan),
    NoDataOnChromosome,
    NoDataAnywhere,
}

/// Produce the next bin on the active chromosome.
pub fn accumulate_bin<C: RecordCursor>(
    sources: &mut [Source<C>],
    chroms: &mut ChromosomeCursor,
) -> Result<Accumulation> {
    let seed = match seed_span(sources, chroms)? {
        Seed::Span(span) => span,
        Seed::NoDataOnChromosome => return Ok(Accumulation::NoDataOnChromosome),
        Seed::NoDataAnywhere => return Ok(Accumulation::NoDataAnywhere),
    };

    let bin = grow_bin(sources, seed)?;
    chroms.advance_floor(bin.span.start);
    Ok(Accumulation::Bin(bin))
}

/// Peek every source, validate what is seen, and pick the lowest start on
/// the active chromosome. Ties go to the first source; the growth pass
/// admits the others anyway.
fn seed_span<C: RecordCursor>(
    sources: &mut [Source<C>],
    chroms: &ChromosomeCursor,
) -> Result<Seed> {
    let active = chroms
        .active()
        .ok_or_else(|| JoinError::internal("accumulating without an active chromosome"))?;

    let mut any_data = false;
    let mut seed: Option<VariantSpan> = None;

    for source in sources.iter_mut() {
        let idx = source.idx();
        let Some(rec) = source.peek()? else {
            continue;
        };
        any_data = true;
        chroms.validate(&rec.chrom, rec.pos, Some(idx))?;

        if rec.chrom != active {
            continue;
        }
        let span = record_span(rec)?;
        if seed.as_ref().is_none_or(|s| span.start < s.start) {
            seed = Some(span);
        }
    }

    Ok(match seed {
        Some(span) => Seed::Span(span),
        None if any_data => Seed::NoDataOnChromosome,
        None => Seed::NoDataAnywhere,
    })
}

/// Consume overlapping records from all sources until a pass adds nothing.
fn grow_bin<C: RecordCursor>(sources: &mut [Source<C>], seed: VariantSpan) -> Result<VarBin> {
    let mut span = seed;
    let mut vars: BTreeMap<usize, Vec<VariantRecord>> = BTreeMap::new();

    loop {
        let mut consumed = false;

        for source in sources.iter_mut() {
            let idx = source.idx();
            loop {
                match source.peek()? {
                    Some(rec) if span.admits(&rec.chrom, rec.pos) => {
                        if rec.pos < span.start {
                            return Err(JoinError::internal(format!(
                                "record {} from source {} starts before bin {}",
                                rec, idx, span
                            )));
                        }
                    }
                    _ => break,
                }

                let rec = source.advance()?.ok_or_else(|| {
                    JoinError::internal(format!(
                        "record peeked from source {} vanished before it was consumed",
                        idx
                    ))
                })?;
                let rec_span = record_span(&rec)?;
                if rec_span.end > span.end {
                    span.end = rec_span.end;
                }
                vars.entry(idx).or_default().push(rec);
                consumed = true;
            }
        }

        if !consumed {
            break;
        }
    }

    Ok(VarBin { span, vars })
}

fn record_span(rec: &VariantRecord) -> Result<VariantSpan> {
    span_of(rec).ok_or_else(|| {
        JoinError::internal(format!("record {} has no representable span", rec))
    })
}
