//! Lazy, forward-only stream of variant bins across all sources.
//!
//! The stream owns every source and the chromosome progression for the
//! whole run. Each call to `next` runs accumulation to completion for one
//! bin; nothing happens in between. Dropping the stream early releases the
//! sources.

use crate::error::Result;
use crate::genome::ChromOrder;
use crate::streaming::accumulator::{accumulate_bin, Accumulation, VarBin};
use crate::streaming::cursor::RecordCursor;
use crate::streaming::source::Source;
use crate::streaming::validation::ChromosomeCursor;
use log::{debug, warn};
use std::iter::FusedIterator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingActivation,
    Accumulating,
    Exhausted,
}

/// Iterator over [`VarBin`]s in processing order.
///
/// Yields `Err` at most once; the stream is exhausted afterwards.
pub struct BinStream<C> {
    sources: Vec<Source<C>>,
    chroms: ChromosomeCursor,
    state: State,
    bins_emitted: usize,
}

impl<C: RecordCursor> BinStream<C> {
    /// Create the stream. Fails on an empty chromosome order without
    /// touching any source.
    pub fn new(sources: Vec<Source<C>>, order: ChromOrder) -> Result<Self> {
        let chroms = ChromosomeCursor::new(order)?;
        Ok(Self {
            sources,
            chroms,
            state: State::AwaitingActivation,
            bins_emitted: 0,
        })
    }

    pub fn sources(&self) -> &[Source<C>] {
        &self.sources
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn bins_emitted(&self) -> usize {
        self.bins_emitted
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    fn next_bin(&mut self) -> Result<Option<VarBin>> {
        loop {
            match self.state {
                State::AwaitingActivation => {
                    let chrom = self.chroms.activate_next()?;
                    debug!("processing chromosome {}", chrom);
                    self.state = State::Accumulating;
                }
                State::Accumulating => {
                    match accumulate_bin(&mut self.sources, &mut self.chroms)? {
                        Accumulation::Bin(bin) => {
                            debug!("bin {} ({} records)", bin.span, bin.len());
                            self.bins_emitted += 1;
                            return Ok(Some(bin));
                        }
                        Accumulation::NoDataOnChromosome => {
                            if let Some(chrom) = self.chroms.active() {
                                debug!("chromosome {} done", chrom);
                            }
                            self.chroms.retire_active();
                            if self.chroms.has_remaining() {
                                self.state = State::AwaitingActivation;
                            } else {
                                self.warn_unprocessed();
                                self.state = State::Exhausted;
                            }
                        }
                        Accumulation::NoDataAnywhere => {
                            debug!("all sources exhausted after {} bins", self.bins_emitted);
                            self.state = State::Exhausted;
                        }
                    }
                }
                State::Exhausted => return Ok(None),
            }
        }
    }

    /// Records left behind on chromosomes outside the processing order.
    fn warn_unprocessed(&mut self) {
        for source in self.sources.iter_mut() {
            let idx = source.idx();
            match source.peek() {
                Ok(Some(rec)) => warn!(
                    "source {} still has records from {} on, which is not in the chromosome order; they are skipped",
                    idx,
                    rec.span().map_or_else(|| rec.chrom.clone(), |s| s.to_string())
                ),
                Ok(None) => {}
                Err(e) => warn!(
                    "source {} has unread records outside the chromosome order that could not be read: {}",
                    idx, e
                ),
            }
        }
    }
}

impl<C: RecordCursor> Iterator for BinStream<C> {
    type Item = Result<VarBin>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_bin() {
            Ok(Some(bin)) => Some(Ok(bin)),
            Ok(None) => None,
            Err(e) => {
                self.state = State::Exhausted;
                Some(Err(e))
            }
        }
    }
}

impl<C: RecordCursor> FusedIterator for BinStream<C> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JoinError;
    use crate::streaming::cursor::PeekableCursor;
    use crate::variant::VariantRecord;
    use crate::vcf::{VcfError, VcfMetadata};

    type TestSource = Source<PeekableCursor<std::vec::IntoIter<Result<VariantRecord>>>>;

    fn source(idx: usize, records: &[(&str, u64, &str)]) -> TestSource {
        let records: Vec<Result<VariantRecord>> = records
            .iter()
            .map(|(chrom, pos, reference)| Ok(VariantRecord::new(*chrom, *pos, vec![*reference, "A"])))
            .collect();
        let metadata = VcfMetadata {
            samples: vec![format!("S{}", idx)],
            ploidy: 2,
        };
        Source::new(idx, metadata, PeekableCursor::new(records.into_iter(), idx))
    }

    fn spans(stream: BinStream<PeekableCursor<std::vec::IntoIter<Result<VariantRecord>>>>) -> Vec<(String, u64, u64)> {
        stream
            .map(|bin| {
                let bin = bin.unwrap();
                (bin.span.chrom, bin.span.start, bin.span.end)
            })
            .collect()
    }

    #[test]
    fn test_empty_order_fails_fast() {
        let result = BinStream::new(vec![source(0, &[("1", 1, "A")])], ChromOrder::default());
        assert!(matches!(result, Err(JoinError::Configuration(_))));
    }

    #[test]
    fn test_walks_chromosomes_in_order() {
        let sources = vec![
            source(0, &[("1", 4, "A"), ("2", 1, "C")]),
            source(1, &[("1", 4, "A"), ("3", 9, "G")]),
        ];
        let stream = BinStream::new(sources, ChromOrder::new(["1", "2", "3"])).unwrap();
        assert_eq!(
            spans(stream),
            vec![
                ("1".to_string(), 4, 4),
                ("2".to_string(), 1, 1),
                ("3".to_string(), 9, 9),
            ]
        );
    }

    #[test]
    fn test_skips_chromosomes_without_data() {
        let sources = vec![source(0, &[("20", 1, "A")])];
        let stream = BinStream::new(sources, ChromOrder::new(["1", "20"])).unwrap();
        assert_eq!(spans(stream), vec![("20".to_string(), 1, 1)]);
    }

    #[test]
    fn test_stops_when_order_runs_out() {
        // "X" is not in the order; its records are never emitted.
        let sources = vec![source(0, &[("1", 1, "A"), ("X", 5, "A")])];
        let mut stream = BinStream::new(sources, ChromOrder::new(["1"])).unwrap();
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().is_none());
        assert!(stream.is_exhausted());
        assert_eq!(stream.bins_emitted(), 1);
    }

    /// Cursor that shows one record, then fails on every later peek.
    struct FailingTailCursor {
        rec: VariantRecord,
        peeks: usize,
    }

    impl RecordCursor for FailingTailCursor {
        fn peek(&mut self) -> Result<Option<&VariantRecord>> {
            self.peeks += 1;
            if self.peeks > 1 {
                return Err(JoinError::Vcf(VcfError::Parse {
                    line: 9,
                    message: "truncated record".to_string(),
                }));
            }
            Ok(Some(&self.rec))
        }

        fn advance(&mut self) -> Result<Option<VariantRecord>> {
            Ok(None)
        }
    }

    #[test]
    fn test_unreadable_tail_outside_order_still_ends_stream() {
        let metadata = VcfMetadata {
            samples: vec!["S0".to_string()],
            ploidy: 2,
        };
        let cursor = FailingTailCursor {
            rec: VariantRecord::new("X", 5, vec!["A"]),
            peeks: 0,
        };
        let sources = vec![Source::new(0, metadata, cursor)];
        let mut stream = BinStream::new(sources, ChromOrder::new(["1"])).unwrap();

        assert!(stream.next().is_none());
        assert!(stream.is_exhausted());
        assert_eq!(stream.bins_emitted(), 0);
    }

    #[test]
    fn test_no_records_yields_nothing() {
        let sources = vec![source(0, &[])];
        let mut stream = BinStream::new(sources, ChromOrder::new(["20"])).unwrap();
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_error_ends_stream() {
        let sources = vec![source(0, &[("1", 1, "A"), ("2", 1, "A"), ("1", 5, "A")])];
        let mut stream = BinStream::new(sources, ChromOrder::new(["1", "2"])).unwrap();

        assert!(stream.next().unwrap().is_ok());
        // 1:5 is pulled while the bin at 2:1 is still growing
        assert!(matches!(
            stream.next(),
            Some(Err(JoinError::DataOrder { .. }))
        ));
        assert!(stream.next().is_none());
        assert_eq!(stream.bins_emitted(), 1);
    }

    #[test]
    fn test_emission_is_monotonic() {
        let sources = vec![
            source(0, &[("1", 2, "A"), ("1", 10, "A"), ("2", 3, "A")]),
            source(1, &[("1", 1, "AAAA"), ("1", 12, "A")]),
            source(2, &[("1", 6, "A"), ("2", 1, "A")]),
        ];
        let stream = BinStream::new(sources, ChromOrder::new(["1", "2"])).unwrap();
        let result = spans(stream);
        assert_eq!(
            result,
            vec![
                ("1".to_string(), 1, 4),
                ("1".to_string(), 6, 6),
                ("1".to_string(), 10, 10),
                ("1".to_string(), 12, 12),
                ("2".to_string(), 1, 1),
                ("2".to_string(), 3, 3),
            ]
        );
        for pair in result.windows(2) {
            if pair[0].0 == pair[1].0 {
                assert!(pair[0].2 < pair[1].1);
            }
        }
    }
}
