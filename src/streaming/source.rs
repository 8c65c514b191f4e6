//! Input sources and the registry that builds them.
//!
//! Sample names must be disjoint across sources. This is checked once, as
//! the sources are built, and never per record. Sort order is checked lazily
//! while merging because checking it here would mean reading whole files.

use crate::error::{JoinError, Result};
use crate::streaming::cursor::{PeekableCursor, RecordCursor};
use crate::variant::VariantRecord;
use crate::vcf::{VcfMetadata, VcfReader, VcfRecordIter};
use rustc_hash::FxHashSet;
use std::io::Read;

/// One input stream of variant records plus its sample metadata.
pub struct Source<C> {
    idx: usize,
    metadata: VcfMetadata,
    cursor: C,
}

/// Source backed by a [`VcfReader`].
pub type VcfSource<R> = Source<PeekableCursor<VcfRecordIter<R>>>;

impl<C: RecordCursor> Source<C> {
    pub fn new(idx: usize, metadata: VcfMetadata, cursor: C) -> Self {
        Self {
            idx,
            metadata,
            cursor,
        }
    }

    /// Position of this source in the input list.
    #[inline]
    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn metadata(&self) -> &VcfMetadata {
        &self.metadata
    }

    pub fn samples(&self) -> &[String] {
        &self.metadata.samples
    }

    pub fn ploidy(&self) -> u8 {
        self.metadata.ploidy
    }

    #[inline]
    pub fn peek(&mut self) -> Result<Option<&VariantRecord>> {
        self.cursor.peek()
    }

    #[inline]
    pub fn advance(&mut self) -> Result<Option<VariantRecord>> {
        self.cursor.advance()
    }
}

/// Build one source per stream, indexed by input order.
///
/// Fails with [`JoinError::SchemaConflict`] as soon as a stream declares a
/// sample already declared by an earlier one. No records are read.
pub fn build_sources<I, C>(streams: I) -> Result<Vec<Source<C>>>
where
    I: IntoIterator<Item = (VcfMetadata, C)>,
    C: RecordCursor,
{
    let mut samples_seen: FxHashSet<String> = FxHashSet::default();
    let mut sources = Vec::new();

    for (idx, (metadata, cursor)) in streams.into_iter().enumerate() {
        let overlapping: Vec<String> = metadata
            .samples
            .iter()
            .filter(|s| samples_seen.contains(s.as_str()))
            .cloned()
            .collect();
        if !overlapping.is_empty() {
            return Err(JoinError::SchemaConflict {
                source_idx: idx,
                samples: overlapping,
            });
        }
        samples_seen.extend(metadata.samples.iter().cloned());

        sources.push(Source::new(idx, metadata, cursor));
    }

    Ok(sources)
}

/// Build sources from opened VCF readers.
pub fn build_vcf_sources<R: Read>(readers: Vec<VcfReader<R>>) -> Result<Vec<VcfSource<R>>> {
    build_sources(readers.into_iter().enumerate().map(|(idx, reader)| {
        let metadata = reader.metadata().clone();
        (metadata, PeekableCursor::new(reader.records(), idx))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(samples: &[&str]) -> VcfMetadata {
        VcfMetadata {
            samples: samples.iter().map(|s| s.to_string()).collect(),
            ploidy: 2,
        }
    }

    fn vcf(samples: &[&str]) -> String {
        let mut header = String::from("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT");
        for s in samples {
            header.push('\t');
            header.push_str(s);
        }
        header.push('\n');
        header
    }

    #[test]
    fn test_sources_indexed_in_input_order() {
        let content = vcf(&["NA00001"]);
        let readers = vec![VcfReader::new(content.as_bytes()).unwrap()];
        let sources = build_vcf_sources(readers).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].idx(), 0);
        assert_eq!(sources[0].samples(), &["NA00001"]);
    }

    #[test]
    fn test_overlapping_samples_rejected() {
        let a = vcf(&["NA00001", "NA00002"]);
        let b = vcf(&["NA00003"]);
        let c = vcf(&["NA00002", "NA00001"]);
        let readers = vec![
            VcfReader::new(a.as_bytes()).unwrap(),
            VcfReader::new(b.as_bytes()).unwrap(),
            VcfReader::new(c.as_bytes()).unwrap(),
        ];

        match build_vcf_sources(readers) {
            Err(JoinError::SchemaConflict {
                source_idx,
                samples,
            }) => {
                assert_eq!(source_idx, 2);
                assert_eq!(samples, vec!["NA00002", "NA00001"]);
            }
            _ => panic!("expected schema conflict"),
        }
    }

    #[test]
    fn test_conflict_detected_before_any_record_is_read() {
        // The cursor would fail if it were ever pulled.
        let poisoned = || {
            std::iter::once(Err::<VariantRecord, JoinError>(JoinError::InternalInvariant(
                "read".to_string(),
            )))
        };
        let streams = vec![
            (metadata(&["S1"]), PeekableCursor::new(poisoned(), 0)),
            (metadata(&["S1"]), PeekableCursor::new(poisoned(), 1)),
        ];
        let result = build_sources(streams);
        assert!(matches!(result, Err(JoinError::SchemaConflict { .. })));
    }

    #[test]
    fn test_metadata_passed_through() {
        let streams = vec![(
            VcfMetadata {
                samples: vec!["S1".to_string()],
                ploidy: 1,
            },
            PeekableCursor::new(std::iter::empty::<Result<VariantRecord>>(), 0),
        )];
        let sources = build_sources(streams).unwrap();
        assert_eq!(sources[0].ploidy(), 1);
        assert_eq!(sources[0].metadata().samples, vec!["S1"]);
    }
}
