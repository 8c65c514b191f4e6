//! Join command: merge sorted VCF files into bins of overlapping variants.
//!
//! # Algorithm
//!
//! All inputs are streamed together, one record of lookahead per file. For
//! each chromosome in the requested order, bins are built by taking the
//! lowest-starting variant and absorbing every variant from any file whose
//! start falls inside the growing span (see
//! [`accumulator`](crate::streaming::accumulator)).
//!
//! # Memory Complexity
//!
//! O(b) where b = records in the largest bin. Files are never loaded whole.
//!
//! # Requirements
//!
//! Each input must be sorted by position within each chromosome, with
//! chromosomes contiguous and in the requested order. Sample names must be
//! unique across inputs.

use crate::error::Result;
use crate::genome::ChromOrder;
use crate::streaming::{build_vcf_sources, BinStream, BinWriter, PeekableCursor, RecordCursor};
use crate::vcf::{VcfReader, VcfRecordIter, DEFAULT_PLOIDY};
use log::debug;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Bin stream over VCF files opened from disk.
pub type VcfBinStream = BinStream<PeekableCursor<VcfRecordIter<File>>>;

/// Join VCF files into a lazy stream of bins.
///
/// Fails with a configuration error on an empty chromosome list before any
/// file is opened.
///
/// # Example
///
/// ```rust,no_run
/// use join_vcfs::commands::join_vcfs;
///
/// for bin in join_vcfs(&["a.vcf", "b.vcf"], ["1", "20"]).unwrap() {
///     let bin = bin.unwrap();
///     println!("{} {}", bin.span, bin.len());
/// }
/// ```
pub fn join_vcfs<P, I, S>(paths: &[P], chromosomes: I) -> Result<VcfBinStream>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    JoinCommand::new()
        .with_chromosomes(ChromOrder::new(chromosomes))
        .open(paths)
}

/// Join command configuration.
#[derive(Debug, Clone)]
pub struct JoinCommand {
    /// Chromosomes to process, in order
    pub chromosomes: ChromOrder,
    /// Ploidy reported for every source
    pub ploidy: u8,
}

impl Default for JoinCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl JoinCommand {
    pub fn new() -> Self {
        Self {
            chromosomes: ChromOrder::default(),
            ploidy: DEFAULT_PLOIDY,
        }
    }

    /// Set the chromosome processing order (builder pattern).
    pub fn with_chromosomes(mut self, chromosomes: ChromOrder) -> Self {
        self.chromosomes = chromosomes;
        self
    }

    /// Set the ploidy reported in source metadata (builder pattern).
    pub fn with_ploidy(mut self, ploidy: u8) -> Self {
        self.ploidy = ploidy;
        self
    }

    /// Open every input and build the bin stream.
    pub fn open<P: AsRef<Path>>(&self, paths: &[P]) -> Result<VcfBinStream> {
        self.chromosomes.ensure_not_empty()?;

        let mut readers = Vec::with_capacity(paths.len());
        for path in paths {
            debug!("opening {}", path.as_ref().display());
            readers.push(VcfReader::from_path(path)?);
        }
        self.stream(readers)
    }

    /// Build the bin stream from already opened readers.
    pub fn stream<R: Read>(
        &self,
        readers: Vec<VcfReader<R>>,
    ) -> Result<BinStream<PeekableCursor<VcfRecordIter<R>>>> {
        self.chromosomes.ensure_not_empty()?;
        let readers = readers
            .into_iter()
            .map(|r| r.with_ploidy(self.ploidy))
            .collect();
        let sources = build_vcf_sources(readers)?;
        BinStream::new(sources, self.chromosomes.clone())
    }

    /// Join files on disk and write bin summaries.
    pub fn run<P: AsRef<Path>, W: Write>(&self, paths: &[P], output: &mut W) -> Result<JoinStats> {
        let stream = self.open(paths)?;
        self.run_streaming(stream, output)
    }

    /// Drain a bin stream into a [`BinWriter`].
    pub fn run_streaming<C: RecordCursor, W: Write>(
        &self,
        stream: BinStream<C>,
        output: &mut W,
    ) -> Result<JoinStats> {
        let mut stats = JoinStats {
            sources: stream.num_sources(),
            ..JoinStats::default()
        };
        let mut writer = BinWriter::new(output, stream.num_sources());

        for bin in stream {
            let bin = bin?;
            stats.record(bin.len(), bin.vars.len());
            writer.write_bin(&bin)?;
        }

        writer.flush()?;
        Ok(stats)
    }
}

/// Statistics from a join run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JoinStats {
    /// Number of input sources
    pub sources: usize,
    /// Records placed into bins
    pub records_binned: usize,
    /// Bins written
    pub bins_written: usize,
    /// Bins with records from more than one source
    pub multi_source_bins: usize,
    /// Records in the largest bin
    pub max_bin_records: usize,
}

impl JoinStats {
    fn record(&mut self, records: usize, sources: usize) {
        self.records_binned += records;
        self.bins_written += 1;
        if sources > 1 {
            self.multi_source_bins += 1;
        }
        self.max_bin_records = self.max_bin_records.max(records);
    }

    /// Average records per bin.
    pub fn records_per_bin(&self) -> f64 {
        if self.bins_written == 0 {
            0.0
        } else {
            self.records_binned as f64 / self.bins_written as f64
        }
    }
}

impl std::fmt::Display for JoinStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sources: {}, Records: {}, Bins: {}, Shared bins: {}, Largest bin: {}, Records/bin: {:.2}",
            self.sources,
            self.records_binned,
            self.bins_written,
            self.multi_source_bins,
            self.max_bin_records,
            self.records_per_bin()
        )
    }
}
