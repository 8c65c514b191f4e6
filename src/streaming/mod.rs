//! Streaming join of sorted variant sources.
//!
//! This module provides the pieces of the k-way join:
//! - Peekable record cursors with inline sort validation
//! - Source construction with sample disjointness checks
//! - Chromosome progression and ordering checks
//! - Bin accumulation by fixed-point span growth
//! - The lazy bin stream tying them together
//!
//! Each source is read strictly forward with one record of lookahead, so
//! memory stays proportional to the largest bin, not to the input size.

pub mod accumulator;
pub mod bin_stream;
pub mod cursor;
pub mod output;
pub mod source;
pub mod validation;

pub use accumulator::{accumulate_bin, Accumulation, VarBin};
pub use bin_stream::BinStream;
pub use cursor::{PeekableCursor, RecordCursor};
pub use output::BinWriter;
pub use source::{build_sources, build_vcf_sources, Source, VcfSource};
pub use validation::{verify_sorted, ChromosomeCursor, SourceOrderValidator};
