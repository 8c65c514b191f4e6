//! join-vcfs: streaming join of sorted VCF files
//!
//! Merges any number of independently sorted VCF files (disjoint samples)
//! into one ordered sequence of variant bins: groups of records, possibly
//! from different files, whose genomic spans overlap. A multi-base variant
//! such as a deletion pulls every variant it covers into its bin, even
//! across files and through chains of overlaps.
//!
//! # Features
//!
//! - **Streaming I/O**: one record of lookahead per file, never the whole file
//! - **Order enforcement**: unsorted input is detected and rejected, not re-sorted
//! - **Lazy output**: bins are produced on demand as an `Iterator`
//!
//! # Example
//!
//! ```rust,no_run
//! use join_vcfs::commands::join_vcfs;
//!
//! let bins = join_vcfs(&["a.vcf", "b.vcf"], ["1", "20"]).unwrap();
//! for bin in bins {
//!     let bin = bin.unwrap();
//!     println!("{}\t{} records", bin.span, bin.len());
//! }
//! ```

pub mod commands;
pub mod error;
pub mod genome;
pub mod streaming;
pub mod variant;
pub mod vcf;

// Re-export commonly used types
pub use commands::join_vcfs;
pub use error::{JoinError, Result};
pub use genome::ChromOrder;
pub use streaming::{BinStream, VarBin};
pub use variant::{span_of, VariantRecord, VariantSpan};
pub use vcf::{VcfMetadata, VcfReader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{join_vcfs, JoinCommand, JoinStats};
    pub use crate::error::{JoinError, Result};
    pub use crate::genome::ChromOrder;
    pub use crate::streaming::{BinStream, RecordCursor, VarBin};
    pub use crate::variant::{VariantRecord, VariantSpan};
    pub use crate::vcf::{VcfMetadata, VcfReader};
}
