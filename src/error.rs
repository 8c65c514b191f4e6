//! Error taxonomy for a join run.
//!
//! Bad input (`Configuration`, `SchemaConflict`, `DataOrder`) is kept apart
//! from `InternalInvariant`, which always points at a bug in the merge or a
//! parser that broke its contract.

use crate::vcf::VcfError;
use std::io;
use thiserror::Error;

/// Errors that abort a join run.
#[derive(Error, Debug)]
pub enum JoinError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Vcf(#[from] VcfError),

    /// Invalid run parameters, reported before any source is read.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Two sources declare the same sample.
    #[error("Some samples are found in more than one source (source {source_idx}): {}", .samples.join(","))]
    SchemaConflict {
        source_idx: usize,
        samples: Vec<String>,
    },

    /// A source is not sorted the way the merge requires.
    #[error("{}not sorted: {message} at {chrom}:{pos}", source_prefix(.source_idx))]
    DataOrder {
        chrom: String,
        pos: u64,
        source_idx: Option<usize>,
        message: String,
    },

    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl JoinError {
    pub(crate) fn data_order(
        chrom: &str,
        pos: u64,
        source_idx: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        JoinError::DataOrder {
            chrom: chrom.to_string(),
            pos,
            source_idx,
            message: message.into(),
        }
    }

    /// Build an internal invariant error and log it with its context.
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("internal invariant violated: {}", message);
        JoinError::InternalInvariant(message)
    }

    /// True for failures caused by the input rather than by this crate.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, JoinError::InternalInvariant(_))
    }
}

fn source_prefix(source_idx: &Option<usize>) -> String {
    match source_idx {
        Some(idx) => format!("Source {} ", idx),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, JoinError>;
