//! Chromosome processing order.
//!
//! Loaded from a genome file (`chrom\tsize`), a FASTA index (`.fai`), or a
//! comma separated list. Only the first column is used; file order is kept.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{JoinError, Result};

/// Ordered list of chromosomes to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromOrder {
    order: Vec<String>,
}

impl ChromOrder {
    /// Build from an explicit list, dropping duplicates after their first
    /// appearance.
    pub fn new<I, S>(chroms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Self::default();
        for chrom in chroms {
            order.push(chrom.into());
        }
        order
    }

    /// Parse a comma separated list such as `1,2,X`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        )
    }

    /// Load from a genome or `.fai` file: first tab-delimited column per line.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut order = Self::default();

        for line_result in reader.lines() {
            let line = line_result?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let chrom = line.split('\t').next().unwrap_or(line);
            order.push(chrom.to_string());
        }

        Ok(order)
    }

    fn push(&mut self, chrom: String) {
        if !self.order.contains(&chrom) {
            self.order.push(chrom);
        }
    }

    /// Fail fast on an empty order; a run needs at least one chromosome.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.order.is_empty() {
            return Err(JoinError::Configuration(
                "at least one chromosome should be given".to_string(),
            ));
        }
        Ok(())
    }

    /// Get all chromosome names in order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl From<Vec<String>> for ChromOrder {
    fn from(chroms: Vec<String>) -> Self {
        Self::new(chroms)
    }
}
