//! Bin summary output.
//!
//! One tab-separated line per bin:
//! `chrom  start  end  n_records  sources  count_1 .. count_n`
//! where `sources` lists the contributing sources (1-based, comma
//! separated) and each `count_i` is the number of records from source `i`.
//! Integers are formatted with itoa.

use crate::error::{JoinError, Result};
use crate::streaming::accumulator::VarBin;
use std::io::{BufWriter, Write};

/// Buffer size for BinWriter (2MB default).
const DEFAULT_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Writes bin summaries.
pub struct BinWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    num_sources: usize,
}

impl<W: Write> BinWriter<W> {
    /// Create a writer for a run over `num_sources` inputs.
    pub fn new(output: W, num_sources: usize) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output, num_sources)
    }

    pub fn with_capacity(capacity: usize, output: W, num_sources: usize) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            num_sources,
        }
    }

    /// Write one bin summary line.
    pub fn write_bin(&mut self, bin: &VarBin) -> Result<()> {
        if let Some(idx) = bin.sources().find(|&idx| idx >= self.num_sources) {
            return Err(JoinError::internal(format!(
                "bin {} has records from source {} but the run has {} sources",
                bin.span, idx, self.num_sources
            )));
        }

        self.writer.write_all(bin.span.chrom.as_bytes())?;
        self.write_tab()?;
        self.write_int(bin.span.start)?;
        self.write_tab()?;
        self.write_int(bin.span.end)?;
        self.write_tab()?;
        self.write_int(bin.len())?;
        self.write_tab()?;

        for (i, idx) in bin.sources().enumerate() {
            if i > 0 {
                self.writer.write_all(b",")?;
            }
            self.write_int(idx + 1)?;
        }

        for idx in 0..self.num_sources {
            self.write_tab()?;
            self.write_int(bin.records_from(idx).len())?;
        }

        self.writer.write_all(b"\n")?;
        Ok(())
    }

    #[inline]
    fn write_tab(&mut self) -> Result<()> {
        self.writer.write_all(b"\t")?;
        Ok(())
    }

    #[inline]
    fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<()> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{VariantRecord, VariantSpan};
    use std::collections::BTreeMap;

    fn bin(span: (&str, u64, u64), vars: &[(usize, usize)]) -> VarBin {
        let mut map = BTreeMap::new();
        for &(idx, n) in vars {
            let records: Vec<VariantRecord> = (0..n)
                .map(|i| VariantRecord::new(span.0, span.1 + i as u64, vec!["A"]))
                .collect();
            map.insert(idx, records);
        }
        VarBin {
            span: VariantSpan::new(span.0, span.1, span.2),
            vars: map,
        }
    }

    #[test]
    fn test_write_bin() {
        let mut output = Vec::new();
        {
            let mut writer = BinWriter::new(&mut output, 3);
            writer.write_bin(&bin(("20", 1, 7), &[(0, 6), (2, 1)])).unwrap();
            writer.write_bin(&bin(("20", 20, 20), &[(1, 1)])).unwrap();
            writer.flush().unwrap();
        }
        let result = String::from_utf8(output).unwrap();
        assert_eq!(result, "20\t1\t7\t7\t1,3\t6\t0\t1\n20\t20\t20\t1\t2\t0\t1\t0\n");
    }

    #[test]
    fn test_unknown_source_rejected() {
        let mut output = Vec::new();
        let mut writer = BinWriter::new(&mut output, 1);
        let result = writer.write_bin(&bin(("1", 1, 1), &[(4, 1)]));
        assert!(matches!(result, Err(JoinError::InternalInvariant(_))));
    }
}
