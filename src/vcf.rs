//! Streaming VCF reader.
//!
//! Reads the header up front (sample names), then yields one
//! [`VariantRecord`] per data line. Only the columns the join needs are
//! decoded: CHROM, POS, ID, REF, ALT and the per-sample GT subfield.

use crate::variant::VariantRecord;
use memchr::memchr;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Default ploidy when the caller does not say otherwise.
pub const DEFAULT_PLOIDY: u8 = 2;

/// Input buffer used when opening VCF files by path.
const INPUT_BUFFER: usize = 256 * 1024;

/// Number of fixed columns before FORMAT.
const FIXED_COLUMNS: usize = 8;

/// Largest POS the VCF format allows (2^31 - 1).
pub const MAX_POS: u64 = (1 << 31) - 1;

/// Errors that can occur during VCF parsing.
#[derive(Error, Debug)]
pub enum VcfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid VCF format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, VcfError>;

/// Per-file metadata handed to the join alongside the record stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfMetadata {
    pub samples: Vec<String>,
    pub ploidy: u8,
}

/// A streaming VCF reader.
pub struct VcfReader<R: Read> {
    reader: BufReader<R>,
    metadata: VcfMetadata,
    line_number: usize,
    buffer: String,
}

impl VcfReader<File> {
    /// Open a VCF file from a path and read its header.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::with_capacity(file, INPUT_BUFFER)
    }
}

impl<R: Read> VcfReader<R> {
    /// Create a reader from any readable source, consuming the header.
    pub fn new(reader: R) -> Result<Self> {
        Self::from_buf_reader(BufReader::new(reader))
    }

    /// Create a reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Result<Self> {
        Self::from_buf_reader(BufReader::with_capacity(capacity, reader))
    }

    fn from_buf_reader(reader: BufReader<R>) -> Result<Self> {
        let mut vcf = Self {
            reader,
            metadata: VcfMetadata {
                samples: Vec::new(),
                ploidy: DEFAULT_PLOIDY,
            },
            line_number: 0,
            buffer: String::with_capacity(1024),
        };
        vcf.read_header()?;
        Ok(vcf)
    }

    /// Override the ploidy reported in the metadata (builder pattern).
    pub fn with_ploidy(mut self, ploidy: u8) -> Self {
        self.metadata.ploidy = ploidy;
        self
    }

    pub fn metadata(&self) -> &VcfMetadata {
        &self.metadata
    }

    pub fn samples(&self) -> &[String] {
        &self.metadata.samples
    }

    /// Skip `##` meta lines and parse the `#CHROM` line.
    fn read_header(&mut self) -> Result<()> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Err(VcfError::InvalidFormat(
                    "missing #CHROM header line".to_string(),
                ));
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.starts_with("##") {
                continue;
            }
            if line.starts_with("#CHROM") {
                let columns: Vec<&str> = line.split('\t').collect();
                if columns.len() < FIXED_COLUMNS {
                    return Err(VcfError::Parse {
                        line: self.line_number,
                        message: format!(
                            "header has {} columns, expected at least {}",
                            columns.len(),
                            FIXED_COLUMNS
                        ),
                    });
                }
                self.metadata.samples = columns
                    .iter()
                    .skip(FIXED_COLUMNS + 1)
                    .map(|s| s.to_string())
                    .collect();
                return Ok(());
            }
            return Err(VcfError::Parse {
                line: self.line_number,
                message: "expected #CHROM header before data lines".to_string(),
            });
        }
    }

    /// Read the next variant record.
    pub fn read_record(&mut self) -> Result<Option<VariantRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    fn parse_line(&self, line: &str) -> Result<VariantRecord> {
        let mut fields = TabFields::new(line);

        let chrom = fields.next().unwrap_or_default();
        let pos_field = self.required(fields.next(), "POS")?;
        let id = self.required(fields.next(), "ID")?;
        let reference = self.required(fields.next(), "REF")?;
        let alt = self.required(fields.next(), "ALT")?;

        if chrom.is_empty() {
            return Err(self.parse_error("empty CHROM".to_string()));
        }
        let pos: u64 = pos_field
            .parse()
            .map_err(|_| self.parse_error(format!("Invalid POS: '{}'", pos_field)))?;
        if pos > MAX_POS {
            return Err(self.parse_error(format!(
                "POS {} exceeds the VCF limit {}",
                pos, MAX_POS
            )));
        }
        if reference.is_empty() || reference == "." {
            return Err(self.parse_error(format!("missing REF allele at {}:{}", chrom, pos)));
        }

        let mut alleles = vec![reference.to_string()];
        if alt != "." {
            alleles.extend(alt.split(',').map(|a| a.to_string()));
        }

        // QUAL, FILTER, INFO
        for _ in 0..3 {
            fields.next();
        }

        let genotypes = match fields.next() {
            Some(format) => self.parse_genotypes(format, fields)?,
            None => Vec::new(),
        };

        Ok(VariantRecord {
            chrom: chrom.to_string(),
            pos,
            id: (id != ".").then(|| id.to_string()),
            alleles,
            genotypes,
        })
    }

    fn parse_genotypes(&self, format: &str, fields: TabFields<'_>) -> Result<Vec<String>> {
        let gt_index = format.split(':').position(|key| key == "GT");
        let genotypes: Vec<String> = fields
            .map(|sample| match gt_index {
                Some(idx) => sample.split(':').nth(idx).unwrap_or(".").to_string(),
                None => ".".to_string(),
            })
            .collect();

        if genotypes.len() != self.metadata.samples.len() {
            return Err(self.parse_error(format!(
                "expected {} sample columns, got {}",
                self.metadata.samples.len(),
                genotypes.len()
            )));
        }
        Ok(genotypes)
    }

    fn required<'a>(&self, field: Option<&'a str>, name: &str) -> Result<&'a str> {
        field.ok_or_else(|| self.parse_error(format!("missing {} column", name)))
    }

    fn parse_error(&self, message: String) -> VcfError {
        VcfError::Parse {
            line: self.line_number,
            message,
        }
    }

    /// Get an iterator over all records.
    pub fn records(self) -> VcfRecordIter<R> {
        VcfRecordIter { reader: self }
    }
}

/// Tab splitter backed by memchr.
struct TabFields<'a> {
    rest: Option<&'a str>,
}

impl<'a> TabFields<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: Some(line) }
    }
}

impl<'a> Iterator for TabFields<'a> {
    type Item = &'a str;

    #[inline]
    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match memchr(b'\t', rest.as_bytes()) {
            Some(tab) => {
                self.rest = Some(&rest[tab + 1..]);
                Some(&rest[..tab])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Iterator over VCF records.
pub struct VcfRecordIter<R: Read> {
    reader: VcfReader<R>,
}

impl<R: Read> Iterator for VcfRecordIter<R> {
    type Item = Result<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Parse a whole VCF held in memory (useful for testing).
pub fn parse_vcf_str(content: &str) -> Result<(VcfMetadata, Vec<VariantRecord>)> {
    let reader = VcfReader::new(content.as_bytes())?;
    let metadata = reader.metadata().clone();
    let records = reader.records().collect::<Result<Vec<_>>>()?;
    Ok((metadata, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VCF: &str = "##fileformat=VCFv4.2\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA00001\tNA00002\n\
        20\t1\trs1\tG\tA\t20\tPASS\t.\tGT\t0|0\t1/1\n\
        20\t4\t.\tT\t.\t20\tPASS\t.\tDP:GT\t3:0|0\t7:./.\n\
        20\t9\t.\tGTC\tG,GTCT\t20\tPASS\t.\tGT\t0/1\t1/2\n";

    #[test]
    fn test_header_samples() {
        let reader = VcfReader::new(VCF.as_bytes()).unwrap();
        assert_eq!(reader.samples(), &["NA00001", "NA00002"]);
        assert_eq!(reader.metadata().ploidy, DEFAULT_PLOIDY);
    }

    #[test]
    fn test_parse_records() {
        let (_, records) = parse_vcf_str(VCF).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].chrom, "20");
        assert_eq!(records[0].pos, 1);
        assert_eq!(records[0].id.as_deref(), Some("rs1"));
        assert_eq!(records[0].alleles, vec!["G", "A"]);
        assert_eq!(records[0].genotypes, vec!["0|0", "1/1"]);

        // ALT "." means no alternates; GT found by FORMAT position
        assert_eq!(records[1].id, None);
        assert_eq!(records[1].alleles, vec!["T"]);
        assert_eq!(records[1].genotypes, vec!["0|0", "./."]);

        assert_eq!(records[2].alleles, vec!["GTC", "G", "GTCT"]);
    }

    #[test]
    fn test_sites_only_vcf() {
        let content = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n1\t5\t.\tA\tC\t.\t.\t.\n";
        let (metadata, records) = parse_vcf_str(content).unwrap();
        assert!(metadata.samples.is_empty());
        assert_eq!(records.len(), 1);
        assert!(records[0].genotypes.is_empty());
    }

    #[test]
    fn test_with_ploidy() {
        let reader = VcfReader::new(VCF.as_bytes()).unwrap().with_ploidy(1);
        assert_eq!(reader.metadata().ploidy, 1);
    }

    #[test]
    fn test_missing_header() {
        let result = VcfReader::new("20\t1\t.\tG\tA\t.\t.\t.\n".as_bytes());
        assert!(matches!(result, Err(VcfError::Parse { line: 1, .. })));

        let result = VcfReader::new("##fileformat=VCFv4.2\n".as_bytes());
        assert!(matches!(result, Err(VcfError::InvalidFormat(_))));
    }

    #[test]
    fn test_invalid_pos() {
        let content = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n1\tabc\t.\tA\tC\t.\t.\t.\n";
        let err = parse_vcf_str(content).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("Invalid POS"));
    }

    #[test]
    fn test_pos_above_limit() {
        let content = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
            1\t2147483647\t.\tA\tC\t.\t.\t.\n\
            1\t18446744073709551615\t.\tAC\tA\t.\t.\t.\n";
        let err = parse_vcf_str(content).unwrap_err();
        assert!(matches!(err, VcfError::Parse { line: 3, .. }));
        assert!(err.to_string().contains("exceeds the VCF limit"));
    }

    #[test]
    fn test_short_line() {
        let content = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n1\t5\t.\n";
        assert!(parse_vcf_str(content).is_err());
    }

    #[test]
    fn test_sample_count_mismatch() {
        let content = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
            1\t5\t.\tA\tC\t.\t.\t.\tGT\t0/1\t1/1\n";
        let err = parse_vcf_str(content).unwrap_err();
        assert!(err.to_string().contains("sample columns"));
    }

    #[test]
    fn test_skip_blank_lines() {
        let content = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\n1\t5\t.\tA\tC\t.\t.\t.\n\n";
        let (_, records) = parse_vcf_str(content).unwrap();
        assert_eq!(records.len(), 1);
    }
}
