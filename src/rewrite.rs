//! Streaming VCF rewriter.
//!
//! Copies a VCF line by line, setting FILTER to `PASS` on records that meet
//! the criteria. Everything else on every line, including line endings, is
//! written back untouched.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::criteria::Criteria;
use crate::error::{Result, VcfError};
use crate::eval::{CombineMode, FilterEngine};
use crate::header::parse_header;
use crate::row::{parse_row, FILTER_COLUMN};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub processed: usize,
    pub passed: usize,
}

/// Open a VCF for reading, decompressing `.gz`/`.bgz` input.
pub fn open_vcf_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path)
        .map_err(|e| VcfError::Processing(format!("{}: {}", path.display(), e)))?;

    let name = path.to_string_lossy().to_lowercase();
    let inner: Box<dyn Read> = if name.ends_with(".gz") || name.ends_with(".bgz") {
        let decoder = MultiGzDecoder::new(file);
        if decoder.header().is_none() {
            return Err(VcfError::Processing(format!(
                "Invalid gzip header: {}",
                path.display()
            )));
        }
        Box::new(decoder)
    } else {
        Box::new(file)
    };

    Ok(Box::new(BufReader::new(inner)))
}

/// Split a raw line into its content and its terminator (`\n`, `\r\n` or none).
fn split_line_ending(line: &[u8]) -> (&[u8], &[u8]) {
    let body_len = line
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |i| i + 1);
    line.split_at(body_len)
}

/// Replace the FILTER column of a raw data line.
///
/// Works on bytes so columns that are not valid UTF-8 are copied as-is.
pub fn replace_filter(line: &[u8], status: &[u8]) -> Vec<u8> {
    let (body, ending) = split_line_ending(line);
    let mut out = Vec::with_capacity(line.len() + status.len());
    for (i, column) in body.split(|b| *b == b'\t').enumerate() {
        if i > 0 {
            out.push(b'\t');
        }
        out.extend_from_slice(if i == FILTER_COLUMN { status } else { column });
    }
    out.extend_from_slice(ending);
    out
}

/// Applies criteria to a VCF stream.
#[derive(Debug, Clone)]
pub struct VcfRewriter {
    criteria: Criteria,
    mode: CombineMode,
}

impl VcfRewriter {
    pub fn new(criteria: Criteria, mode: CombineMode) -> Self {
        Self { criteria, mode }
    }

    /// Rewrite `reader` into `writer`.
    ///
    /// The header seen before the first record supplies INFO metadata for
    /// the evaluator. A data line that cannot be parsed aborts the run;
    /// whatever was written before it stays written.
    pub fn rewrite<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<FilterSummary> {
        let mut summary = FilterSummary::default();
        let mut header = String::new();
        let mut engine: Option<FilterEngine> = None;
        let mut line: Vec<u8> = Vec::new();
        let mut line_no = 0usize;

        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| VcfError::Processing(format!("line {}: {}", line_no + 1, e)))?;
            if read == 0 {
                break;
            }
            line_no += 1;

            if line.first() == Some(&b'#') || line.iter().all(u8::is_ascii_whitespace) {
                if engine.is_none() {
                    header.push_str(&String::from_utf8_lossy(&line));
                }
                writer.write_all(&line)?;
                continue;
            }

            let engine = engine.get_or_insert_with(|| {
                let info_map = parse_header(&header);
                log::debug!("Header declares {} INFO fields", info_map.len());
                FilterEngine::new(self.criteria.clone(), info_map, self.mode)
            });

            // Only the parsed view is decoded; the bytes written back are the input's.
            let text = String::from_utf8_lossy(&line);
            let row = parse_row(&text)
                .map_err(|e| VcfError::Processing(format!("line {}: {}", line_no, e)))?
                .ok_or_else(|| {
                    VcfError::Processing(format!(
                        "line {}: expected at least 8 tab-separated columns",
                        line_no
                    ))
                })?;

            summary.processed += 1;
            if engine.passes(&row) {
                summary.passed += 1;
                writer.write_all(&replace_filter(&line, b"PASS"))?;
            } else {
                writer.write_all(&line)?;
            }
        }

        writer.flush()?;
        log::info!(
            "Processed {} records, {} passed.",
            summary.processed,
            summary.passed
        );
        Ok(summary)
    }

    /// Rewrite the VCF at `input` into a new file at `output`.
    pub fn rewrite_file(&self, input: &Path, output: &Path) -> Result<FilterSummary> {
        let reader = open_vcf_reader(input)?;
        let writer = File::create(output)
            .map(BufWriter::new)
            .map_err(|e| VcfError::Processing(format!("{}: {}", output.display(), e)))?;

        log::debug!("Filtering {} -> {}", input.display(), output.display());
        self.rewrite(reader, writer)
    }
}
