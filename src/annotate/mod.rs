//! PASS-variant annotation.
//!
//! For every PASS record in a VCF the [`Annotator`] looks up the overlapping
//! gene, the variant's clinical significance and ClinVar disease
//! associations, and pulls an allele frequency from INFO. Lookups are best
//! effort: a failed call is logged and the row falls back to placeholder
//! values.
//!
//! ```
//! use std::time::Duration;
//! use vcf_clinical::annotate::{Annotator, GeneInfo, MemorySource};
//!
//! let source = MemorySource::new().with_gene(
//!     "chr17",
//!     41245466,
//!     GeneInfo { gene_name: Some("BRCA1".into()), ..Default::default() },
//! );
//! let annotator = Annotator::new(source, Duration::ZERO);
//!
//! let vcf = "chr17\t41245466\t.\tG\tA\t60\tPASS\tAF=0.01\n";
//! let rows = annotator.analyze_reader(vcf.as_bytes()).unwrap();
//! assert_eq!(rows[0].gene_name, "BRCA1");
//! assert_eq!(rows[0].allele_frequency, "0.010000");
//! ```

mod remote;
mod source;

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::Serialize;

pub use remote::RemoteSource;
pub use source::{
    position_term, strip_chr, AnnotationSource, GeneInfo, LookupResult, MemorySource,
    VariantInfo,
};

use crate::constants::*;
use crate::error::{LookupError, Result, VcfError};
use crate::row::{parse_row, InfoFields, VcfRow};

/// Runtime settings for remote annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatorConfig {
    pub ensembl_url: String,
    pub eutils_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Pause after each annotated variant.
    pub delay: Duration,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            ensembl_url: DEFAULT_ENSEMBL_URL.to_string(),
            eutils_url: DEFAULT_EUTILS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }
}

/// One output row per annotated PASS variant.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationRow {
    pub chromosome: String,
    pub position: u64,
    pub rs_id: String,
    pub ref_allele: String,
    pub alt_allele: String,
    pub gene_name: String,
    pub gene_id: String,
    pub gene_description: String,
    pub allele_frequency: String,
    pub clinical_significance: String,
    pub associated_diseases: String,
}

impl AnnotationRow {
    pub fn has_gene(&self) -> bool {
        self.gene_name != UNKNOWN
    }

    pub fn has_diseases(&self) -> bool {
        self.associated_diseases != NO_DISEASE_ASSOCIATIONS
    }

    pub fn has_frequency(&self) -> bool {
        self.allele_frequency != NOT_AVAILABLE
    }

    pub fn has_clinical_significance(&self) -> bool {
        self.clinical_significance != UNKNOWN
    }
}

/// Allele frequency from INFO, formatted with six decimals.
///
/// Keys are tried in [`ALLELE_FREQUENCY_KEYS`] order; for list values only
/// the first entry counts. A key whose value does not parse is skipped.
pub fn extract_allele_frequency(info: &InfoFields) -> Option<String> {
    ALLELE_FREQUENCY_KEYS.iter().find_map(|key| {
        let raw = info.get(key)?;
        let first = raw.split(',').next().unwrap_or(raw);
        first
            .trim()
            .parse::<f64>()
            .ok()
            .map(|af| format!("{:.6}", af))
    })
}

/// Settle a lookup: failures are logged and treated as no data.
fn settle<T>(what: &str, result: LookupResult<T>) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(err @ LookupError::Status { .. }) => {
            log::debug!("{} lookup: {}", what, err);
            None
        }
        Err(err) => {
            log::warn!("Error fetching {}: {}", what, err);
            None
        }
    }
}

/// Annotates VCF records against an [`AnnotationSource`].
#[derive(Debug, Clone)]
pub struct Annotator<S> {
    source: S,
    delay: Duration,
}

impl<S: AnnotationSource> Annotator<S> {
    /// `delay` is slept after every annotated variant to stay within the
    /// services' rate limits.
    pub fn new(source: S, delay: Duration) -> Self {
        Self { source, delay }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn variant_info(&self, row: &VcfRow) -> Option<VariantInfo> {
        let locus = format!("{}:{}", row.chrom, row.pos);

        row.rs_id()
            .and_then(|rs| settle(&format!("variant {}", rs), self.source.variant_by_id(rs)))
            .or_else(|| {
                settle(
                    &format!("variant {}", locus),
                    self.source.variant_at(&row.chrom, row.pos, &row.ref_allele),
                )
            })
    }

    fn diseases(&self, row: &VcfRow) -> Vec<String> {
        let by_id = row
            .rs_id()
            .and_then(|rs| settle(&format!("ClinVar {}", rs), self.source.search_diseases(rs)))
            .unwrap_or_default();
        if !by_id.is_empty() {
            return by_id;
        }

        let term = position_term(&row.chrom, row.pos);
        settle(&format!("ClinVar {}", term), self.source.search_diseases(&term))
            .unwrap_or_default()
    }

    /// Build the output row for one record. Does not check FILTER.
    pub fn annotate(&self, row: &VcfRow) -> AnnotationRow {
        let gene = settle(
            &format!("gene for {}:{}", row.chrom, row.pos),
            self.source.gene_at(&row.chrom, row.pos),
        );
        let variant = self.variant_info(row);
        let diseases = self.diseases(row);

        // A zero minor allele frequency counts as absent.
        let allele_frequency = extract_allele_frequency(&row.info)
            .or_else(|| {
                variant
                    .as_ref()
                    .and_then(|v| v.minor_allele_freq)
                    .filter(|maf| *maf != 0.0)
                    .map(|maf| maf.to_string())
            })
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let clinical_significance = variant
            .as_ref()
            .filter(|v| !v.clinical_significance.is_empty())
            .map(|v| v.clinical_significance.join(", "))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let associated_diseases = if diseases.is_empty() {
            NO_DISEASE_ASSOCIATIONS.to_string()
        } else {
            diseases.join("; ")
        };

        let (gene_name, gene_id, gene_description) = match gene {
            Some(g) => (
                g.gene_name.unwrap_or_default(),
                g.gene_id.unwrap_or_default(),
                g.description.unwrap_or_default(),
            ),
            None => (UNKNOWN.to_string(), UNKNOWN.to_string(), UNKNOWN.to_string()),
        };

        AnnotationRow {
            chromosome: row.chrom.clone(),
            position: row.pos,
            rs_id: row.id.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ref_allele: row.ref_allele.clone(),
            alt_allele: row.alt_allele.clone(),
            gene_name,
            gene_id,
            gene_description,
            allele_frequency,
            clinical_significance,
            associated_diseases,
        }
    }

    /// Annotate every PASS record read from `reader`.
    ///
    /// Header lines and lines with fewer than eight columns are skipped. Any
    /// read or parse error aborts the whole scan.
    pub fn analyze_reader<R: BufRead>(&self, reader: R) -> Result<Vec<AnnotationRow>> {
        let mut results = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.starts_with('#') {
                continue;
            }

            let Some(row) = parse_row(&line)? else {
                continue;
            };
            if !row.is_pass() {
                log::trace!("Skipping {}:{} (FILTER {})", row.chrom, row.pos, row.filter);
                continue;
            }

            log::info!(
                "Analyzing variant: {}:{} {}>{}",
                row.chrom,
                row.pos,
                row.ref_allele,
                row.alt_allele
            );
            results.push(self.annotate(&row));

            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }

        Ok(results)
    }

    /// Annotate the VCF at `path`.
    pub fn analyze_file(&self, path: &Path) -> Result<Vec<AnnotationRow>> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => VcfError::MissingInput(path.to_path_buf()),
            _ => VcfError::Io(e),
        })?;
        self.analyze_reader(BufReader::new(file))
    }

    /// Like [`Annotator::analyze_file`], but any error is logged and yields
    /// no results; partial results are discarded.
    pub fn analyze_vcf_file(&self, path: &Path) -> Vec<AnnotationRow> {
        match self.analyze_file(path) {
            Ok(rows) => rows,
            Err(err @ VcfError::MissingInput(_)) => {
                log::error!("{}", err);
                Vec::new()
            }
            Err(err) => {
                log::error!("Error analyzing VCF file: {}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::parse_info_column;
    use pretty_assertions::assert_eq;

    fn brca1() -> GeneInfo {
        GeneInfo {
            gene_id: Some("ENSG00000012048".to_string()),
            gene_name: Some("BRCA1".to_string()),
            description: Some("BRCA1 DNA repair associated".to_string()),
            biotype: Some("protein_coding".to_string()),
        }
    }

    fn pathogenic() -> VariantInfo {
        VariantInfo {
            clinical_significance: vec!["pathogenic".to_string(), "risk factor".to_string()],
            minor_allele_freq: Some(0.0002),
            ..Default::default()
        }
    }

    fn row(line: &str) -> VcfRow {
        parse_row(line).unwrap().unwrap()
    }

    #[test]
    fn test_frequency_priority_and_first_component() {
        assert_eq!(
            extract_allele_frequency(&parse_info_column("AF=0.05,0.10")),
            Some("0.050000".to_string())
        );
        assert_eq!(
            extract_allele_frequency(&parse_info_column("gnomAD_AF=0.3;MAF=0.12")),
            Some("0.120000".to_string())
        );
        assert_eq!(
            extract_allele_frequency(&parse_info_column("AF=.;CAF=0.9,0.1")),
            Some("0.900000".to_string())
        );
        assert_eq!(extract_allele_frequency(&parse_info_column("DP=10")), None);
    }

    #[test]
    fn test_annotate_with_full_data() {
        let source = MemorySource::new()
            .with_gene("chr17", 41245466, brca1())
            .with_variant_id("rs80357906", pathogenic())
            .with_diseases("rs80357906", &["Breast-ovarian cancer, familial 1", "Fanconi anemia"]);
        let annotator = Annotator::new(source, Duration::ZERO);

        let result = annotator.annotate(&row(
            "chr17\t41245466\trs80357906\tG\tA\t60\tPASS\tDP=40",
        ));

        assert_eq!(
            result,
            AnnotationRow {
                chromosome: "chr17".to_string(),
                position: 41245466,
                rs_id: "rs80357906".to_string(),
                ref_allele: "G".to_string(),
                alt_allele: "A".to_string(),
                gene_name: "BRCA1".to_string(),
                gene_id: "ENSG00000012048".to_string(),
                gene_description: "BRCA1 DNA repair associated".to_string(),
                allele_frequency: "0.0002".to_string(),
                clinical_significance: "pathogenic, risk factor".to_string(),
                associated_diseases: "Breast-ovarian cancer, familial 1; Fanconi anemia"
                    .to_string(),
            }
        );
    }

    #[test]
    fn test_position_fallbacks() {
        let source = MemorySource::new()
            .with_variant_at("chr2", 500, "C", pathogenic())
            .with_diseases(&position_term("chr2", 500), &["Lynch syndrome"]);
        let annotator = Annotator::new(source, Duration::ZERO);

        // Unknown rs-ID: both lookups fall back to the position.
        let result = annotator.annotate(&row("chr2\t500\trs999\tC\tT\t60\tPASS\tAF=0.25"));
        assert_eq!(result.clinical_significance, "pathogenic, risk factor");
        assert_eq!(result.associated_diseases, "Lynch syndrome");
        assert_eq!(result.allele_frequency, "0.250000");
        assert!(!result.has_gene());
    }

    #[test]
    fn test_failed_lookups_fall_back_to_placeholders() {
        let annotator = Annotator::new(MemorySource::offline(), Duration::ZERO);
        let result = annotator.annotate(&row("1\t10\t.\tA\tG\t5\tPASS\t."));

        assert_eq!(result.rs_id, NOT_AVAILABLE);
        assert_eq!(result.gene_name, UNKNOWN);
        assert_eq!(result.gene_id, UNKNOWN);
        assert_eq!(result.gene_description, UNKNOWN);
        assert_eq!(result.allele_frequency, NOT_AVAILABLE);
        assert_eq!(result.clinical_significance, UNKNOWN);
        assert_eq!(result.associated_diseases, NO_DISEASE_ASSOCIATIONS);
        assert!(!result.has_frequency());
        assert!(!result.has_diseases());
        assert!(!result.has_clinical_significance());
    }

    #[test]
    fn test_zero_minor_allele_frequency_is_absent() {
        let info = VariantInfo {
            minor_allele_freq: Some(0.0),
            ..Default::default()
        };
        let source = MemorySource::new().with_variant_id("rs1", info);
        let annotator = Annotator::new(source, Duration::ZERO);
        let result = annotator.annotate(&row("1\t10\trs1\tA\tG\t5\tPASS\t."));
        assert_eq!(result.allele_frequency, NOT_AVAILABLE);
        assert_eq!(result.clinical_significance, UNKNOWN);
    }

    #[test]
    fn test_small_minor_allele_frequency_is_plain_decimal() {
        let info = VariantInfo {
            minor_allele_freq: Some(1e-5),
            ..Default::default()
        };
        let source = MemorySource::new().with_variant_id("rs1", info);
        let annotator = Annotator::new(source, Duration::ZERO);
        let result = annotator.annotate(&row("1\t10\trs1\tA\tG\t5\tPASS\t."));
        assert_eq!(result.allele_frequency, "0.00001");
    }

    #[test]
    fn test_only_pass_records_are_annotated() {
        let vcf = "##fileformat=VCFv4.2\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
chr17\t41245466\trs80357906\tG\tA\t60\tPASS\tAF=0.001\n\
chr17\t41245500\t.\tT\tC\t8\tLowQual\tAF=0.5\n\
chr13\t32900000\t.\tA\tG\t70\tPASS\tDP=12\n\
short\tline\n";
        let source = MemorySource::new()
            .with_gene("chr17", 41245466, brca1())
            .with_variant_id("rs80357906", pathogenic());
        let annotator = Annotator::new(source, Duration::ZERO);

        let rows = annotator.analyze_reader(vcf.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].gene_name, "BRCA1");
        assert_eq!(rows[0].clinical_significance, "pathogenic, risk factor");
        assert_eq!(rows[1].position, 32900000);
        assert_eq!(rows[1].clinical_significance, UNKNOWN);
        assert_eq!(rows[1].allele_frequency, NOT_AVAILABLE);
    }

    #[test]
    fn test_bad_line_discards_all_results() {
        let vcf = "1\t10\t.\tA\tG\t5\tPASS\tAF=0.1\n1\tX\t.\tA\tG\t5\tPASS\tAF=0.1\n";
        let annotator = Annotator::new(MemorySource::new(), Duration::ZERO);
        assert!(annotator.analyze_reader(vcf.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file_yields_no_results() {
        let annotator = Annotator::new(MemorySource::new(), Duration::ZERO);
        let path = Path::new("/nonexistent/clinical_test_filtered.vcf");
        assert!(matches!(
            annotator.analyze_file(path),
            Err(VcfError::MissingInput(_))
        ));
        assert!(annotator.analyze_vcf_file(path).is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.delay, Duration::from_millis(500));
        assert_eq!(config.ensembl_url, "https://rest.ensembl.org");
    }
}
