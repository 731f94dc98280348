//! # VCF Clinical Library
//!
//! Filtering and clinical annotation of VCF (Variant Call Format) files.
//!
//! ## Features
//!
//! - Parse VCF headers to extract INFO field metadata
//! - Load JSON filter criteria such as `{"DP": ">=20"}` and mark matching
//!   records `PASS`, leaving every other byte of the file unchanged
//! - Reduce multi-valued INFO fields with an `any` / `all` / `first` strategy
//! - Annotate PASS variants with gene, clinical significance and ClinVar
//!   disease data, and export the results as a spreadsheet and CSV
//!
//! ## Example
//!
//! ```rust
//! use vcf_clinical::{CombineMode, Criteria, VcfRewriter};
//!
//! let criteria = Criteria::from_json_str(r#"{"DP": ">=20", "AF": "<0.01"}"#).unwrap();
//! let rewriter = VcfRewriter::new(criteria, CombineMode::All);
//!
//! let vcf = concat!(
//!     "##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">\n",
//!     "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
//!     "chr1\t100\t.\tA\tG\t50\tLowQual\tDP=30;AF=0.001\n",
//!     "chr1\t200\t.\tC\tT\t50\tLowQual\tDP=5;AF=0.001\n",
//! );
//!
//! let mut out = Vec::new();
//! let summary = rewriter.rewrite(vcf.as_bytes(), &mut out).unwrap();
//! assert_eq!((summary.processed, summary.passed), (2, 1));
//!
//! let out = String::from_utf8(out).unwrap();
//! assert!(out.contains("chr1\t100\t.\tA\tG\t50\tPASS\tDP=30;AF=0.001\n"));
//! assert!(out.contains("chr1\t200\t.\tC\tT\t50\tLowQual\tDP=5;AF=0.001\n"));
//! ```
//!
//! ## Criteria Syntax
//!
//! Each key names an INFO field; each value is an operator followed by the
//! expected value.
//!
//! - `>=` Greater than or equal
//! - `<=` Less than or equal
//! - `==` Equal
//! - `!=` Not equal
//! - `>` Greater than
//! - `<` Less than
//!
//! Both sides are compared as numbers when both parse; otherwise the raw
//! text is compared. The reserved key `_multiallelic_strategy` (`any`, `all`
//! or `first`) controls how list values are reduced.

/// Embedded README.md documentation
const README: &str = include_str!("../README.md");

/// Returns the embedded README.md documentation.
///
/// # Example
///
/// ```rust
/// use vcf_clinical::docs;
///
/// assert!(docs().contains("vcf-filter"));
/// ```
pub fn docs() -> &'static str {
    README
}

pub mod annotate;
pub mod cli;
pub mod constants;
pub mod criteria;
pub mod error;
pub mod eval;
pub mod export;
pub mod header;
pub mod rewrite;
pub mod row;
pub mod value;

pub use annotate::{AnnotationRow, AnnotationSource, Annotator, AnnotatorConfig, RemoteSource};
pub use criteria::{CmpOp, Criteria, Criterion, MultiallelicStrategy};
pub use error::{LookupError, Result, VcfError};
pub use eval::{CombineMode, FilterEngine};
pub use export::{AnalysisSummary, ExportCapability};
pub use header::{InfoField, InfoMap, InfoNumber, InfoType};
pub use rewrite::{FilterSummary, VcfRewriter};
pub use row::{InfoFields, VcfRow};
pub use value::Value;
