/// Input read by `vcf-annotate` when no path is given.
pub const DEFAULT_ANNOTATE_INPUT: &str = "clinical_test_filtered.vcf";
/// Output path prefix; `.xlsx` and `.csv` are appended.
pub const DEFAULT_ANNOTATE_OUTPUT: &str = "clinical_test_annotation_results";

pub const DEFAULT_ENSEMBL_URL: &str = "https://rest.ensembl.org";
pub const DEFAULT_EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Per-request timeout for remote lookups, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Pause after each annotated variant, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 500;

/// ClinVar esearch page size.
pub const CLINVAR_SEARCH_MAX: usize = 10;
/// Number of ClinVar ids summarised per variant.
pub const CLINVAR_SUMMARY_MAX: usize = 5;

/// INFO keys holding allele frequency, in priority order.
pub const ALLELE_FREQUENCY_KEYS: [&str; 7] = [
    "AF",
    "MAF",
    "CAF",
    "GMAF",
    "ExAC_AF",
    "gnomAD_AF",
    "1000Gp3_AF",
];

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_DISEASE_ASSOCIATIONS: &str = "No disease associations found";
