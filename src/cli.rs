//! Command-line definitions for `vcf-filter` and `vcf-annotate`.

use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};

use crate::annotate::AnnotatorConfig;
use crate::constants::*;
use crate::eval::CombineMode;

/// Marks VCF records that satisfy JSON criteria as PASS.
#[derive(Parser, Debug)]
#[command(name = "vcf-filter", version, about, long_about = None)]
pub struct FilterCli {
    /// Input VCF (plain or gzip-compressed)
    #[arg(short = 'i', long = "input", value_name = "VCF")]
    pub input: PathBuf,

    /// Output VCF
    #[arg(short = 'o', long = "output", value_name = "VCF")]
    pub output: PathBuf,

    /// JSON criteria file
    #[arg(short = 'c', long = "criteria", value_name = "JSON")]
    pub criteria: PathBuf,

    /// Let only the first criterion in the file decide
    #[arg(long = "first-criterion-only")]
    pub first_criterion_only: bool,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,
}

impl FilterCli {
    pub fn combine_mode(&self) -> CombineMode {
        if self.first_criterion_only {
            CombineMode::FirstOnly
        } else {
            CombineMode::All
        }
    }
}

/// Annotates PASS variants with gene, clinical significance and ClinVar
/// disease data.
#[derive(Parser, Debug)]
#[command(name = "vcf-annotate", version, about, long_about = None)]
pub struct AnnotateCli {
    /// Input VCF
    #[arg(short = 'i', long = "input", value_name = "VCF", default_value = DEFAULT_ANNOTATE_INPUT)]
    pub input: PathBuf,

    /// Output prefix; `.xlsx` and `.csv` are appended
    #[arg(short = 'o', long = "output", value_name = "PREFIX", default_value = DEFAULT_ANNOTATE_OUTPUT)]
    pub output: String,

    /// Skip the spreadsheet and write CSV only
    #[arg(long = "csv-only")]
    pub csv_only: bool,

    /// Pause after each variant, in milliseconds
    #[arg(long = "delay-ms", value_name = "MS", default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long = "timeout-secs", value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Ensembl REST base URL
    #[arg(long = "ensembl-url", value_name = "URL", default_value = DEFAULT_ENSEMBL_URL)]
    pub ensembl_url: String,

    /// NCBI E-utilities base URL
    #[arg(long = "eutils-url", value_name = "URL", default_value = DEFAULT_EUTILS_URL)]
    pub eutils_url: String,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbosity: u8,
}

impl AnnotateCli {
    pub fn annotator_config(&self) -> AnnotatorConfig {
        AnnotatorConfig {
            ensembl_url: self.ensembl_url.clone(),
            eutils_url: self.eutils_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            delay: Duration::from_millis(self.delay_ms),
        }
    }

    pub fn spreadsheet_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.xlsx", self.output))
    }

    pub fn csv_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.csv", self.output))
    }
}

/// Initializes logging; `-v` selects Debug and `-vv` Trace. `RUST_LOG` still
/// applies on top of the chosen level.
pub fn init_verbose(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(filter_level)
        .parse_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match level {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.module_path().unwrap_or("unknown_module"),
                record.args()
            )
        })
        .init();
}

pub fn handle_error_and_exit(err: impl Display) -> ! {
    log::error!("{err}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definitions_are_valid() {
        FilterCli::command().debug_assert();
        AnnotateCli::command().debug_assert();
    }

    #[test]
    fn test_filter_args() {
        let cli = FilterCli::parse_from([
            "vcf-filter", "-i", "in.vcf", "-o", "out.vcf", "-c", "criteria.json", "-v",
        ]);
        assert_eq!(cli.input, PathBuf::from("in.vcf"));
        assert_eq!(cli.criteria, PathBuf::from("criteria.json"));
        assert_eq!(cli.verbosity, 1);
        assert_eq!(cli.combine_mode(), CombineMode::All);

        let cli = FilterCli::parse_from([
            "vcf-filter", "-i", "a", "-o", "b", "-c", "c", "--first-criterion-only",
        ]);
        assert_eq!(cli.combine_mode(), CombineMode::FirstOnly);
    }

    #[test]
    fn test_filter_requires_paths() {
        assert!(FilterCli::try_parse_from(["vcf-filter", "-i", "in.vcf"]).is_err());
    }

    #[test]
    fn test_annotate_defaults() {
        let cli = AnnotateCli::parse_from(["vcf-annotate"]);
        assert_eq!(cli.input, PathBuf::from("clinical_test_filtered.vcf"));
        assert_eq!(
            cli.spreadsheet_path(),
            PathBuf::from("clinical_test_annotation_results.xlsx")
        );
        assert_eq!(
            cli.csv_path(),
            PathBuf::from("clinical_test_annotation_results.csv")
        );
        assert!(!cli.csv_only);
        assert_eq!(cli.annotator_config(), AnnotatorConfig::default());
    }

    #[test]
    fn test_annotate_overrides() {
        let cli = AnnotateCli::parse_from([
            "vcf-annotate", "-o", "run1", "--delay-ms", "0", "--timeout-secs", "3", "--csv-only",
        ]);
        let config = cli.annotator_config();
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(cli.csv_path(), PathBuf::from("run1.csv"));
        assert!(cli.csv_only);
    }
}
