//! Writing annotation results to CSV and spreadsheet files.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::annotate::AnnotationRow;
use crate::constants::UNKNOWN;
use crate::error::Result;

pub const RESULTS_SHEET: &str = "Variant Analysis Results";
pub const SUMMARY_SHEET: &str = "Summary";

/// Spreadsheet column headers, in CSV field order.
pub const SPREADSHEET_HEADERS: [&str; 11] = [
    "Chromosome",
    "Position",
    "RS_ID",
    "Reference",
    "Alternate",
    "Gene_Name",
    "Gene_ID",
    "Gene_Description",
    "Allele_Frequency",
    "Clinical_Significance",
    "Associated_Diseases",
];

pub const SPREADSHEET_WIDTHS: [f64; 11] =
    [12.0, 12.0, 15.0, 10.0, 10.0, 15.0, 20.0, 40.0, 12.0, 25.0, 50.0];

/// Which output formats this build can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportCapability {
    /// `.xlsx` output is compiled in.
    Spreadsheet,
    /// Only CSV can be written.
    CsvOnly,
}

impl ExportCapability {
    /// Detect once at startup whether spreadsheet output is available.
    pub fn detect() -> Self {
        if cfg!(feature = "xlsx") {
            ExportCapability::Spreadsheet
        } else {
            log::warn!("Spreadsheet support not compiled in (enable the `xlsx` feature); writing CSV instead");
            ExportCapability::CsvOnly
        }
    }
}

/// Counts over a result set, shared by the console report and the
/// spreadsheet's summary sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisSummary {
    pub total: usize,
    pub with_gene: usize,
    pub with_diseases: usize,
    pub with_frequency: usize,
    pub with_clinical_significance: usize,
    /// Variants per named gene; `Unknown` and empty names are left out.
    pub gene_counts: BTreeMap<String, usize>,
    /// `(rs_id, gene_name, clinical_significance)` for every variant with a
    /// known significance.
    pub significant: Vec<(String, String, String)>,
}

impl AnalysisSummary {
    pub fn from_rows(rows: &[AnnotationRow]) -> Self {
        let mut summary = AnalysisSummary {
            total: rows.len(),
            ..Default::default()
        };

        for row in rows {
            summary.with_gene += row.has_gene() as usize;
            summary.with_diseases += row.has_diseases() as usize;
            summary.with_frequency += row.has_frequency() as usize;

            if row.has_clinical_significance() {
                summary.with_clinical_significance += 1;
                summary.significant.push((
                    row.rs_id.clone(),
                    row.gene_name.clone(),
                    row.clinical_significance.clone(),
                ));
            }

            if !row.gene_name.is_empty() && row.gene_name != UNKNOWN {
                *summary.gene_counts.entry(row.gene_name.clone()).or_default() += 1;
            }
        }

        summary
    }

    /// Label/count pairs for the summary sheet, before the gene rows.
    pub fn counts(&self) -> [(&'static str, usize); 5] {
        [
            ("Total PASS variants analyzed", self.total),
            ("Variants with gene assignments", self.with_gene),
            ("Variants with disease associations", self.with_diseases),
            ("Variants with allele frequency", self.with_frequency),
            ("Variants with clinical significance", self.with_clinical_significance),
        ]
    }
}

impl fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "ANALYSIS SUMMARY")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total PASS variants analyzed: {}", self.total)?;
        writeln!(f, "Variants with gene assignments: {}", self.with_gene)?;
        writeln!(f, "Variants with allele frequency: {}", self.with_frequency)?;
        writeln!(
            f,
            "Variants with clinical significance: {}",
            self.with_clinical_significance
        )?;
        write!(f, "Variants with disease associations: {}", self.with_diseases)?;

        if !self.gene_counts.is_empty() {
            write!(f, "\n\nGene Distribution:")?;
            for (gene, count) in &self.gene_counts {
                write!(f, "\n  {}: {} variant(s)", gene, count)?;
            }
        }

        if !self.significant.is_empty() {
            write!(f, "\n\nClinically Significant Variants:")?;
            for (rs_id, gene, significance) in &self.significant {
                write!(f, "\n  {} ({}): {}", rs_id, gene, significance)?;
            }
        }

        Ok(())
    }
}

/// Write `rows` as CSV with a header line.
pub fn write_csv<W: Write>(rows: &[AnnotationRow], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Save `rows` to a CSV file. Nothing is written for an empty result set.
pub fn save_csv(rows: &[AnnotationRow], path: &Path) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    write_csv(rows, File::create(path)?)?;
    log::debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Save the primary spreadsheet and return the path actually written.
///
/// Falls back to CSV next to `path` (extension `.csv`) when spreadsheet
/// output is unavailable or there is nothing to write; callers tell the two
/// apart by the returned path.
pub fn save_spreadsheet(
    rows: &[AnnotationRow],
    path: &Path,
    capability: ExportCapability,
) -> Result<PathBuf> {
    if rows.is_empty() || capability == ExportCapability::CsvOnly {
        log::debug!("Spreadsheet skipped; writing CSV instead of {}", path.display());
        let fallback = path.with_extension("csv");
        save_csv(rows, &fallback)?;
        return Ok(fallback);
    }

    #[cfg(feature = "xlsx")]
    {
        write_xlsx(rows, path)?;
        log::debug!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(path.to_path_buf())
    }

    #[cfg(not(feature = "xlsx"))]
    {
        let fallback = path.with_extension("csv");
        save_csv(rows, &fallback)?;
        Ok(fallback)
    }
}

#[cfg(any(feature = "xlsx", test))]
fn display_chromosome(chrom: &str) -> String {
    if chrom.starts_with("chr") {
        chrom.to_string()
    } else {
        format!("chr{}", chrom)
    }
}

#[cfg(feature = "xlsx")]
fn write_xlsx(rows: &[AnnotationRow], path: &Path) -> Result<()> {
    use rust_xlsxwriter::{Format, Workbook};

    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(RESULTS_SHEET)?;

        for (col, header) in SPREADSHEET_HEADERS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, display_chromosome(&row.chromosome))?;
            sheet.write_number(r, 1, row.position as f64)?;
            let text = [
                &row.rs_id,
                &row.ref_allele,
                &row.alt_allele,
                &row.gene_name,
                &row.gene_id,
                &row.gene_description,
                &row.allele_frequency,
                &row.clinical_significance,
                &row.associated_diseases,
            ];
            for (offset, value) in text.iter().enumerate() {
                sheet.write_string(r, offset as u16 + 2, value.as_str())?;
            }
        }

        for (col, width) in SPREADSHEET_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }
    }

    {
        let summary = AnalysisSummary::from_rows(rows);
        let sheet = workbook.add_worksheet();
        sheet.set_name(SUMMARY_SHEET)?;

        sheet.write_string_with_format(0, 0, "Analysis Summary", &bold)?;
        let mut r = 1;
        for (label, count) in summary.counts() {
            sheet.write_string(r, 0, label)?;
            sheet.write_number(r, 1, count as f64)?;
            r += 1;
        }

        // one blank row before the gene table
        r += 1;
        sheet.write_string_with_format(r, 0, "Gene Distribution", &bold)?;
        for (gene, count) in &summary.gene_counts {
            r += 1;
            sheet.write_string(r, 0, gene.as_str())?;
            sheet.write_number(r, 1, *count as f64)?;
        }

        sheet.set_column_width(0, 30.0)?;
        sheet.set_column_width(1, 15.0)?;
    }

    workbook.save(path)?;
    Ok(())
}
