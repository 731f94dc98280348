//! Lookup interface used by the annotator.

use std::collections::HashMap;

use crate::error::LookupError;

/// Outcome of one remote lookup.
///
/// `Ok(None)` means the service answered but had nothing for the variant;
/// `Err` means the service could not be asked.
pub type LookupResult<T> = std::result::Result<Option<T>, LookupError>;

/// Gene overlapping a variant position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneInfo {
    pub gene_id: Option<String>,
    pub gene_name: Option<String>,
    pub description: Option<String>,
    pub biotype: Option<String>,
}

/// Variant-level annotation from Ensembl.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantInfo {
    pub clinical_significance: Vec<String>,
    pub phenotypes: Vec<String>,
    pub minor_allele_freq: Option<f64>,
    pub synonyms: Vec<String>,
}

/// The remote data the annotator draws on.
pub trait AnnotationSource {
    /// First gene overlapping `chrom:pos`.
    fn gene_at(&self, chrom: &str, pos: u64) -> LookupResult<GeneInfo>;

    /// Variant record for a dbSNP rs-ID.
    fn variant_by_id(&self, rs_id: &str) -> LookupResult<VariantInfo>;

    /// Variant starting at `chrom:pos` whose reference allele is `ref_allele`.
    fn variant_at(&self, chrom: &str, pos: u64, ref_allele: &str) -> LookupResult<VariantInfo>;

    /// Disease titles for a ClinVar search term.
    fn search_diseases(&self, term: &str) -> LookupResult<Vec<String>>;
}

/// ClinVar search term for a genomic position (GRCh37 coordinates).
pub fn position_term(chrom: &str, pos: u64) -> String {
    format!("{}[chr] AND {}[chrpos37]", strip_chr(chrom), pos)
}

/// Ensembl expects bare chromosome names.
pub fn strip_chr(chrom: &str) -> &str {
    chrom.strip_prefix("chr").unwrap_or(chrom)
}

/// In-memory source for tests and offline runs.
///
/// Positions are keyed by `chrom:pos` with the chromosome as written in the
/// VCF. Anything not registered is reported as not found; a source built
/// with [`MemorySource::offline`] fails every lookup instead.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    genes: HashMap<String, GeneInfo>,
    variants_by_id: HashMap<String, VariantInfo>,
    variants_by_pos: HashMap<String, (String, VariantInfo)>,
    diseases: HashMap<String, Vec<String>>,
    offline: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every lookup fails with a transport error.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    pub fn with_gene(mut self, chrom: &str, pos: u64, gene: GeneInfo) -> Self {
        self.genes.insert(format!("{}:{}", chrom, pos), gene);
        self
    }

    pub fn with_variant_id(mut self, rs_id: &str, info: VariantInfo) -> Self {
        self.variants_by_id.insert(rs_id.to_string(), info);
        self
    }

    pub fn with_variant_at(mut self, chrom: &str, pos: u64, ref_allele: &str, info: VariantInfo) -> Self {
        self.variants_by_pos
            .insert(format!("{}:{}", chrom, pos), (ref_allele.to_string(), info));
        self
    }

    pub fn with_diseases(mut self, term: &str, titles: &[&str]) -> Self {
        self.diseases.insert(
            term.to_string(),
            titles.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    fn check_online(&self, what: &str) -> std::result::Result<(), LookupError> {
        if self.offline {
            return Err(LookupError::Transport {
                url: format!("memory://{}", what),
                message: "source is offline".to_string(),
            });
        }
        Ok(())
    }
}

impl AnnotationSource for MemorySource {
    fn gene_at(&self, chrom: &str, pos: u64) -> LookupResult<GeneInfo> {
        self.check_online("gene")?;
        Ok(self.genes.get(&format!("{}:{}", chrom, pos)).cloned())
    }

    fn variant_by_id(&self, rs_id: &str) -> LookupResult<VariantInfo> {
        self.check_online("variation")?;
        Ok(self.variants_by_id.get(rs_id).cloned())
    }

    fn variant_at(&self, chrom: &str, pos: u64, ref_allele: &str) -> LookupResult<VariantInfo> {
        self.check_online("variation")?;
        Ok(self
            .variants_by_pos
            .get(&format!("{}:{}", chrom, pos))
            .filter(|(r, _)| r == ref_allele)
            .map(|(_, info)| info.clone()))
    }

    fn search_diseases(&self, term: &str) -> LookupResult<Vec<String>> {
        self.check_online("clinvar")?;
        Ok(self.diseases.get(term).cloned())
    }
}
