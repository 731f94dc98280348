//! HTTP clients for Ensembl REST and NCBI E-utilities.

use std::collections::HashMap;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::source::{strip_chr, AnnotationSource, GeneInfo, LookupResult, VariantInfo};
use super::AnnotatorConfig;
use crate::constants::{CLINVAR_SEARCH_MAX, CLINVAR_SUMMARY_MAX};
use crate::error::{LookupError, Result, VcfError};

/// Gene entry from `/overlap/region`.
#[derive(Debug, Deserialize)]
struct EnsemblGene {
    id: Option<String>,
    external_name: Option<String>,
    description: Option<String>,
    biotype: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EnsemblMapping {
    start: Option<u64>,
    allele_string: Option<String>,
}

/// Response from `/variation/human/...`.
#[derive(Debug, Deserialize)]
struct EnsemblVariation {
    clinical_significance: Option<Vec<String>>,
    phenotypes: Option<Vec<JsonValue>>,
    minor_allele_freq: Option<f64>,
    synonyms: Option<Vec<String>>,
    mappings: Option<Vec<EnsemblMapping>>,
}

impl EnsemblVariation {
    /// Phenotypes come back as objects with a `trait` name; older responses
    /// use plain strings.
    fn phenotype_names(phenotypes: Vec<JsonValue>) -> Vec<String> {
        phenotypes
            .into_iter()
            .filter_map(|p| match p {
                JsonValue::String(s) => Some(s),
                JsonValue::Object(map) => map
                    .get("trait")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect()
    }

    /// Whether any mapping starts at `pos` with `ref_allele` as its first allele.
    fn maps_to(&self, pos: u64, ref_allele: &str) -> bool {
        self.mappings.iter().flatten().any(|m| {
            m.start == Some(pos)
                && m.allele_string
                    .as_deref()
                    .and_then(|a| a.split('/').next())
                    == Some(ref_allele)
        })
    }

    fn into_info(self) -> VariantInfo {
        VariantInfo {
            clinical_significance: self.clinical_significance.unwrap_or_default(),
            phenotypes: Self::phenotype_names(self.phenotypes.unwrap_or_default()),
            minor_allele_freq: self.minor_allele_freq,
            synonyms: self.synonyms.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: Option<ESearchResult>,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: HashMap<String, JsonValue>,
}

/// Blocking client for the public Ensembl and ClinVar services.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: Client,
    ensembl_url: String,
    eutils_url: String,
}

impl RemoteSource {
    pub fn new(config: &AnnotatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VcfError::Client(e.to_string()))?;

        Ok(Self {
            client,
            ensembl_url: config.ensembl_url.trim_end_matches('/').to_string(),
            eutils_url: config.eutils_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoints this client talks to, for log messages.
    pub fn describe(&self) -> String {
        format!("ensembl={} eutils={}", self.ensembl_url, self.eutils_url)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<T, LookupError> {
        log::trace!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| LookupError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().map_err(|e| LookupError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn ensembl_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
    ) -> std::result::Result<T, LookupError> {
        let url = format!("{}/{}", self.ensembl_url, path);
        let mut query = extra.to_vec();
        query.push(("content-type", "application/json".to_string()));
        self.get_json(&url, &query)
    }

    /// Titles for the first few ClinVar ids, in id order.
    fn clinvar_titles(&self, ids: &[String]) -> std::result::Result<Vec<String>, LookupError> {
        let ids = &ids[..ids.len().min(CLINVAR_SUMMARY_MAX)];
        let url = format!("{}/esummary.fcgi", self.eutils_url);
        let summary: ESummaryResponse = self.get_json(
            &url,
            &[
                ("db", "clinvar".to_string()),
                ("id", ids.join(",")),
                ("retmode", "json".to_string()),
            ],
        )?;

        Ok(ids
            .iter()
            .filter_map(|uid| summary.result.get(uid))
            .filter_map(|entry| entry.get("title").and_then(JsonValue::as_str))
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl AnnotationSource for RemoteSource {
    fn gene_at(&self, chrom: &str, pos: u64) -> LookupResult<GeneInfo> {
        let genes: Vec<EnsemblGene> = self.ensembl_json(
            &format!("overlap/region/human/{}:{}-{}", strip_chr(chrom), pos, pos),
            &[("feature", "gene".to_string())],
        )?;

        Ok(genes.into_iter().next().map(|g| GeneInfo {
            gene_id: g.id,
            gene_name: g.external_name,
            description: g.description,
            biotype: g.biotype,
        }))
    }

    fn variant_by_id(&self, rs_id: &str) -> LookupResult<VariantInfo> {
        let variation: EnsemblVariation =
            self.ensembl_json(&format!("variation/human/{}", rs_id), &[])?;
        Ok(Some(variation.into_info()))
    }

    fn variant_at(&self, chrom: &str, pos: u64, ref_allele: &str) -> LookupResult<VariantInfo> {
        let variations: Vec<EnsemblVariation> = self.ensembl_json(
            &format!("variation/human/{}:{}-{}:1", strip_chr(chrom), pos, pos),
            &[],
        )?;

        Ok(variations
            .into_iter()
            .find(|v| v.maps_to(pos, ref_allele))
            .map(EnsemblVariation::into_info))
    }

    fn search_diseases(&self, term: &str) -> LookupResult<Vec<String>> {
        let url = format!("{}/esearch.fcgi", self.eutils_url);
        let search: ESearchResponse = self.get_json(
            &url,
            &[
                ("db", "clinvar".to_string()),
                ("term", term.to_string()),
                ("retmode", "json".to_string()),
                ("retmax", CLINVAR_SEARCH_MAX.to_string()),
            ],
        )?;

        let ids = search.esearchresult.map(|r| r.idlist).unwrap_or_default();
        if ids.is_empty() {
            return Ok(None);
        }
        self.clinvar_titles(&ids).map(Some)
    }
}
