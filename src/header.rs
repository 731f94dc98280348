//! VCF header metadata.
//!
//! Reads `##INFO` lines so the evaluator knows which fields are single-valued
//! and which are flags. Fields that are not declared fall back to splitting
//! on commas.

use std::collections::HashMap;

/// How many values an INFO field carries (`Number=`).
#[derive(Debug, Clone, PartialEq)]
pub enum InfoNumber {
    /// A fixed number of values.
    Count(usize),
    /// One value per alternate allele (A).
    PerAltAllele,
    /// One value per possible genotype (G).
    PerGenotype,
    /// One value per allele including reference (R).
    PerAllele,
    /// Unbounded (.).
    Variable,
}

/// The declared data type of an INFO field (`Type=`).
#[derive(Debug, Clone, PartialEq)]
pub enum InfoType {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

/// Metadata for a single INFO field.
#[derive(Debug, Clone)]
pub struct InfoField {
    pub id: String,
    pub number: InfoNumber,
    pub field_type: InfoType,
    pub description: String,
}

impl InfoField {
    /// A `Number=1` field is never split on commas.
    pub fn is_scalar(&self) -> bool {
        self.number == InfoNumber::Count(1)
    }

    pub fn is_flag(&self) -> bool {
        self.field_type == InfoType::Flag || self.number == InfoNumber::Count(0)
    }
}

/// INFO field ID to its metadata.
pub type InfoMap = HashMap<String, InfoField>;

fn parse_number(s: &str) -> InfoNumber {
    match s {
        "A" => InfoNumber::PerAltAllele,
        "G" => InfoNumber::PerGenotype,
        "R" => InfoNumber::PerAllele,
        "." => InfoNumber::Variable,
        _ => s
            .parse()
            .map(InfoNumber::Count)
            .unwrap_or(InfoNumber::Variable),
    }
}

fn parse_type(s: &str) -> InfoType {
    match s {
        "Integer" => InfoType::Integer,
        "Float" => InfoType::Float,
        "Flag" => InfoType::Flag,
        "Character" => InfoType::Character,
        _ => InfoType::String,
    }
}

/// Split `ID=DP,Number=1,...` into attributes, honouring quoted values.
fn parse_info_attrs(content: &str) -> HashMap<&str, &str> {
    let mut attrs = HashMap::new();
    let mut rest = content;

    while let Some((key, tail)) = rest.split_once('=') {
        let key = key.trim();
        let (value, tail) = match tail.strip_prefix('"') {
            Some(quoted) => {
                let end = quoted.find('"').unwrap_or(quoted.len());
                let after = quoted.get(end + 1..).unwrap_or("");
                (&quoted[..end], after.strip_prefix(',').unwrap_or(after))
            }
            None => tail.split_once(',').unwrap_or((tail, "")),
        };
        attrs.insert(key, value);
        rest = tail;
    }

    attrs
}

fn parse_info_line(line: &str) -> Option<InfoField> {
    let body = line.strip_prefix("##INFO=<")?.strip_suffix('>')?;
    let attrs = parse_info_attrs(body);

    Some(InfoField {
        id: attrs.get("ID")?.to_string(),
        number: parse_number(attrs.get("Number")?),
        field_type: parse_type(attrs.get("Type")?),
        description: attrs
            .get("Description")
            .map(|d| d.to_string())
            .unwrap_or_default(),
    })
}

/// Collect every `##INFO` declaration in a header block.
///
/// Malformed declarations are skipped rather than rejected; the filter still
/// works on undeclared fields.
pub fn parse_header(header: &str) -> InfoMap {
    header
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("##INFO=<"))
        .filter_map(parse_info_line)
        .map(|field| (field.id.clone(), field))
        .collect()
}
