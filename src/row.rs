//! VCF data row parser.
//!
//! Parses the eight fixed columns of a VCF data line. INFO values are kept as
//! raw text; typing happens later, when a value is compared.

use crate::error::{Result, VcfError};
use crate::header::InfoMap;
use crate::value::Value;

/// Number of mandatory VCF columns (CHROM through INFO).
pub const FIXED_COLUMNS: usize = 8;

/// Column index of FILTER.
pub const FILTER_COLUMN: usize = 6;

/// INFO entries in the order they appear on the line.
///
/// A bare key (a flag) is stored with no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoFields {
    entries: Vec<(String, Option<String>)>,
}

impl InfoFields {
    /// Raw value of a `key=value` entry. Flags have no value and are skipped.
    ///
    /// When a key is repeated the last value wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, v)| k == key && v.is_some())
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether the key appears at all, as a flag or with a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in line order, first occurrence only.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::with_capacity(self.entries.len());
        for (k, _) in &self.entries {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Typed view of a field for the evaluator.
    ///
    /// Values are split on commas unless the header declares `Number=1`.
    /// A bare key, or any occurrence of a header-declared flag, yields
    /// `Bool(true)`. The VCF missing marker `.` yields `Missing`, for the
    /// whole value or for one element of a list.
    pub fn value(&self, key: &str, info_map: &InfoMap) -> Value {
        if info_map.get(key).is_some_and(|f| f.is_flag()) && self.contains(key) {
            return Value::Bool(true);
        }

        if let Some(raw) = self.get(key) {
            let scalar = info_map.get(key).map(|f| f.is_scalar()).unwrap_or(false);
            if scalar || !raw.contains(',') {
                return missing_or_text(raw);
            }
            return Value::Array(raw.split(',').map(missing_or_text).collect());
        }

        if self.contains(key) {
            Value::Bool(true)
        } else {
            Value::Missing
        }
    }

    fn insert(&mut self, key: &str, value: Option<&str>) {
        self.entries
            .push((key.to_string(), value.map(str::to_string)));
    }
}

fn missing_or_text(raw: &str) -> Value {
    match raw.trim() {
        "." => Value::Missing,
        _ => Value::from(raw),
    }
}

/// A parsed VCF data row.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRow {
    /// Chromosome (CHROM column).
    pub chrom: String,
    /// 1-based position (POS column).
    pub pos: u64,
    /// Variant ID (ID column); `.` is stored as `None`.
    pub id: Option<String>,
    /// Reference allele (REF column).
    pub ref_allele: String,
    /// Alternate allele(s) (ALT column), unsplit.
    pub alt_allele: String,
    /// Quality (QUAL column), unparsed.
    pub qual: String,
    /// Filter status (FILTER column), unparsed.
    pub filter: String,
    pub info: InfoFields,
}

impl VcfRow {
    pub fn is_pass(&self) -> bool {
        self.filter == "PASS"
    }

    /// Identifier when it looks like a dbSNP rs-ID.
    pub fn rs_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| id.starts_with("rs"))
    }
}

/// Parse the INFO column into ordered entries.
pub fn parse_info_column(info: &str) -> InfoFields {
    let mut fields = InfoFields::default();
    if info == "." {
        return fields;
    }

    for item in info.split(';').filter(|item| !item.is_empty()) {
        match item.split_once('=') {
            Some((key, value)) => fields.insert(key, Some(value)),
            None => fields.insert(item, None),
        }
    }

    fields
}

/// Parse a single VCF data row.
///
/// Returns `Ok(None)` when the line has fewer than eight columns. A position
/// that is not an integer is an error.
pub fn parse_row(line: &str) -> Result<Option<VcfRow>> {
    let fields: Vec<&str> = line.trim().split('\t').collect();

    if fields.len() < FIXED_COLUMNS {
        return Ok(None);
    }

    let pos = fields[1].parse::<u64>().map_err(|e| {
        VcfError::RowParse(format!("Invalid POS '{}': {}", fields[1], e))
    })?;

    let id = match fields[2] {
        "." => None,
        id => Some(id.to_string()),
    };

    Ok(Some(VcfRow {
        chrom: fields[0].to_string(),
        pos,
        id,
        ref_allele: fields[3].to_string(),
        alt_allele: fields[4].to_string(),
        qual: fields[5].to_string(),
        filter: fields[FILTER_COLUMN].to_string(),
        info: parse_info_column(fields[7]),
    }))
}
