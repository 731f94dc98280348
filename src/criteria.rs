//! Filter criteria loaded from a JSON file.
//!
//! A criteria file is a JSON object mapping INFO fields to conditions:
//!
//! ```json
//! {
//!     "AF": ">=0.01",
//!     "DP": ">20",
//!     "_multiallelic_strategy": "all"
//! }
//! ```
//!
//! Keys starting with `_` are settings, not fields. Conditions are parsed
//! with chumsky.

use std::fmt;
use std::fs;
use std::path::Path;

use chumsky::prelude::*;
use serde_json::Value as JsonValue;

use crate::error::{Result, VcfError};

/// Settings key selecting the multi-allelic reduction.
pub const STRATEGY_KEY: &str = "_multiallelic_strategy";

/// Comparison operators supported in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    GtEq,  // >=
    LtEq,  // <=
    Eq,    // ==
    NotEq, // !=
    Gt,    // >
    Lt,    // <
}

impl CmpOp {
    /// Operators in matching priority: two-character tokens first, so that
    /// `>=` is never read as `>`.
    pub const PRIORITY: [CmpOp; 6] = [
        CmpOp::GtEq,
        CmpOp::LtEq,
        CmpOp::Eq,
        CmpOp::NotEq,
        CmpOp::Gt,
        CmpOp::Lt,
    ];

    pub fn token(self) -> &'static str {
        match self {
            CmpOp::GtEq => ">=",
            CmpOp::LtEq => "<=",
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Gt => ">",
            CmpOp::Lt => "<",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// How a multi-valued INFO field is reduced to one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiallelicStrategy {
    /// At least one value satisfies the condition.
    #[default]
    Any,
    /// Every value satisfies the condition.
    All,
    /// Only the first value is considered.
    First,
}

impl MultiallelicStrategy {
    /// Unrecognised names fall back to `Any`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "all" => MultiallelicStrategy::All,
            "first" => MultiallelicStrategy::First,
            "any" => MultiallelicStrategy::Any,
            other => {
                log::warn!("Unknown multiallelic strategy '{}', using 'any'", other);
                MultiallelicStrategy::Any
            }
        }
    }
}

/// A single `field op value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: String,
    pub op: CmpOp,
    pub expected: String,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op, self.expected)
    }
}

/// Parsed criteria, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub criteria: Vec<Criterion>,
    pub strategy: MultiallelicStrategy,
}

/// Split at the first occurrence of `op`, keeping the text after it.
fn split_at(op: CmpOp) -> impl Parser<char, (CmpOp, String), Error = Simple<char>> + Clone {
    take_until(just(op.token()))
        .ignore_then(any().repeated().collect::<String>())
        .map(move |rhs| (op, rhs))
}

/// Create the condition parser.
///
/// Each operator is tried in priority order over the whole condition; the
/// first one present anywhere wins, and the split happens at its first
/// occurrence. Text before the operator is ignored, so `">=0.01"` and
/// `"AF>=0.01"` parse the same.
pub fn condition_parser() -> impl Parser<char, (CmpOp, String), Error = Simple<char>> {
    choice((
        split_at(CmpOp::GtEq),
        split_at(CmpOp::LtEq),
        split_at(CmpOp::Eq),
        split_at(CmpOp::NotEq),
        split_at(CmpOp::Gt),
        split_at(CmpOp::Lt),
    ))
    .then_ignore(end())
}

/// Parse one condition string for `field`.
pub fn parse_condition(field: &str, condition: &str) -> Result<Criterion> {
    let (op, rhs) = condition_parser()
        .parse(condition)
        .map_err(|_| VcfError::InvalidCondition {
            field: field.to_string(),
            condition: condition.to_string(),
        })?;

    Ok(Criterion {
        field: field.to_string(),
        op,
        expected: rhs.trim().to_string(),
    })
}

impl Criteria {
    /// Load and parse a criteria file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| VcfError::CriteriaLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Parse criteria from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let json: JsonValue =
            serde_json::from_str(text).map_err(|e| VcfError::CriteriaLoad(e.to_string()))?;

        let object = json.as_object().ok_or_else(|| {
            VcfError::CriteriaLoad("Criteria file must be a JSON object".to_string())
        })?;

        let mut parsed = Criteria::default();
        for (field, condition) in object {
            if field.starts_with('_') {
                if field == STRATEGY_KEY {
                    parsed.strategy = condition
                        .as_str()
                        .map(MultiallelicStrategy::from_name)
                        .unwrap_or_default();
                }
                continue;
            }

            let condition = condition.as_str().ok_or_else(|| VcfError::InvalidCondition {
                field: field.clone(),
                condition: condition.to_string(),
            })?;
            parsed.criteria.push(parse_condition(field, condition)?);
        }

        log::debug!(
            "Loaded {} criteria (strategy {:?}): {}",
            parsed.criteria.len(),
            parsed.strategy,
            parsed
                .criteria
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(parsed)
    }

    /// Monitored INFO fields, in file order.
    pub fn fields(&self) -> Vec<&str> {
        self.criteria.iter().map(|c| c.field.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn criterion(field: &str, op: CmpOp, expected: &str) -> Criterion {
        Criterion {
            field: field.to_string(),
            op,
            expected: expected.to_string(),
        }
    }

    #[test]
    fn test_parse_prefix_operator() {
        let c = parse_condition("AF", ">=0.01").unwrap();
        assert_eq!(c, criterion("AF", CmpOp::GtEq, "0.01"));
    }

    #[test]
    fn test_two_char_operator_wins_over_prefix() {
        assert_eq!(parse_condition("AF", "AF>=0.01").unwrap().op, CmpOp::GtEq);
        assert_eq!(parse_condition("DP", "<=5").unwrap().op, CmpOp::LtEq);
        assert_eq!(parse_condition("DP", "> 5").unwrap().op, CmpOp::Gt);
        assert_eq!(parse_condition("DP", "<5").unwrap().op, CmpOp::Lt);
    }

    #[test]
    fn test_priority_is_by_operator_not_position() {
        // `>=` outranks a `<` that appears earlier in the text.
        let c = parse_condition("X", "<a>=b").unwrap();
        assert_eq!(c.op, CmpOp::GtEq);
        assert_eq!(c.expected, "b");
    }

    #[test]
    fn test_equality_operators_and_text_values() {
        assert_eq!(
            parse_condition("CLNSIG", "==Pathogenic").unwrap(),
            criterion("CLNSIG", CmpOp::Eq, "Pathogenic")
        );
        assert_eq!(
            parse_condition("CLNSIG", "!= Benign ").unwrap(),
            criterion("CLNSIG", CmpOp::NotEq, "Benign")
        );
    }

    #[test]
    fn test_condition_without_operator_is_error() {
        let err = parse_condition("DP", "20").unwrap_err();
        assert!(matches!(err, VcfError::InvalidCondition { ref field, .. } if field == "DP"));
        assert!(parse_condition("DP", "").is_err());
        assert!(parse_condition("DP", "=5").is_err());
    }

    #[test]
    fn test_load_from_json_keeps_order_and_strategy() {
        let criteria = Criteria::from_json_str(
            r#"{"QD": ">2.0", "AF": ">=0.1", "_multiallelic_strategy": "all", "_note": "x"}"#,
        )
        .unwrap();

        assert_eq!(criteria.fields(), vec!["QD", "AF"]);
        assert_eq!(criteria.strategy, MultiallelicStrategy::All);
        assert_eq!(criteria.criteria[1], criterion("AF", CmpOp::GtEq, "0.1"));
    }

    #[test]
    fn test_default_and_unknown_strategy() {
        let criteria = Criteria::from_json_str(r#"{"DP": ">=20"}"#).unwrap();
        assert_eq!(criteria.strategy, MultiallelicStrategy::Any);

        let criteria =
            Criteria::from_json_str(r#"{"_multiallelic_strategy": "most"}"#).unwrap();
        assert_eq!(criteria.strategy, MultiallelicStrategy::Any);
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Criteria::from_json_str("[1, 2]").unwrap_err(),
            VcfError::CriteriaLoad(_)
        ));
        assert!(matches!(
            Criteria::from_json_str("{not json").unwrap_err(),
            VcfError::CriteriaLoad(_)
        ));
        assert!(matches!(
            Criteria::from_json_str(r#"{"DP": 20}"#).unwrap_err(),
            VcfError::InvalidCondition { .. }
        ));
        assert!(matches!(
            Criteria::from_path(Path::new("/nonexistent/criteria.json")).unwrap_err(),
            VcfError::CriteriaLoad(_)
        ));
    }
}
