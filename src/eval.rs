//! Criteria evaluator.
//!
//! Decides whether a VCF row satisfies a set of [`Criteria`].

use std::cmp::Ordering;

use crate::criteria::{CmpOp, Criteria, Criterion, MultiallelicStrategy};
use crate::header::InfoMap;
use crate::row::VcfRow;
use crate::value::Value;

/// How the results of several criteria are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineMode {
    /// Every criterion must hold.
    #[default]
    All,
    /// Only the first criterion in file order decides; the rest are ignored.
    /// Kept for compatibility with criteria files tuned against the older
    /// filter.
    FirstOnly,
}

/// Compare two values with `op`.
///
/// Both sides are coerced to floats; if either fails, the raw texts are
/// compared instead. A missing value satisfies no operator.
pub fn compare_values(actual: &Value, op: CmpOp, expected: &str) -> bool {
    if actual.is_missing() {
        return false;
    }

    let ordering = match (actual.as_number(), expected.trim().parse::<f64>().ok()) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => Some(actual.as_text()[..].cmp(expected)),
    };

    // NaN on either side only satisfies `!=`.
    let Some(ordering) = ordering else {
        return op == CmpOp::NotEq;
    };

    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::NotEq => ordering != Ordering::Equal,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::GtEq => ordering != Ordering::Less,
        CmpOp::LtEq => ordering != Ordering::Greater,
    }
}

/// Reduce a possibly multi-valued field to one decision.
pub fn reduce(value: &Value, criterion: &Criterion, strategy: MultiallelicStrategy) -> bool {
    let values = value.values();
    let check = |v: &&Value| compare_values(v, criterion.op, &criterion.expected);

    match strategy {
        MultiallelicStrategy::Any => values.iter().any(check),
        MultiallelicStrategy::All => values.iter().all(check),
        MultiallelicStrategy::First => values.first().map(check).unwrap_or(false),
    }
}

/// Evaluates rows against a fixed set of criteria.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    criteria: Criteria,
    info_map: InfoMap,
    mode: CombineMode,
}

impl FilterEngine {
    /// Create an engine.
    ///
    /// `info_map` comes from the input's header and decides which fields are
    /// single-valued; it may be empty.
    pub fn new(criteria: Criteria, info_map: InfoMap, mode: CombineMode) -> Self {
        if mode == CombineMode::FirstOnly && criteria.criteria.len() > 1 {
            log::warn!(
                "Only the first criterion ({}) decides; {} more ignored",
                criteria.criteria[0],
                criteria.criteria.len() - 1
            );
        }
        Self {
            criteria,
            info_map,
            mode,
        }
    }

    /// Check one criterion against a row. A field absent from INFO fails.
    pub fn check(&self, criterion: &Criterion, row: &VcfRow) -> bool {
        let value = row.info.value(&criterion.field, &self.info_map);
        if value.is_missing() {
            log::trace!("{}:{} lacks {}", row.chrom, row.pos, criterion.field);
            return false;
        }

        let passed = reduce(&value, criterion, self.criteria.strategy);
        log::trace!(
            "{}:{} {}={} ({}) against {} -> {}",
            row.chrom,
            row.pos,
            criterion.field,
            value,
            value.type_name(),
            criterion,
            passed
        );
        passed
    }

    /// Whether the row satisfies the criteria. No criteria passes everything.
    pub fn passes(&self, row: &VcfRow) -> bool {
        match self.mode {
            CombineMode::All => self.criteria.criteria.iter().all(|c| self.check(c, row)),
            CombineMode::FirstOnly => self
                .criteria
                .criteria
                .first()
                .map(|c| self.check(c, row))
                .unwrap_or(true),
        }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Get the INFO field metadata map.
    pub fn info_map(&self) -> &InfoMap {
        &self.info_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_header;
    use crate::row::parse_row;

    fn engine(json: &str, mode: CombineMode) -> FilterEngine {
        FilterEngine::new(Criteria::from_json_str(json).unwrap(), InfoMap::new(), mode)
    }

    fn row(info: &str) -> VcfRow {
        parse_row(&format!("chr1\t100\t.\tA\tG,T\t50\tLowQual\t{}", info))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_numeric_comparisons() {
        let v = Value::from("30");
        assert!(compare_values(&v, CmpOp::GtEq, "20"));
        assert!(compare_values(&v, CmpOp::Gt, "20"));
        assert!(compare_values(&v, CmpOp::Eq, "30.0"));
        assert!(!compare_values(&v, CmpOp::Lt, "30"));
        assert!(compare_values(&v, CmpOp::LtEq, "30"));
        assert!(compare_values(&v, CmpOp::NotEq, "31"));
        // Numeric, not lexical: 9 < 10.
        assert!(compare_values(&Value::from("9"), CmpOp::Lt, "10"));
    }

    #[test]
    fn test_text_fallback() {
        let v = Value::from("Pathogenic");
        assert!(compare_values(&v, CmpOp::Eq, "Pathogenic"));
        assert!(!compare_values(&v, CmpOp::Eq, "pathogenic"));
        assert!(compare_values(&v, CmpOp::NotEq, "Benign"));
        assert!(compare_values(&v, CmpOp::Gt, "Benign"));
        // One numeric side is not enough for a numeric comparison.
        assert!(compare_values(&Value::from("high"), CmpOp::NotEq, "0.5"));
    }

    #[test]
    fn test_nan_only_satisfies_not_equal() {
        let v = Value::from("nan");
        assert!(!compare_values(&v, CmpOp::Eq, "1"));
        assert!(!compare_values(&v, CmpOp::GtEq, "1"));
        assert!(compare_values(&v, CmpOp::NotEq, "1"));
    }

    #[test]
    fn test_first_strategy_scalar_pass_and_absent_fail() {
        let engine = engine(
            r#"{"DP": ">=20", "_multiallelic_strategy": "first"}"#,
            CombineMode::All,
        );
        assert!(engine.passes(&row("DP=30")));
        assert!(!engine.passes(&row("AF=0.3")));
        assert!(!engine.passes(&row(".")));
    }

    #[test]
    fn test_missing_value_fails_every_operator() {
        let info_map = parse_header("##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Depth\">");
        let check = |json: &str, info: &str| {
            FilterEngine::new(Criteria::from_json_str(json).unwrap(), info_map.clone(), CombineMode::All)
                .passes(&row(info))
        };

        assert!(!check(r#"{"DP": "<20"}"#, "DP=."));
        assert!(!check(r#"{"DP": "!=5"}"#, "DP=."));
        assert!(check(r#"{"DP": "<20"}"#, "DP=4"));
        assert!(!compare_values(&Value::Missing, CmpOp::NotEq, "5"));
    }

    #[test]
    fn test_missing_list_element_fails_only_its_comparison() {
        let any = engine(r#"{"AF": "<0.5"}"#, CombineMode::All);
        let all = engine(
            r#"{"AF": "<0.5", "_multiallelic_strategy": "all"}"#,
            CombineMode::All,
        );
        let first = engine(
            r#"{"AF": "<0.5", "_multiallelic_strategy": "first"}"#,
            CombineMode::All,
        );
        let r = row("AF=.,0.2");

        assert!(any.passes(&r));
        assert!(!all.passes(&r));
        assert!(!first.passes(&r));
    }

    #[test]
    fn test_any_and_all_strategies() {
        let any = engine(r#"{"AF": ">=0.1"}"#, CombineMode::All);
        let all = engine(
            r#"{"AF": ">=0.1", "_multiallelic_strategy": "all"}"#,
            CombineMode::All,
        );
        let first = engine(
            r#"{"AF": ">=0.1", "_multiallelic_strategy": "first"}"#,
            CombineMode::All,
        );
        let r = row("AF=0.001,0.2");

        assert!(any.passes(&r));
        assert!(!all.passes(&r));
        assert!(!first.passes(&r));
        assert!(all.passes(&row("AF=0.5,0.2")));
    }

    #[test]
    fn test_all_mode_requires_every_criterion() {
        let engine = engine(r#"{"DP": ">=20", "AF": ">=0.1"}"#, CombineMode::All);
        assert!(engine.passes(&row("DP=30;AF=0.2")));
        assert!(!engine.passes(&row("DP=30;AF=0.01")));
        assert!(!engine.passes(&row("DP=30")));
    }

    #[test]
    fn test_first_only_mode_ignores_later_criteria() {
        let engine = engine(r#"{"DP": ">=20", "AF": ">=0.1"}"#, CombineMode::FirstOnly);
        assert!(engine.passes(&row("DP=30;AF=0.01")));
        assert!(engine.passes(&row("DP=30")));
        assert!(!engine.passes(&row("DP=10;AF=0.9")));
    }

    #[test]
    fn test_empty_criteria_pass_everything() {
        assert!(engine("{}", CombineMode::All).passes(&row(".")));
        assert!(engine("{}", CombineMode::FirstOnly).passes(&row(".")));
    }

    #[test]
    fn test_header_declared_scalar_is_not_split() {
        let info_map = parse_header(
            r#"##INFO=<ID=NOTE,Number=1,Type=String,Description="Free text">"#,
        );
        let criteria = Criteria::from_json_str(
            r#"{"NOTE": "==a,b", "_multiallelic_strategy": "all"}"#,
        )
        .unwrap();
        let engine = FilterEngine::new(criteria, info_map, CombineMode::All);
        assert!(engine.passes(&row("NOTE=a,b")));
        assert!(!FilterEngine::new(
            engine.criteria().clone(),
            InfoMap::new(),
            CombineMode::All
        )
        .passes(&row("NOTE=a,b")));
    }

    #[test]
    fn test_flag_field_compares_as_one() {
        let info_map =
            parse_header(r#"##INFO=<ID=DB,Number=0,Type=Flag,Description="dbSNP">"#);
        let criteria = Criteria::from_json_str(r#"{"DB": "==1"}"#).unwrap();
        let engine = FilterEngine::new(criteria, info_map, CombineMode::All);
        assert!(engine.passes(&row("DB;DP=3")));
        assert!(!engine.passes(&row("DP=3")));
        assert!(engine.info_map().contains_key("DB"));
    }
}
