//! Values compared by the criteria evaluator.

use std::borrow::Cow;
use std::fmt;

/// An INFO value as seen by the evaluator.
///
/// Values stay textual until compared; numeric coercion happens per
/// comparison so a field can mix numbers and symbols (e.g. `0.5,.`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Raw text of a single value.
    String(String),
    /// A flag field (present without `=`).
    Bool(bool),
    /// A multi-valued field, one entry per allele.
    Array(Vec<Value>),
    /// The field is not present in the record.
    Missing,
}

impl Value {
    /// Returns true if this value is missing.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Attempts to coerce to a float.
    ///
    /// Flags coerce to `1.0`/`0.0`; text is trimmed before parsing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Text used when numeric coercion fails.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// The individual values to reduce over.
    ///
    /// Scalars become a one-element list; a missing value has none.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Value::Array(arr) => arr.iter().collect(),
            Value::Missing => Vec::new(),
            scalar => vec![scalar],
        }
    }

    /// Returns the type name for log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Bool(_) => "flag",
            Value::Array(_) => "array",
            Value::Missing => "missing",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(arr) => {
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                Ok(())
            }
            Value::Missing => write!(f, "."),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Missing,
        }
    }
}
