//! Cell value model.

use chrono::{NaiveDateTime, NaiveTime};
use serde_json::Value;

/// Format used for date-time values in exported JSON.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format used for time-of-day values in exported JSON.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// The literal content of a worksheet cell.
///
/// Formulas are kept as written; nothing here is ever evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CellValue {
    /// No stored value.
    #[default]
    Empty,
    /// Numeric literal written without a fraction or exponent.
    Int(i64),
    /// Any other numeric literal.
    Float(f64),
    /// Shared, inline, or formula-typed string.
    Text(String),
    Bool(bool),
    /// Error literal such as `#DIV/0!`.
    Error(String),
    /// Number formatted as a date, or an ISO date cell.
    DateTime(NaiveDateTime),
    /// Number formatted as a time of day.
    Time(NaiveTime),
    /// Single-cell formula, stored with its leading `=`.
    Formula(String),
    /// Formula entered over a range. `text` carries no leading `=`.
    ArrayFormula {
        /// The range the formula spills over, e.g. "D1:D3"
        range: String,
        text: String,
    },
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Build a numeric value from its stored literal.
    ///
    /// Literals without `.`, `e` or `E` become integers when they fit an
    /// `i64`; everything else is a float. Returns `None` for non-numbers.
    pub fn from_number_literal(literal: &str) -> Option<Self> {
        let literal = literal.trim();
        if literal.is_empty() {
            return None;
        }
        if !literal.contains(['.', 'e', 'E']) {
            if let Ok(n) = literal.parse::<i64>() {
                return Some(CellValue::Int(n));
            }
        }
        literal.parse::<f64>().ok().map(CellValue::Float)
    }

    /// Numeric view of the value, used for date conversion.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The JSON value written for this cell.
    ///
    /// Array formulas become plain formula strings (`"=" + text`) since JSON
    /// has no separate array-formula type.
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Empty => Value::Null,
            CellValue::Int(n) => Value::from(*n),
            CellValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CellValue::Text(s) | CellValue::Error(s) | CellValue::Formula(s) => {
                Value::String(s.clone())
            }
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
            CellValue::Time(t) => Value::String(t.format(TIME_FORMAT).to_string()),
            CellValue::ArrayFormula { text, .. } => Value::String(format!("={}", text)),
        }
    }
}

impl From<&CellValue> for Value {
    fn from(value: &CellValue) -> Self {
        value.to_json()
    }
}
