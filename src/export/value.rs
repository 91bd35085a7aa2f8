//! Cell values
//!
//! `RawValue` is what a storage row yields; `ExportValue` is what a renderer
//! writes. The conversion between them is where report formatting happens.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Text form used for every date and timestamp in an export
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A scalar as read from a storage row.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Integer(i64),
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Integer(value.into())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<Decimal> for RawValue {
    fn from(value: Decimal) -> Self {
        RawValue::Decimal(value)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(value: NaiveDate) -> Self {
        RawValue::Date(value)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(value: NaiveDateTime) -> Self {
        RawValue::DateTime(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// A formatted scalar, ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ExportValue {
    /// Text form for renderers that only place strings; null becomes ""
    pub fn to_text(&self) -> String {
        match self {
            ExportValue::Null => String::new(),
            ExportValue::Bool(b) => b.to_string(),
            ExportValue::Integer(n) => n.to_string(),
            ExportValue::Float(f) => float_text(*f),
            ExportValue::Text(s) => s.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ExportValue::Null)
    }
}

/// Floats always show a fractional part: `100.0`, `1234.5`.
fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl From<RawValue> for ExportValue {
    fn from(value: RawValue) -> Self {
        match value {
            RawValue::Null => ExportValue::Null,
            RawValue::Bool(b) => ExportValue::Bool(b),
            RawValue::Integer(n) => ExportValue::Integer(n),
            RawValue::Text(s) => ExportValue::Text(s),
            // Reporting only; settlement math stays in Decimal.
            RawValue::Decimal(d) => ExportValue::Float(d.to_f64().unwrap_or_default()),
            RawValue::Date(d) => {
                ExportValue::Text(format!("{} 00:00:00", d.format("%Y-%m-%d")))
            }
            RawValue::DateTime(dt) => ExportValue::Text(dt.format(DATETIME_FORMAT).to_string()),
        }
    }
}
