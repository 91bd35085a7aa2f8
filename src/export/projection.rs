//! Row projection
//!
//! Turns report rows of any supported shape into ordered `ExportRecord`s.
//! Projection is total: a header the row cannot answer becomes a null cell.

use std::collections::HashMap;

use super::value::{ExportValue, RawValue};

/// A row that exposes named fields, typically a joined entity.
pub trait Attributes {
    /// Value of the named field, or `None` if this row has no such field
    fn attribute(&self, name: &str) -> Option<RawValue>;
}

/// Report rows, grouped by shape.
///
/// The shape is fixed for a whole report, so it is matched once per call
/// rather than checked per field.
pub enum RowSource {
    /// Attribute-bearing records, looked up by header name
    Records(Vec<Box<dyn Attributes + Send + Sync>>),
    /// Positional tuples, looked up by header index
    Tuples(Vec<Vec<RawValue>>),
    /// Key-value mappings, looked up by header name
    Mappings(Vec<HashMap<String, RawValue>>),
}

impl RowSource {
    /// Wrap a vector of concrete attribute rows
    pub fn records<T>(rows: Vec<T>) -> Self
    where
        T: Attributes + Send + Sync + 'static,
    {
        RowSource::Records(
            rows.into_iter()
                .map(|row| Box::new(row) as Box<dyn Attributes + Send + Sync>)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            RowSource::Records(rows) => rows.len(),
            RowSource::Tuples(rows) => rows.len(),
            RowSource::Mappings(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match self {
            RowSource::Records(_) => "Records",
            RowSource::Tuples(_) => "Tuples",
            RowSource::Mappings(_) => "Mappings",
        };
        f.debug_struct("RowSource")
            .field("shape", &shape)
            .field("rows", &self.len())
            .finish()
    }
}

/// One projected row: header names paired with formatted values, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    fields: Vec<(String, ExportValue)>,
}

impl ExportRecord {
    fn from_resolver<F>(headers: &[&str], mut resolve: F) -> Self
    where
        F: FnMut(usize, &str) -> Option<RawValue>,
    {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let raw = resolve(index, header).unwrap_or(RawValue::Null);
                (header.to_string(), ExportValue::from(raw))
            })
            .collect();
        Self { fields }
    }

    /// Value for a header, if the header is part of this record
    pub fn get(&self, header: &str) -> Option<&ExportValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &ExportValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Project every row of `source` onto `headers`.
pub fn project(source: RowSource, headers: &[&str]) -> Vec<ExportRecord> {
    match source {
        RowSource::Records(rows) => rows
            .iter()
            .map(|row| ExportRecord::from_resolver(headers, |_, name| row.attribute(name)))
            .collect(),
        RowSource::Tuples(rows) => rows
            .into_iter()
            .map(|row| ExportRecord::from_resolver(headers, |index, _| row.get(index).cloned()))
            .collect(),
        RowSource::Mappings(rows) => rows
            .into_iter()
            .map(|row| ExportRecord::from_resolver(headers, |_, name| row.get(name).cloned()))
            .collect(),
    }
}
