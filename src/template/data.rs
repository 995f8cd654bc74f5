// Placeholder values
//
// A data map binds placeholder names to values. Values are usually scalars,
// but block-level builders also consume lists, tables (first row = headers),
// records and lists of records. Deserializes straight from JSON data files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell or field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

/// A value bound to a placeholder name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Scalar(Scalar),
    /// Rows of cells, first row = headers
    Table(Vec<Vec<Scalar>>),
    List(Vec<Scalar>),
    Record(BTreeMap<String, Scalar>),
    Records(Vec<BTreeMap<String, Scalar>>),
}

impl DataValue {
    /// Text used when the value is substituted inline
    ///
    /// Lists are joined with `", "`; block-shaped values (tables, records)
    /// have no inline form and render empty.
    pub fn inline_text(&self) -> String {
        match self {
            DataValue::Scalar(s) => s.to_string(),
            DataValue::List(items) => items
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            DataValue::Table(_) | DataValue::Record(_) | DataValue::Records(_) => String::new(),
        }
    }

    /// Table rows rendered as text, if this value is a table
    pub fn as_table(&self) -> Option<Vec<Vec<String>>> {
        match self {
            DataValue::Table(rows) => Some(
                rows.iter()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::Scalar(Scalar::from(s))
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::Scalar(Scalar::Text(s))
    }
}

/// Placeholder name to value mapping. Keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataMap {
    values: BTreeMap<String, DataValue>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<DataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<DataValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Inline text for a key, `None` when the key is absent
    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(DataValue::inline_text)
    }

    /// Table rows for a key holding a non-empty table
    pub fn table(&self, key: &str) -> Option<Vec<Vec<String>>> {
        self.values
            .get(key)
            .and_then(DataValue::as_table)
            .filter(|rows| !rows.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DataValue)> {
        self.values.iter()
    }

    /// Load a data map from a JSON object file
    pub fn from_json_str(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<(String, DataValue)> for DataMap {
    fn from_iter<I: IntoIterator<Item = (String, DataValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
