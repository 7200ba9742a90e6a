//! Core types for flowdb

use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{Error, Result};

/// A database value that can represent any SQL type the node handles
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// JSON value (arrays and nested objects from message payloads)
    Json(serde_json::Value),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert a JSON payload element into a bindable value.
    ///
    /// Numbers that fit an i64 stay integral; everything else numeric is
    /// carried as f64, matching the host runtime's number model. Arrays and
    /// objects are kept as JSON and bound as serialized literals.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Bool(*v),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float64(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::Json(other.clone()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Float64(v) => {
                if v.is_finite() {
                    serializer.serialize_f64(*v)
                } else {
                    // JSON has no representation for NaN or infinity
                    Err(serde::ser::Error::custom(
                        "non-finite number cannot be represented in JSON",
                    ))
                }
            }
            Value::String(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&String::from_utf8_lossy(v)),
            Value::Date(v) => serializer.collect_str(&v.format("%Y-%m-%d")),
            Value::DateTime(v) => serializer.collect_str(&v.format("%Y-%m-%d %H:%M:%S")),
            Value::Json(v) => v.serialize(serializer),
        }
    }
}

/// A row from a query result
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Column values
    pub values: Vec<Value>,
    /// Column names
    columns: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values.iter()) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Driver status for statements that do not produce a result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecStatus {
    /// Rows affected by the statement
    pub affected_rows: u64,
    /// Auto-generated id of the last inserted row, if any
    pub last_insert_id: Option<u64>,
}

/// Result of a single query, tagged by the shape the driver reported.
///
/// SELECT-like statements produce `Rows`; DML statements produce `Status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    /// Result rows
    Rows(Vec<Row>),
    /// Driver status object
    Status(ExecStatus),
}

impl QueryOutcome {
    /// Serialize the outcome to a plain JSON value.
    ///
    /// This is the deep copy attached to the outbound message payload;
    /// the rows themselves are never shared with the caller.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(Error::from)
    }

    /// Check if the outcome carries rows
    pub fn is_rows(&self) -> bool {
        matches!(self, QueryOutcome::Rows(_))
    }
}

/// Query parameters extracted from a message payload.
///
/// An array payload binds positionally against `?` placeholders; an object
/// payload binds by name against `:name` tokens. Any other payload shape
/// runs the query without parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    /// No parameters
    #[default]
    Empty,
    /// Positional parameters for `?` placeholders
    Positional(Vec<Value>),
    /// Named parameters for `:name` tokens
    Named(BTreeMap<String, Value>),
}

impl Params {
    /// Derive parameters from an inbound message payload.
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        match payload {
            serde_json::Value::Array(items) => {
                Params::Positional(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Params::Named(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
            _ => Params::Empty,
        }
    }

    /// Check if there are no parameters to bind
    pub fn is_empty(&self) -> bool {
        match self {
            Params::Empty => true,
            Params::Positional(values) => values.is_empty(),
            Params::Named(map) => map.is_empty(),
        }
    }
}
