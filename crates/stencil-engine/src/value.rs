// SPDX-License-Identifier: Apache-2.0 OR MIT
//! The universal runtime value threaded through binding resolution and the
//! filter pipeline.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Opaque host object exposed to templates through reflected field access.
///
/// Only named, readable fields cross the boundary; there is no way to invoke
/// behavior through this trait, which is what makes the engine's "no method
/// calls" rule enforceable at the type level.
pub trait HostObject: fmt::Debug + Send + Sync {
    /// Reads a public field by name.
    fn get(&self, name: &str) -> Option<Value>;

    /// Names of the readable fields, in declaration order. Drives model
    /// explosion and JSON serialization.
    fn fields(&self) -> Vec<String>;

    fn type_name(&self) -> &'static str {
        "object"
    }
}

/// Runtime value. A tagged union covering every shape a template can bind,
/// plus the distinguished [`Value::Unresolved`] marker and the
/// [`Value::Raw`] pre-escaped carrier.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<FixedOffset>),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    Host(Arc<dyn HostObject>),
    /// Pre-escaped output; the composer emits it verbatim.
    Raw(String),
    /// A name or filter produced no result. Distinct from `Null`: null is a
    /// legitimate value that renders empty, Unresolved triggers passthrough
    /// of the original placeholder text unless a filter consumes it.
    Unresolved,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Value::Unresolved)
    }

    /// Truthiness: `null`, Unresolved, `false`, integer `0`, and the empty
    /// string are falsy. Whitespace strings and every other value are truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Unresolved => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) | Value::Raw(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view, parsing numeric strings as a convenience for template
    /// authors. Returns `None` for everything else.
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) | Value::Raw(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Timestamp view, parsing strings in the well-known
    /// `YYYY-MM-DD[THH:MM:SS[Z]]` shapes.
    pub fn coerce_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::String(s) | Value::Raw(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Rendered form of the value. Null and Unresolved stringify to the empty
    /// string; containers stringify to their canonical JSON.
    pub fn stringify(&self) -> String {
        match self {
            Value::Null | Value::Unresolved => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::String(s) | Value::Raw(s) => s.clone(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%SZ").to_string(),
            Value::Array(_) | Value::Object(_) | Value::Host(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Host(host) => host.type_name(),
            Value::Raw(_) => "raw",
            Value::Unresolved => "unresolved",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Unresolved, Value::Unresolved) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b))
            | (Value::Raw(a), Value::Raw(b))
            | (Value::String(a), Value::Raw(b))
            | (Value::Raw(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Host(a), Value::Host(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Unresolved => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) | Value::Raw(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            Value::Host(host) => {
                let fields = host.fields();
                let mut out = serializer.serialize_map(Some(fields.len()))?;
                for name in fields {
                    out.serialize_entry(&name, &host.get(&name).unwrap_or(Value::Null))?;
                }
                out.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Floats print without a trailing `.0` so that evenly-divisible division
/// results read as integers (`4 / 4` renders `1`, `3 / 4` renders `0.75`).
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let mut s = format!("{value}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

/// Parses the well-known date shapes used in coercion: `YYYY-MM-DD`,
/// `YYYY-MM-DDTHH:MM:SS`, and the same with a trailing `Z`.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive).fixed_offset());
    }
    None
}
