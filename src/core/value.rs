// Copyright 2025 SiftQL Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value type for SiftQL - document values with type information
//!
//! This module provides the unified [`Value`] enum representing every kind
//! of node a JSON-shaped document can hold, plus the deep equality, total
//! ordering, and canonical-key machinery the matcher and pipeline build on.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{Error, Result};

/// A document: string keys mapping to values
///
/// Insertion order is preserved; `$sort` and `$project` read their
/// specifications in declaration order. Equality is order-insensitive.
pub type Document = IndexMap<String, Value>;

/// A compiled regular expression usable as a document value
///
/// Equality and ordering compare the pattern string, so two values built
/// from the same pattern are interchangeable.
#[derive(Debug, Clone)]
pub struct ValueRegex(pub Regex);

impl ValueRegex {
    /// Compile a pattern into a value-level regex
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(ValueRegex)
            .map_err(|e| Error::invalid_argument(format!("invalid regex pattern: {}", e)))
    }

    /// The source pattern
    pub fn pattern(&self) -> &str {
        self.0.as_str()
    }

    /// Test the pattern against a string
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

/// A native predicate usable with the `$where` operator
///
/// Treated as a primitive value: cloning is shallow and equality is
/// pointer identity.
#[derive(Clone)]
pub struct NativePredicate(pub Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl NativePredicate {
    /// Wrap a closure as a document-level predicate value
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        NativePredicate(Arc::new(f))
    }

    /// Invoke the predicate against a document
    pub fn test(&self, doc: &Value) -> bool {
        (self.0)(doc)
    }
}

impl fmt::Debug for NativePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativePredicate(<fn>)")
    }
}

/// Type tag of a value, mirroring the document model's primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Date,
    Regexp,
    Array,
    Object,
    Function,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Undefined => "undefined",
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::Regexp => "regexp",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Function => "function",
        };
        write!(f, "{}", name)
    }
}

/// A document value
///
/// `Undefined` models a missing field and is distinct from JSON `null`.
/// `Text` uses `Arc<str>` so cloning documents during pipeline stages stays
/// cheap.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Missing field
    #[default]
    Undefined,

    /// Explicit JSON null
    Null,

    /// Boolean value
    Boolean(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// UTF-8 text (Arc for cheap cloning)
    Text(Arc<str>),

    /// Timestamp (UTC)
    DateTime(DateTime<Utc>),

    /// Regular expression
    Regex(ValueRegex),

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// Mapping from string keys to values
    Object(Document),

    /// Native predicate (for `$where`)
    Function(NativePredicate),
}

impl Value {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(Arc::from(value.into().as_str()))
    }

    /// Create an empty object value
    pub fn object() -> Self {
        Value::Object(Document::new())
    }

    /// Create a numeric value, preferring `Int` when the float is integral
    pub fn number(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < (i64::MAX as f64) {
            Value::Int(value as i64)
        } else {
            Value::Float(value)
        }
    }

    // =========================================================================
    // Type accessors
    // =========================================================================

    /// Returns the type tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Undefined => ValueKind::Undefined,
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Int(_) | Value::Float(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::Date,
            Value::Regex(_) => ValueKind::Regexp,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
            Value::Function(_) => ValueKind::Function,
        }
    }

    /// True for explicit null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for a missing field
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// True for null or undefined
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// True for any numeric variant
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Truthiness for conditional operators
    ///
    /// `false`, `0`, `NaN`, the empty string, null, and undefined are falsy;
    /// everything else (including empty arrays and objects) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    // =========================================================================
    // Value extractors
    // =========================================================================

    /// Extract as f64 for numeric variants
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Extract as i64 for numeric variants
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Extract as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract as array slice
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Extract as document reference
    pub fn as_object(&self) -> Option<&Document> {
        match self {
            Value::Object(doc) => Some(doc),
            _ => None,
        }
    }

    /// Extract as mutable document reference
    pub fn as_object_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Object(doc) => Some(doc),
            _ => None,
        }
    }

    /// Extract as timestamp
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Object field lookup; Undefined when absent or not an object
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Object(doc) => doc.get(key).unwrap_or(&Value::Undefined),
            _ => &Value::Undefined,
        }
    }

    // =========================================================================
    // Ordering and canonical form
    // =========================================================================

    /// Total order over all value kinds, used by `$sort` and the relational
    /// expression operators
    ///
    /// Kinds are bracketed (undefined < null < numbers < strings < objects <
    /// arrays < booleans < dates < regexes); within a kind the natural order
    /// applies. NaN sorts before every other number, consistent with
    /// `PartialEq` treating `NaN == NaN`.
    pub fn cmp_total(&self, other: &Value) -> Ordering {
        fn bracket(v: &Value) -> u8 {
            match v {
                Value::Undefined => 0,
                Value::Null => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Text(_) => 3,
                Value::Object(_) => 4,
                Value::Array(_) => 5,
                Value::Boolean(_) => 6,
                Value::DateTime(_) => 7,
                Value::Regex(_) => 8,
                Value::Function(_) => 9,
            }
        }

        let (ba, bb) = (bracket(self), bracket(other));
        if ba != bb {
            return ba.cmp(&bb);
        }

        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (a, b) if a.is_number() && b.is_number() => {
                compare_floats(a.as_f64().unwrap(), b.as_f64().unwrap())
            }
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Regex(a), Value::Regex(b)) => a.pattern().cmp(b.pattern()),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.cmp_total(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Object(a), Value::Object(b)) => {
                // key order is not significant: compare by sorted keys
                let mut ka: Vec<&String> = a.keys().collect();
                let mut kb: Vec<&String> = b.keys().collect();
                ka.sort();
                kb.sort();
                for (x, y) in ka.iter().zip(kb.iter()) {
                    let ord = x.cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    let ord = a[x.as_str()].cmp_total(&b[y.as_str()]);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => Ordering::Equal,
        }
    }

    /// A canonical string encoding: equal values produce equal keys
    ///
    /// Used for set operations, `unique`, and `$group` partitioning instead
    /// of a lossy numeric hash. Objects encode with sorted keys; `Int` and
    /// `Float` holding the same number encode identically.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        use std::fmt::Write;
        match self {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => {
                let _ = write!(out, "{}", i);
            }
            Value::Float(f) => {
                if f.is_nan() {
                    out.push_str("NaN");
                } else if f.fract() == 0.0 && f.is_finite() && f.abs() < (i64::MAX as f64) {
                    let _ = write!(out, "{}", *f as i64);
                } else {
                    let _ = write!(out, "{}", f);
                }
            }
            Value::Text(s) => {
                let _ = write!(out, "{}", serde_json::Value::from(s.as_ref()));
            }
            Value::DateTime(t) => {
                let _ = write!(out, "date({})", t.timestamp_millis());
            }
            Value::Regex(r) => {
                let _ = write!(out, "regex({})", r.pattern());
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            Value::Object(doc) => {
                // sorted keys keep the encoding canonical
                let mut keys: Vec<&String> = doc.keys().collect();
                keys.sort();
                out.push('{');
                for (i, k) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}:", serde_json::Value::from(k.as_str()));
                    doc[k.as_str()].write_canonical(out);
                }
                out.push('}');
            }
            Value::Function(p) => {
                let _ = write!(out, "function({:p})", Arc::as_ptr(&p.0));
            }
        }
    }

    // =========================================================================
    // JSON interop
    // =========================================================================

    /// Convert into a `serde_json::Value`
    ///
    /// Dates render as RFC 3339 strings, regexes as their pattern, and
    /// undefined/functions as JSON null.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.to_string()),
            Value::DateTime(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Regex(r) => serde_json::Value::String(r.pattern().to_string()),
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(Value::into_json).collect())
            }
            Value::Object(doc) => serde_json::Value::Object(
                doc.into_iter().map(|(k, v)| (k, v.into_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::text(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Object(v)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                // NaN != NaN in IEEE 754, but document equality treats them equal
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            // Cross-type numeric comparison: Int vs Float
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                *f == (*i as f64)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.pattern() == b.pattern(),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Text(s) => write!(f, "{}", serde_json::Value::from(s.as_ref())),
            Value::DateTime(t) => write!(f, "\"{}\"", t.to_rfc3339()),
            Value::Regex(r) => write!(f, "/{}/", r.pattern()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(doc) => {
                write!(f, "{{")?;
                for (i, (k, v)) in doc.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", serde_json::Value::from(k.as_str()), v)?;
                }
                write!(f, "}}")
            }
            Value::Function(_) => write!(f, "<function>"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::DateTime(t) => serializer.serialize_str(&t.to_rfc3339()),
            Value::Regex(r) => serializer.serialize_str(r.pattern()),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(doc) => {
                let mut map = serializer.serialize_map(Some(doc.len()))?;
                for (k, v) in doc {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from(json))
    }
}

/// Format a float without trailing noise
fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Compare floats with NaN ordered first
fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
