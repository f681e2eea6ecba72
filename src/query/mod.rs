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

//! Query matcher
//!
//! [`Query`] compiles a criteria document once into a conjunction of
//! predicates: compound logical operators (`$and`, `$or`, `$nor`, `$where`)
//! and per-field simple-operator predicates. Unknown operators fail at
//! compile time.

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::path::resolve;
use crate::core::value::{Document, NativePredicate, Value, ValueRegex};
use crate::operators::registry::global_registry;
use crate::operators::{QueryArgs, QueryHandler};

/// A compiled criteria document
#[derive(Clone)]
pub struct Query {
    criteria: Value,
    options: Options,
    predicates: Vec<Predicate>,
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("criteria", &self.criteria)
            .field("options", &self.options)
            .field("predicates", &self.predicates)
            .finish()
    }
}

#[derive(Clone)]
enum Predicate {
    And(Vec<Query>),
    Or(Vec<Query>),
    Nor(Vec<Query>),
    Where(NativePredicate),
    Simple {
        field: String,
        handler: QueryHandler,
        operand: Value,
    },
}

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::And(queries) => f.debug_tuple("And").field(queries).finish(),
            Predicate::Or(queries) => f.debug_tuple("Or").field(queries).finish(),
            Predicate::Nor(queries) => f.debug_tuple("Nor").field(queries).finish(),
            Predicate::Where(pred) => f.debug_tuple("Where").field(pred).finish(),
            Predicate::Simple {
                field, operand, ..
            } => f
                .debug_struct("Simple")
                .field("field", field)
                .field("handler", &"..")
                .field("operand", operand)
                .finish(),
        }
    }
}

impl Query {
    /// Compile `criteria` with default options
    pub fn new(criteria: Value) -> Result<Self> {
        Query::with_options(criteria, Options::default())
    }

    /// Compile `criteria` with explicit options
    pub fn with_options(criteria: Value, options: Options) -> Result<Self> {
        let Value::Object(map) = &criteria else {
            return Err(Error::invalid_expression(
                "query criteria must be a document",
            ));
        };

        let mut predicates = Vec::new();
        for (key, value) in map {
            if key.starts_with('$') {
                predicates.push(compile_compound(key, value, &options)?);
            } else {
                compile_field(&mut predicates, key, value, &options)?;
            }
        }

        Ok(Query {
            criteria,
            options,
            predicates,
        })
    }

    /// The criteria this query was compiled from
    pub fn criteria(&self) -> &Value {
        &self.criteria
    }

    /// Engine options used for nested compilation
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Test a document against the conjunction of predicates
    pub fn test(&self, doc: &Value) -> Result<bool> {
        for predicate in &self.predicates {
            if !predicate.test(doc, &self.options)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Wrap the matching subset of `collection` into a cursor
    pub fn find(&self, collection: &[Value], projection: Option<Value>) -> crate::api::Cursor {
        crate::api::Cursor::new(collection.to_vec(), self.clone(), projection)
    }

    /// The complement: every document that does not match
    pub fn remove(&self, collection: &[Value]) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for doc in collection {
            if !self.test(doc)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }
}

impl Predicate {
    fn test(&self, doc: &Value, options: &Options) -> Result<bool> {
        match self {
            Predicate::And(queries) => {
                for q in queries {
                    if !q.test(doc)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(queries) => {
                for q in queries {
                    if q.test(doc)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Nor(queries) => {
                for q in queries {
                    if q.test(doc)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Where(f) => Ok(f.test(doc)),
            Predicate::Simple {
                field,
                handler,
                operand,
            } => {
                let lhs = resolve(doc, field);
                handler(&QueryArgs {
                    field,
                    doc,
                    lhs: &lhs,
                    operand,
                    options,
                })
            }
        }
    }
}

fn compile_compound(key: &str, value: &Value, options: &Options) -> Result<Predicate> {
    match key {
        "$and" | "$or" | "$nor" => {
            let Value::Array(items) = value else {
                return Err(Error::invalid_expression(format!(
                    "{} expects an array of criteria",
                    key
                )));
            };
            if items.is_empty() {
                return Err(Error::invalid_expression(format!(
                    "{} expects a non-empty array",
                    key
                )));
            }
            let mut queries = Vec::with_capacity(items.len());
            for item in items {
                queries.push(Query::with_options(item.clone(), options.clone())?);
            }
            Ok(match key {
                "$and" => Predicate::And(queries),
                "$or" => Predicate::Or(queries),
                _ => Predicate::Nor(queries),
            })
        }
        "$where" => match value {
            Value::Function(f) => Ok(Predicate::Where(f.clone())),
            Value::Text(_) => Err(Error::invalid_expression(
                "$where does not accept string predicates",
            )),
            _ => Err(Error::invalid_expression(
                "$where expects a native predicate",
            )),
        },
        other => Err(Error::unknown_operator("query", other)),
    }
}

fn compile_field(
    predicates: &mut Vec<Predicate>,
    field: &str,
    value: &Value,
    options: &Options,
) -> Result<()> {
    let normalized = normalize(value)?;
    for (operator, operand) in normalized {
        let handler = global_registry()
            .query_op(&operator)
            .ok_or_else(|| Error::unknown_operator("query", &operator))?;
        predicates.push(Predicate::Simple {
            field: field.to_string(),
            handler,
            operand,
        });
    }
    Ok(())
}

/// Normalize a field's criteria value into an operator → operand map
///
/// Primitives become `{$eq: value}`, regexes `{$regex: value}`, and a
/// document with no recognized query operator is matched literally through
/// `$eq`. `$options` is folded into `$regex` and consumed.
fn normalize(value: &Value) -> Result<Document> {
    let mut out = Document::new();
    match value {
        Value::Regex(_) => {
            out.insert("$regex".to_string(), value.clone());
        }
        Value::Object(map) => {
            let registry = global_registry();
            let has_query_op = map.keys().any(|k| registry.query_op(k).is_some());
            if !has_query_op {
                out.insert("$eq".to_string(), value.clone());
                return Ok(out);
            }
            let options = map.get("$options");
            for (key, operand) in map {
                if key == "$options" {
                    continue;
                }
                if key == "$regex" {
                    out.insert(key.clone(), merge_regex(operand, options)?);
                } else {
                    out.insert(key.clone(), operand.clone());
                }
            }
        }
        other => {
            out.insert("$eq".to_string(), other.clone());
        }
    }
    Ok(out)
}

/// Combine a `$regex` operand with `$options` flags into one compiled regex
fn merge_regex(operand: &Value, options: Option<&Value>) -> Result<Value> {
    let flags: String = options
        .and_then(Value::as_str)
        .unwrap_or("")
        .chars()
        .filter(|c| "imsx".contains(*c))
        .collect();
    let pattern = match operand {
        Value::Regex(r) => {
            if flags.is_empty() {
                return Ok(operand.clone());
            }
            r.pattern().to_string()
        }
        Value::Text(s) => s.to_string(),
        other => {
            return Err(Error::invalid_argument(format!(
                "$regex expects a pattern, got {}",
                other.kind()
            )))
        }
    };
    let full = if flags.is_empty() {
        pattern
    } else {
        format!("(?{}){}", flags, pattern)
    };
    Ok(Value::Regex(ValueRegex::new(&full)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    #[test]
    fn test_criteria_must_be_document() {
        assert!(Query::new(v(json!([1, 2]))).is_err());
        assert!(Query::new(v(json!({}))).is_ok());
    }

    #[test]
    fn test_unknown_operator_fails_at_compile() {
        let err = Query::new(v(json!({"a": {"$gt": 1, "$bogus": 2}}))).unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { .. }));

        let err = Query::new(v(json!({"$frob": []}))).unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { .. }));
    }

    #[test]
    fn test_logical_operand_must_be_array() {
        let err = Query::new(v(json!({"$and": {"a": 1}}))).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression(_)));
    }

    #[test]
    fn test_normalize_literal_object() {
        // a document with no operator keys matches literally
        let q = Query::new(v(json!({"a": {"b": 1}}))).unwrap();
        assert!(q.test(&v(json!({"a": {"b": 1}}))).unwrap());
        assert!(!q.test(&v(json!({"a": {"b": 2}}))).unwrap());
    }

    #[test]
    fn test_regex_options_merge() {
        let q = Query::new(v(json!({"name": {"$regex": "^ali", "$options": "i"}}))).unwrap();
        assert!(q.test(&v(json!({"name": "Alice"}))).unwrap());
        assert!(!q.test(&v(json!({"name": "Bob"}))).unwrap());
    }

    #[test]
    fn test_where_rejects_strings() {
        let err = Query::new(v(json!({"$where": "this.a > 1"}))).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression(_)));
    }
}
