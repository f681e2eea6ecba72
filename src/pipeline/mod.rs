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

//! Pipeline runtime
//!
//! [`Aggregator`] drives a sequence of stage operators, each transforming
//! an array of documents into another. Stage handlers are plain functions
//! in this module tree, so one stage (`$sortByCount`) can call others
//! without re-entering the public API.

pub mod group;
pub mod project;
pub mod redact;
pub mod sort;
pub mod unwind;

use rand::Rng;

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::path::set_value;
use crate::core::value::{Document, Value};
use crate::eval::{compute_value, Context};
use crate::operators::registry::global_registry;
use crate::operators::RawPipeline;
use crate::query::Query;

/// Built-in pipeline stage operators
pub(crate) const OPERATORS: &[(&str, RawPipeline)] = &[
    ("$addFields", add_fields_stage),
    ("$count", count_stage),
    ("$group", group::group_stage),
    ("$limit", limit_stage),
    ("$match", match_stage),
    ("$project", project::project_stage),
    ("$redact", redact::redact_stage),
    ("$replaceRoot", replace_root_stage),
    ("$sample", sample_stage),
    ("$skip", skip_stage),
    ("$sort", sort::sort_stage),
    ("$sortByCount", sort_by_count_stage),
    ("$unwind", unwind::unwind_stage),
];

/// A compiled aggregation pipeline
#[derive(Clone)]
pub struct Aggregator {
    pipeline: Vec<Value>,
    options: Options,
}

impl Aggregator {
    /// Create an aggregator with default options
    pub fn new(pipeline: Value) -> Result<Self> {
        Aggregator::with_options(pipeline, Options::default())
    }

    /// Create an aggregator with explicit options
    pub fn with_options(pipeline: Value, options: Options) -> Result<Self> {
        let Value::Array(stages) = pipeline else {
            return Err(Error::invalid_expression(
                "aggregation pipeline must be an array of stages",
            ));
        };
        Ok(Aggregator {
            pipeline: stages,
            options,
        })
    }

    /// Run every stage in order over `collection`
    pub fn run(&self, collection: &[Value]) -> Result<Vec<Value>> {
        let mut current = collection.to_vec();
        for stage in &self.pipeline {
            let Some(spec) = stage.as_object() else {
                return Err(Error::invalid_expression(
                    "pipeline stage must be a single-operator document",
                ));
            };
            if spec.len() != 1 {
                return Err(Error::invalid_expression(
                    "pipeline stage must have exactly one operator key",
                ));
            }
            let (name, operand) = spec.iter().next().unwrap();
            let handler = global_registry()
                .pipeline_op(name)
                .ok_or_else(|| Error::unknown_operator("pipeline", name))?;
            current = handler(&self.options, current, operand)?;
        }
        Ok(current)
    }
}

// =============================================================================
// Simple stages
// =============================================================================

fn match_stage(options: &Options, collection: Vec<Value>, expr: &Value) -> Result<Vec<Value>> {
    let query = Query::with_options(expr.clone(), options.clone())?;
    let mut out = Vec::with_capacity(collection.len());
    for doc in collection {
        if query.test(&doc)? {
            out.push(doc);
        }
    }
    Ok(out)
}

fn limit_stage(_options: &Options, mut collection: Vec<Value>, expr: &Value) -> Result<Vec<Value>> {
    let Some(n) = expr.as_f64().filter(|n| *n >= 0.0) else {
        return Err(Error::invalid_argument(
            "$limit expects a non-negative number",
        ));
    };
    collection.truncate(n as usize);
    Ok(collection)
}

fn skip_stage(_options: &Options, collection: Vec<Value>, expr: &Value) -> Result<Vec<Value>> {
    let Some(n) = expr.as_f64().filter(|n| *n >= 0.0) else {
        return Err(Error::invalid_argument(
            "$skip expects a non-negative number",
        ));
    };
    Ok(collection.into_iter().skip(n as usize).collect())
}

fn count_stage(_options: &Options, collection: Vec<Value>, expr: &Value) -> Result<Vec<Value>> {
    let Some(name) = expr.as_str().filter(|s| !s.is_empty()) else {
        return Err(Error::invalid_argument(
            "$count expects a non-empty field name",
        ));
    };
    let mut doc = Document::new();
    doc.insert(name.to_string(), Value::Int(collection.len() as i64));
    Ok(vec![Value::Object(doc)])
}

fn sample_stage(_options: &Options, collection: Vec<Value>, expr: &Value) -> Result<Vec<Value>> {
    let size = expr
        .as_object()
        .and_then(|spec| spec.get("size"))
        .and_then(Value::as_f64);
    let Some(size) = size.filter(|n| *n >= 0.0) else {
        return Err(Error::invalid_argument("$sample expects { size: <number> }"));
    };
    if collection.is_empty() {
        return Ok(Vec::new());
    }
    // uniform picks with replacement
    let mut rng = rand::rng();
    let mut out = Vec::with_capacity(size as usize);
    for _ in 0..size as usize {
        out.push(collection[rng.random_range(0..collection.len())].clone());
    }
    Ok(out)
}

fn replace_root_stage(
    options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    let Some(new_root) = expr.as_object().and_then(|spec| spec.get("newRoot")) else {
        return Err(Error::invalid_argument(
            "$replaceRoot expects { newRoot: <expression> }",
        ));
    };
    let mut out = Vec::with_capacity(collection.len());
    for doc in collection {
        let ctx = Context::new(&doc, options);
        let replacement = compute_value(&ctx, &doc, new_root, None)?;
        if !matches!(replacement, Value::Object(_)) {
            return Err(Error::invalid_expression(
                "$replaceRoot expression must evaluate to a document",
            ));
        }
        out.push(replacement);
    }
    Ok(out)
}

fn add_fields_stage(
    options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    let Some(fields) = expr.as_object() else {
        return Err(Error::invalid_argument("$addFields expects a document"));
    };
    let mut out = Vec::with_capacity(collection.len());
    for mut doc in collection {
        for (field, field_expr) in fields {
            let value = {
                let ctx = Context::new(&doc, options);
                compute_value(&ctx, &doc, field_expr, None)?
            };
            set_value(&mut doc, field, value);
        }
        out.push(doc);
    }
    Ok(out)
}

fn sort_by_count_stage(
    options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    // sugar for $group by the expression with a count, then $sort descending
    let mut group_spec = Document::new();
    group_spec.insert(options.id_key.clone(), expr.clone());
    let mut count = Document::new();
    count.insert("$sum".to_string(), Value::Int(1));
    group_spec.insert("count".to_string(), Value::Object(count));

    let grouped = group::group_stage(options, collection, &Value::Object(group_spec))?;

    let mut sort_spec = Document::new();
    sort_spec.insert("count".to_string(), Value::Int(-1));
    sort::sort_stage(options, grouped, &Value::Object(sort_spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    fn docs(j: serde_json::Value) -> Vec<Value> {
        match Value::from(j) {
            Value::Array(items) => items,
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn test_stage_must_be_single_key() {
        let agg = Aggregator::new(v(json!([{"$limit": 1, "$skip": 1}]))).unwrap();
        assert!(agg.run(&docs(json!([{"a": 1}]))).is_err());
    }

    #[test]
    fn test_unknown_stage_operator() {
        let agg = Aggregator::new(v(json!([{"$teleport": 1}]))).unwrap();
        let err = agg.run(&docs(json!([]))).unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { .. }));
    }

    #[test]
    fn test_pipeline_must_be_array() {
        assert!(Aggregator::new(v(json!({"$limit": 1}))).is_err());
    }

    #[test]
    fn test_limit_skip_count() {
        let input = docs(json!([{"n": 1}, {"n": 2}, {"n": 3}, {"n": 4}]));
        let agg = Aggregator::new(v(json!([{"$skip": 1}, {"$limit": 2}]))).unwrap();
        assert_eq!(agg.run(&input).unwrap(), docs(json!([{"n": 2}, {"n": 3}])));

        let agg = Aggregator::new(v(json!([{"$count": "total"}]))).unwrap();
        assert_eq!(agg.run(&input).unwrap(), docs(json!([{"total": 4}])));
    }

    #[test]
    fn test_sample_size() {
        let input = docs(json!([{"n": 1}, {"n": 2}]));
        let agg = Aggregator::new(v(json!([{"$sample": {"size": 5}}]))).unwrap();
        assert_eq!(agg.run(&input).unwrap().len(), 5);
        let agg = Aggregator::new(v(json!([{"$sample": {"size": 3}}]))).unwrap();
        assert!(agg.run(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_replace_root() {
        let input = docs(json!([{"a": {"b": 1}}]));
        let agg = Aggregator::new(v(json!([{"$replaceRoot": {"newRoot": "$a"}}]))).unwrap();
        assert_eq!(agg.run(&input).unwrap(), docs(json!([{"b": 1}])));

        let agg = Aggregator::new(v(json!([{"$replaceRoot": {"newRoot": "$a.b"}}]))).unwrap();
        assert!(agg.run(&input).is_err());
    }

    #[test]
    fn test_add_fields() {
        let input = docs(json!([{"a": 1}]));
        let agg = Aggregator::new(v(
            json!([{"$addFields": {"b": {"$add": ["$a", 1]}, "c.d": "$a"}}]),
        ))
        .unwrap();
        assert_eq!(
            agg.run(&input).unwrap(),
            docs(json!([{"a": 1, "b": 2, "c": {"d": 1}}]))
        );
    }

    #[test]
    fn test_sort_by_count() {
        let input = docs(json!([
            {"t": "a"}, {"t": "b"}, {"t": "a"}, {"t": "c"}, {"t": "a"}, {"t": "b"}
        ]));
        let agg = Aggregator::new(v(json!([{"$sortByCount": "$t"}]))).unwrap();
        let result = agg.run(&input).unwrap();
        assert_eq!(
            result,
            docs(json!([
                {"_id": "a", "count": 3},
                {"_id": "b", "count": 2},
                {"_id": "c", "count": 1}
            ]))
        );
    }
}
