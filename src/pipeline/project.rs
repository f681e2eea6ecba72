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

//! `$project` stage
//!
//! A projection is either all-inclusion or all-exclusion over its non-id
//! keys. Included fields are rebuilt through `resolve_obj` so nested
//! structure survives; computed fields are written with `set_value`.
//! Exclusions (and `$slice` projections) graft onto a clone of the whole
//! document instead.

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::path::{remove_value, resolve_obj, set_value};
use crate::core::value::Value;
use crate::eval::{compute_value, Context};
use crate::operators::registry::global_registry;

/// Static analysis of a projection specification, shared across documents
struct Plan<'a> {
    keys: Vec<&'a String>,
    implicit_id: bool,
    id_excluded: bool,
    clone_mode: bool,
}

fn is_exclusion(v: &Value) -> bool {
    matches!(v, Value::Int(0) | Value::Boolean(false)) || *v == Value::Float(0.0)
}

fn is_inclusion_one(v: &Value) -> bool {
    matches!(v, Value::Int(1) | Value::Boolean(true)) || *v == Value::Float(1.0)
}

/// A `$slice` operand is the projection form when it is all numeric
fn is_projection_slice(operand: &Value) -> bool {
    match operand {
        Value::Array(items) => items.iter().all(Value::is_number),
        other => other.is_number(),
    }
}

fn analyze<'a>(
    spec: &'a crate::core::value::Document,
    id_key: &str,
) -> Result<Plan<'a>> {
    let mut found_exclusion = false;
    let mut found_inclusion = false;
    for (key, sub) in spec {
        if key == id_key {
            continue;
        }
        if is_exclusion(sub) {
            found_exclusion = true;
        } else {
            found_inclusion = true;
        }
        if found_exclusion && found_inclusion {
            return Err(Error::MixedProjection);
        }
    }

    let mut keys: Vec<&String> = spec.keys().collect();
    let mut id_excluded = false;
    if let Some(id_spec) = spec.get(id_key) {
        if is_exclusion(id_spec) {
            id_excluded = true;
            keys.retain(|k| k.as_str() != id_key);
        }
    }
    let id_only_exclusion = id_excluded && keys.is_empty();

    let found_slice = spec.values().any(|sub| {
        sub.as_object().is_some_and(|m| {
            m.len() == 1
                && m.contains_key("$slice")
                && is_projection_slice(&m["$slice"])
        })
    });

    Ok(Plan {
        implicit_id: !spec.contains_key(id_key),
        id_excluded,
        clone_mode: found_slice || found_exclusion || id_only_exclusion,
        keys,
    })
}

pub(crate) fn project_stage(
    options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument("$project expects a document"));
    };
    if spec.is_empty() {
        return Ok(collection);
    }
    let id_key = options.id_key.as_str();
    let plan = analyze(spec, id_key)?;

    let mut out = Vec::with_capacity(collection.len());
    for doc in collection {
        out.push(project_doc(options, &doc, spec, &plan, id_key)?);
    }
    Ok(out)
}

fn project_doc(
    options: &Options,
    doc: &Value,
    spec: &crate::core::value::Document,
    plan: &Plan,
    id_key: &str,
) -> Result<Value> {
    let ctx = Context::new(doc, options);
    let mut projected = Value::object();
    let mut drop_keys: Vec<&str> = Vec::new();
    if plan.id_excluded {
        drop_keys.push(id_key);
    }

    if plan.implicit_id {
        let id = doc.get(id_key);
        if !id.is_undefined() {
            set_value(&mut projected, id_key, id.clone());
        }
    }

    for &key in &plan.keys {
        let sub = &spec[key.as_str()];
        let mut computed: Option<Value> = None;

        if is_exclusion(sub) && key != id_key {
            drop_keys.push(key);
            continue;
        }

        match sub {
            Value::Text(_) => {
                computed = Some(compute_value(&ctx, doc, sub, Some(key.as_str()))?);
            }
            _ if is_inclusion_one(sub) => {
                // direct projection: merged below through the object graph
            }
            Value::Object(m) => {
                let projection_op = (m.len() == 1)
                    .then(|| m.keys().next().unwrap())
                    .filter(|op| global_registry().has_projection(op.as_str()));
                match projection_op {
                    Some(op) if op != "$slice" || is_projection_slice(&m[op.as_str()]) => {
                        let handler = global_registry().projection_op(op).unwrap();
                        computed = Some(handler(&ctx, doc, key, &m[op.as_str()])?);
                    }
                    // aggregation-form $slice and everything else
                    _ => computed = Some(compute_value(&ctx, doc, sub, Some(key.as_str()))?),
                }
            }
            _ => {
                drop_keys.push(key);
                continue;
            }
        }

        // rebuild the sub-document graph for the key, then let any computed
        // value overwrite it at the exact path
        let graph = resolve_obj(doc, key);
        if !graph.is_undefined() {
            merge(&mut projected, graph);
        }
        if let Some(value) = computed {
            if !value.is_undefined() {
                set_value(&mut projected, key, value);
            }
        }
    }

    if plan.clone_mode {
        let mut result = doc.clone();
        merge(&mut result, projected);
        for key in &drop_keys {
            remove_value(&mut result, key);
        }
        Ok(result)
    } else {
        Ok(projected)
    }
}

/// Deep-merge `src` into `dest`: documents merge per key, anything else
/// (arrays included) is replaced by `src`
fn merge(dest: &mut Value, src: Value) {
    match (dest, src) {
        (Value::Object(dest_map), Value::Object(src_map)) => {
            for (key, src_value) in src_map {
                match dest_map.get_mut(&key) {
                    Some(dest_value) => merge(dest_value, src_value),
                    None => {
                        dest_map.insert(key, src_value);
                    }
                }
            }
        }
        (dest_slot, src_value) => *dest_slot = src_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(j: serde_json::Value) -> Vec<Value> {
        match Value::from(j) {
            Value::Array(items) => items,
            _ => panic!("expected array"),
        }
    }

    fn project(input: serde_json::Value, spec: serde_json::Value) -> Result<Vec<Value>> {
        project_stage(&Options::default(), docs(input), &Value::from(spec))
    }

    #[test]
    fn test_inclusion_keeps_id() {
        let out = project(
            json!([{"_id": 1, "a": 2, "b": 3}]),
            json!({"a": 1}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"_id": 1, "a": 2}])));
    }

    #[test]
    fn test_id_excluded_alongside_inclusion() {
        let out = project(
            json!([{"_id": 1, "a": 2, "b": 3}]),
            json!({"_id": 0, "a": 1}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"a": 2}])));
    }

    #[test]
    fn test_pure_exclusion() {
        let out = project(
            json!([{"_id": 1, "a": 2, "secret": 3}]),
            json!({"secret": 0}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"_id": 1, "a": 2}])));
    }

    #[test]
    fn test_id_only_exclusion() {
        let out = project(json!([{"_id": 1, "a": 2}]), json!({"_id": 0})).unwrap();
        assert_eq!(out, docs(json!([{"a": 2}])));
    }

    #[test]
    fn test_mixed_projection_fails() {
        let err = project(json!([{"a": 1, "b": 2}]), json!({"a": 1, "b": 0})).unwrap_err();
        assert!(matches!(err, Error::MixedProjection));
    }

    #[test]
    fn test_computed_field() {
        let out = project(
            json!([{"a": {"b": 7}, "x": 1}]),
            json!({"c": "$a.b"}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"c": 7}])));
    }

    #[test]
    fn test_nested_path_inclusion_preserves_structure() {
        let out = project(
            json!([{"a": {"b": 1, "c": 2}, "d": 3}]),
            json!({"a.b": 1}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"a": {"b": 1}}])));
    }

    #[test]
    fn test_sibling_nested_paths_merge() {
        let out = project(
            json!([{"a": {"b": 1, "c": 2, "d": 3}}]),
            json!({"a.b": 1, "a.c": 1}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"a": {"b": 1, "c": 2}}])));
    }

    #[test]
    fn test_slice_projection_keeps_whole_doc() {
        let out = project(
            json!([{"xs": [1, 2, 3, 4], "k": "v"}]),
            json!({"xs": {"$slice": 2}}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"xs": [1, 2], "k": "v"}])));
    }

    #[test]
    fn test_slice_aggregation_form() {
        let out = project(
            json!([{"xs": [1, 2, 3, 4]}]),
            json!({"tail": {"$slice": ["$xs", -2]}}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"tail": [3, 4]}])));
    }

    #[test]
    fn test_elem_match_projection() {
        let out = project(
            json!([{"items": [{"n": 1}, {"n": 5}, {"n": 9}]}]),
            json!({"items": {"$elemMatch": {"n": {"$gt": 3}}}}),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"items": [{"n": 5}]}])));
    }

    #[test]
    fn test_std_dev_projection() {
        let out = project(
            json!([{"_id": 1, "scores": [2, 4, 4, 4, 5, 5, 7, 9]}]),
            json!({"dev": {"$stdDevPop": "$scores"}}),
        )
        .unwrap();
        assert_eq!(out[0].get("dev"), &Value::Float(2.0));
    }

    #[test]
    fn test_empty_spec_passthrough() {
        let input = json!([{"a": 1}]);
        let out = project(input.clone(), json!({})).unwrap();
        assert_eq!(out, docs(input));
    }
}
