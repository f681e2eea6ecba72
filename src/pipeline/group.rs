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

//! `$group` stage
//!
//! Documents are partitioned by the identity sub-expression; each partition
//! emits one document holding the partition key (omitted when undefined)
//! and one field per accumulator.

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::util::group_by;
use crate::core::value::{Document, Value};
use crate::eval::{compute_value, Context};
use crate::operators::group::accumulate;

pub(crate) fn group_stage(
    options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument("$group expects a document"));
    };
    let id_expr = spec.get(&options.id_key).cloned().unwrap_or(Value::Undefined);

    let grouping = group_by(&collection, |doc| {
        let ctx = Context::new(doc, options);
        compute_value(&ctx, doc, &id_expr, None)
    })?;

    let unit = Value::Null;
    let ctx = Context::new(&unit, options);

    let mut out = Vec::with_capacity(grouping.keys.len());
    for (key, docs) in grouping.keys.into_iter().zip(grouping.groups) {
        let mut result = Document::new();
        if !key.is_undefined() {
            result.insert(options.id_key.clone(), key);
        }
        for (field, acc_expr) in spec {
            if field == &options.id_key {
                continue;
            }
            result.insert(field.clone(), accumulate(&ctx, &docs, field, acc_expr)?);
        }
        out.push(Value::Object(result));
    }
    Ok(out)
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

    fn group(input: serde_json::Value, spec: serde_json::Value) -> Vec<Value> {
        group_stage(&Options::default(), docs(input), &Value::from(spec)).unwrap()
    }

    #[test]
    fn test_group_sum_null_key() {
        let out = group(
            json!([{"n": 1}, {"n": 2}, {"n": 3}, {"n": 4}]),
            json!({"_id": null, "s": {"$sum": "$n"}}),
        );
        assert_eq!(out, docs(json!([{"_id": null, "s": 10}])));
    }

    #[test]
    fn test_group_by_field() {
        let out = group(
            json!([
                {"k": "a", "n": 1},
                {"k": "b", "n": 10},
                {"k": "a", "n": 2}
            ]),
            json!({"_id": "$k", "total": {"$sum": "$n"}, "count": {"$sum": 1}}),
        );
        assert_eq!(
            out,
            docs(json!([
                {"_id": "a", "total": 3, "count": 2},
                {"_id": "b", "total": 10, "count": 1}
            ]))
        );
    }

    #[test]
    fn test_group_missing_id_key_omitted() {
        let out = group(json!([{"n": 1}, {"n": 2}]), json!({"avg": {"$avg": "$n"}}));
        assert_eq!(out, docs(json!([{"avg": 1.5}])));
    }

    #[test]
    fn test_group_does_not_mutate_stage_spec() {
        let spec = Value::from(json!({"_id": "$k", "c": {"$sum": 1}}));
        let before = spec.clone();
        group_stage(&Options::default(), docs(json!([{"k": 1}])), &spec).unwrap();
        assert_eq!(spec, before);
    }

    #[test]
    fn test_group_first_last_push() {
        let out = group(
            json!([{"k": "a", "n": 1}, {"k": "a", "n": 2}, {"k": "a", "n": 3}]),
            json!({
                "_id": "$k",
                "f": {"$first": "$n"},
                "l": {"$last": "$n"},
                "all": {"$push": "$n"},
                "set": {"$addToSet": "$n"}
            }),
        );
        assert_eq!(
            out,
            docs(json!([{"_id": "a", "f": 1, "l": 3, "all": [1, 2, 3], "set": [1, 2, 3]}]))
        );
    }

    #[test]
    fn test_group_rejects_mixed_accumulator() {
        let spec = Value::from(json!({"_id": null, "bad": {"$sum": "$n", "x": 1}}));
        let result = group_stage(&Options::default(), docs(json!([{"n": 1}])), &spec);
        assert!(result.is_err());
    }
}
