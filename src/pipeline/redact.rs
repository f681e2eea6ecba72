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

//! `$redact` stage
//!
//! The expression is evaluated per document level; the outcome is parsed
//! into an explicit action instead of comparing strings downstream.

use crate::core::error::Result;
use crate::core::options::Options;
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

/// Outcome of evaluating a redact expression at one level
enum RedactAction {
    Keep,
    Prune,
    Descend,
    Value(Value),
}

fn classify(value: Value) -> RedactAction {
    if let Some(sentinel) = value.as_str() {
        match sentinel {
            "$$KEEP" => return RedactAction::Keep,
            "$$PRUNE" => return RedactAction::Prune,
            "$$DESCEND" => return RedactAction::Descend,
            _ => {}
        }
    }
    RedactAction::Value(value)
}

pub(crate) fn redact_stage(
    options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(collection.len());
    for doc in collection {
        let ctx = Context::new(&doc, options);
        if let Some(kept) = redact_value(&ctx, &doc, expr)? {
            out.push(kept);
        }
    }
    Ok(out)
}

/// Redact one document level; `None` means pruned
fn redact_value(ctx: &Context, current: &Value, expr: &Value) -> Result<Option<Value>> {
    let result = compute_value(ctx, current, expr, None)?;
    match classify(result) {
        RedactAction::Keep => Ok(Some(current.clone())),
        RedactAction::Prune => Ok(None),
        RedactAction::Value(v) => Ok(Some(v)),
        RedactAction::Descend => {
            // descend only applies to conditional redaction
            let has_cond = expr
                .as_object()
                .is_some_and(|m| m.contains_key("$cond"));
            let Value::Object(map) = current else {
                return Ok(Some(current.clone()));
            };
            if !has_cond {
                return Ok(Some(current.clone()));
            }

            let mut out = map.clone();
            for (key, child) in map {
                match child {
                    Value::Object(_) => match redact_value(ctx, child, expr)? {
                        Some(kept) => {
                            out.insert(key.clone(), kept);
                        }
                        None => {
                            out.shift_remove(key);
                        }
                    },
                    Value::Array(items) => {
                        let mut kept_items = Vec::with_capacity(items.len());
                        for item in items {
                            if matches!(item, Value::Object(_)) {
                                if let Some(kept) = redact_value(ctx, item, expr)? {
                                    kept_items.push(kept);
                                }
                            } else {
                                kept_items.push(item.clone());
                            }
                        }
                        out.insert(key.clone(), Value::Array(kept_items));
                    }
                    _ => {}
                }
            }
            Ok(Some(Value::Object(out)))
        }
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

    #[test]
    fn test_keep_and_prune() {
        let input = docs(json!([{"level": 1}, {"level": 5}]));
        let expr = Value::from(json!({
            "$cond": {
                "if": {"$lte": ["$level", 3]},
                "then": "$$KEEP",
                "else": "$$PRUNE"
            }
        }));
        let out = redact_stage(&Options::default(), input, &expr).unwrap();
        assert_eq!(out, docs(json!([{"level": 1}])));
    }

    #[test]
    fn test_descend_prunes_nested() {
        let input = docs(json!([{
            "level": 1,
            "inner": {"level": 5, "secret": true},
            "open": {"level": 1}
        }]));
        let expr = Value::from(json!({
            "$cond": {
                "if": {"$lte": ["$level", 3]},
                "then": "$$DESCEND",
                "else": "$$PRUNE"
            }
        }));
        let out = redact_stage(&Options::default(), input, &expr).unwrap();
        assert_eq!(out, docs(json!([{"level": 1, "open": {"level": 1}}])));
    }

    #[test]
    fn test_descend_filters_arrays_of_documents() {
        let input = docs(json!([{
            "level": 1,
            "items": [{"level": 1, "n": 1}, {"level": 9, "n": 2}, 7]
        }]));
        let expr = Value::from(json!({
            "$cond": {
                "if": {"$lte": ["$level", 3]},
                "then": "$$DESCEND",
                "else": "$$PRUNE"
            }
        }));
        let out = redact_stage(&Options::default(), input, &expr).unwrap();
        assert_eq!(
            out,
            docs(json!([{"level": 1, "items": [{"level": 1, "n": 1}, 7]}]))
        );
    }

    #[test]
    fn test_non_sentinel_result_passes_through() {
        let input = docs(json!([{"a": 1}]));
        let expr = Value::from(json!({"kept": "$a"}));
        let out = redact_stage(&Options::default(), input, &expr).unwrap();
        assert_eq!(out, docs(json!([{"kept": 1}])));
    }
}
