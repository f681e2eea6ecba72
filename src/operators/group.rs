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

//! Group accumulators
//!
//! Each accumulator reduces a partition by first `$push`-ing the
//! per-document expression into an array, then aggregating that array.
//! Called without an expression (the evaluator's group dispatch), the
//! input values are used as-is.

use std::cmp::Ordering;

use crate::core::error::{Error, Result};
use crate::core::util::{stddev, unique};
use crate::core::value::{Document, Value};
use crate::eval::{compute_value, Context};

use super::registry::global_registry;
use super::RawGroup;

pub(super) const OPERATORS: &[(&str, RawGroup)] = &[
    ("$addToSet", add_to_set),
    ("$avg", avg),
    ("$first", first),
    ("$last", last),
    ("$max", max),
    ("$min", min),
    ("$push", push),
    ("$stdDevPop", std_dev_pop),
    ("$stdDevSamp", std_dev_samp),
    ("$sum", sum),
];

/// Evaluate the accumulator expression per document, or pass the values
/// through when no expression is given
fn pushed(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Vec<Value>> {
    match expr {
        None => Ok(collection.to_vec()),
        Some(e) => collection
            .iter()
            .map(|doc| {
                let doc_ctx = Context::new(doc, ctx.options());
                compute_value(&doc_ctx, doc, e, None)
            })
            .collect(),
    }
}

fn numbers(values: &[Value]) -> Vec<f64> {
    values.iter().filter_map(Value::as_f64).collect()
}

fn sum(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    Ok(Value::number(numbers(&values).iter().sum()))
}

fn avg(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    let nums = numbers(&values);
    if nums.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::number(nums.iter().sum::<f64>() / nums.len() as f64))
}

fn min(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    fold_extreme(ctx, collection, expr, Ordering::Less)
}

fn max(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    fold_extreme(ctx, collection, expr, Ordering::Greater)
}

fn fold_extreme(
    ctx: &Context,
    collection: &[Value],
    expr: Option<&Value>,
    keep: Ordering,
) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    let mut best: Option<Value> = None;
    for v in values {
        if v.is_nullish() {
            continue;
        }
        best = Some(match best {
            None => v,
            Some(current) => {
                if v.cmp_total(&current) == keep {
                    v
                } else {
                    current
                }
            }
        });
    }
    Ok(best.unwrap_or(Value::Undefined))
}

fn push(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    Ok(Value::Array(pushed(ctx, collection, expr)?))
}

fn add_to_set(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    Ok(Value::Array(unique(&values)))
}

fn first(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    Ok(values.into_iter().next().unwrap_or(Value::Undefined))
}

fn last(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    Ok(values.into_iter().next_back().unwrap_or(Value::Undefined))
}

fn std_dev_pop(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    Ok(match stddev(&numbers(&values), false) {
        Some(sd) => Value::Float(sd),
        None => Value::Null,
    })
}

fn std_dev_samp(ctx: &Context, collection: &[Value], expr: Option<&Value>) -> Result<Value> {
    let values = pushed(ctx, collection, expr)?;
    Ok(match stddev(&numbers(&values), true) {
        Some(sd) => Value::Float(sd),
        None => Value::Null,
    })
}

/// Compute one `$group` output field over a partition
///
/// Recognizes a bare accumulator name, or an object nesting exactly one
/// accumulator; mixing an accumulator with other keys is rejected.
pub(crate) fn accumulate(
    ctx: &Context,
    collection: &[Value],
    field: &str,
    expr: &Value,
) -> Result<Value> {
    if let Some(op) = global_registry().group_op(field) {
        return op(ctx, collection, Some(expr));
    }
    if let Some(map) = expr.as_object() {
        let mut result = Document::new();
        for (key, sub) in map {
            if global_registry().has_group(key) {
                if map.len() != 1 {
                    return Err(Error::invalid_expression(format!(
                        "invalid group expression for '{}': operator '{}' cannot be mixed with other keys",
                        field, key
                    )));
                }
                return accumulate(ctx, collection, key, sub);
            }
            result.insert(key.clone(), accumulate(ctx, collection, key, sub)?);
        }
        return Ok(Value::Object(result));
    }
    Ok(Value::Undefined)
}
