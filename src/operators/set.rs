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

//! Set expression operators
//!
//! Arrays are treated as multisets with structural identity (canonical
//! keys), so `1` and `1.0` collapse to one member.

use crate::core::error::{Error, Result};
use crate::core::util::{intersection, is_subset, union, unique};
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

use super::{expect_array, RawAggregate};

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$allElementsTrue", all_elements_true),
    ("$anyElementTrue", any_element_true),
    ("$setDifference", set_difference),
    ("$setEquals", set_equals),
    ("$setIntersection", set_intersection),
    ("$setIsSubset", set_is_subset),
    ("$setUnion", set_union),
];

/// Evaluate the operand into exactly two array arguments
fn two_sets(ctx: &Context, doc: &Value, expr: &Value, op: &str) -> Result<(Vec<Value>, Vec<Value>)> {
    let args = super::eval_args(ctx, doc, expr, op, 2)?;
    let a = expect_array(&args[0], op)?.to_vec();
    let b = expect_array(&args[1], op)?.to_vec();
    Ok((a, b))
}

fn set_equals(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = two_sets(ctx, doc, expr, "$setEquals")?;
    let (a, b) = (unique(&a), unique(&b));
    Ok(Value::Boolean(
        a.len() == b.len() && is_subset(&a, &b),
    ))
}

fn set_intersection(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = two_sets(ctx, doc, expr, "$setIntersection")?;
    Ok(Value::Array(intersection(&a, &b)))
}

fn set_difference(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = two_sets(ctx, doc, expr, "$setDifference")?;
    let remove: Vec<String> = b.iter().map(Value::canonical_key).collect();
    Ok(Value::Array(
        unique(&a)
            .into_iter()
            .filter(|v| !remove.contains(&v.canonical_key()))
            .collect(),
    ))
}

fn set_union(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = two_sets(ctx, doc, expr, "$setUnion")?;
    Ok(Value::Array(union(&a, &b)))
}

fn set_is_subset(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = two_sets(ctx, doc, expr, "$setIsSubset")?;
    Ok(Value::Boolean(is_subset(&a, &b)))
}

/// Shared shape of `$allElementsTrue`/`$anyElementTrue`: the operand is a
/// one-element array wrapping the set expression
fn wrapped_set(ctx: &Context, doc: &Value, expr: &Value, op: &str) -> Result<Vec<Value>> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let outer = expect_array(&evaluated, op)?;
    if outer.len() != 1 {
        return Err(Error::invalid_argument(format!(
            "{} expects a single array argument",
            op
        )));
    }
    Ok(expect_array(&outer[0], op)?.to_vec())
}

fn all_elements_true(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let items = wrapped_set(ctx, doc, expr, "$allElementsTrue")?;
    Ok(Value::Boolean(items.iter().all(Value::is_truthy)))
}

fn any_element_true(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let items = wrapped_set(ctx, doc, expr, "$anyElementTrue")?;
    Ok(Value::Boolean(items.iter().any(Value::is_truthy)))
}
