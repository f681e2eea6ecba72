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

//! Array expression operators
//!
//! `$map`, `$filter`, and `$reduce` bind their element variable in the
//! evaluation context's scope chain; documents are never written to.

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::eval::{compute_value, Context, VarScope};

use super::{expect_array, RawAggregate};

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$arrayElemAt", array_elem_at),
    ("$concatArrays", concat_arrays),
    ("$filter", filter),
    ("$indexOfArray", index_of_array),
    ("$isArray", is_array),
    ("$map", map),
    ("$range", range),
    ("$reduce", reduce),
    ("$reverseArray", reverse_array),
    ("$size", size),
    ("$slice", slice),
    ("$zip", zip),
];

/// MongoDB `$slice` semantics shared with the projection operator
///
/// With only `skip` given: non-negative takes the first `skip` elements,
/// negative takes the last `|skip|`. With both: `skip` positions (negative
/// counts from the end) and `limit` must be positive.
pub(crate) fn slice_values(items: &[Value], skip: f64, limit: Option<f64>) -> Result<Vec<Value>> {
    let len = items.len();
    match limit {
        None => {
            if skip < 0.0 {
                let take = (-skip) as usize;
                let start = len.saturating_sub(take);
                Ok(items[start..].to_vec())
            } else {
                let take = (skip as usize).min(len);
                Ok(items[..take].to_vec())
            }
        }
        Some(limit) => {
            if limit <= 0.0 {
                return Err(Error::invalid_argument("$slice limit must be positive"));
            }
            let start = if skip < 0.0 {
                len.saturating_sub((-skip) as usize)
            } else {
                (skip as usize).min(len)
            };
            Ok(items[start..].iter().take(limit as usize).cloned().collect())
        }
    }
}

fn array_elem_at(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let args = super::eval_args(ctx, doc, expr, "$arrayElemAt", 2)?;
    if args[0].is_nullish() {
        return Ok(Value::Null);
    }
    let items = expect_array(&args[0], "$arrayElemAt")?;
    let Some(idx) = args[1].as_f64() else {
        return Err(Error::invalid_argument(
            "$arrayElemAt index must be a number",
        ));
    };
    let idx = if idx < 0.0 {
        items.len() as f64 + idx
    } else {
        idx
    };
    if idx < 0.0 || idx >= items.len() as f64 {
        return Ok(Value::Undefined);
    }
    Ok(items[idx as usize].clone())
}

fn concat_arrays(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let parts = expect_array(&evaluated, "$concatArrays")?;
    let mut out = Vec::new();
    for part in parts {
        if part.is_nullish() {
            return Ok(Value::Null);
        }
        out.extend_from_slice(expect_array(part, "$concatArrays")?);
    }
    Ok(Value::Array(out))
}

fn filter(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument(
            "$filter expects { input, as, cond }",
        ));
    };
    let input = compute_value(ctx, doc, spec.get("input").unwrap_or(&Value::Undefined), None)?;
    let items = expect_array(&input, "$filter")?;
    let as_name = spec
        .get("as")
        .and_then(Value::as_str)
        .unwrap_or("this");
    let cond = spec.get("cond").unwrap_or(&Value::Undefined);

    let mut out = Vec::new();
    for item in items {
        let scope = VarScope::new(ctx.scope(), as_name, item.clone());
        let child = ctx.child(&scope);
        if compute_value(&child, doc, cond, None)?.is_truthy() {
            out.push(item.clone());
        }
    }
    Ok(Value::Array(out))
}

fn index_of_array(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let args = expect_array(&evaluated, "$indexOfArray")?;
    if args.len() < 2 || args.len() > 4 {
        return Err(Error::invalid_argument(
            "$indexOfArray expects between 2 and 4 arguments",
        ));
    }
    if args[0].is_nullish() {
        return Ok(Value::Null);
    }
    let items = expect_array(&args[0], "$indexOfArray")?;
    let needle = &args[1];

    let bound = |v: Option<&Value>, default: usize| -> usize {
        v.and_then(Value::as_f64)
            .map(|f| f.max(0.0) as usize)
            .unwrap_or(default)
    };
    let start = bound(args.get(2), 0).min(items.len());
    let end = bound(args.get(3), items.len()).min(items.len());
    if start > end {
        return Ok(Value::Int(-1));
    }

    for (i, item) in items[start..end].iter().enumerate() {
        if item == needle {
            return Ok(Value::Int((start + i) as i64));
        }
    }
    Ok(Value::Int(-1))
}

fn is_array(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    // the operand is usually spelled [expr]
    let arg = match expr {
        Value::Array(items) if items.len() == 1 => {
            compute_value(ctx, doc, &items[0], None)?
        }
        other => compute_value(ctx, doc, other, None)?,
    };
    Ok(Value::Boolean(matches!(arg, Value::Array(_))))
}

fn map(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument("$map expects { input, as, in }"));
    };
    let input = compute_value(ctx, doc, spec.get("input").unwrap_or(&Value::Undefined), None)?;
    if input.is_nullish() {
        return Ok(Value::Null);
    }
    let items = expect_array(&input, "$map")?;
    let as_name = spec
        .get("as")
        .and_then(Value::as_str)
        .unwrap_or("this");
    let in_expr = spec.get("in").unwrap_or(&Value::Undefined);

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let scope = VarScope::new(ctx.scope(), as_name, item.clone());
        let child = ctx.child(&scope);
        out.push(compute_value(&child, doc, in_expr, None)?);
    }
    Ok(Value::Array(out))
}

fn range(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let args = expect_array(&evaluated, "$range")?;
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::invalid_argument("$range expects 2 or 3 arguments"));
    }
    let num = |v: &Value, what: &str| -> Result<f64> {
        v.as_f64()
            .ok_or_else(|| Error::invalid_argument(format!("$range {} must be a number", what)))
    };
    let start = num(&args[0], "start")?;
    let end = num(&args[1], "end")?;
    let step = match args.get(2) {
        Some(v) => num(v, "step")?,
        None => 1.0,
    };
    if step == 0.0 {
        return Err(Error::invalid_argument("$range step must be non-zero"));
    }

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0.0 && i < end) || (step < 0.0 && i > end) {
        out.push(Value::number(i));
        i += step;
    }
    Ok(Value::Array(out))
}

fn reduce(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument(
            "$reduce expects { input, initialValue, in }",
        ));
    };
    let input = compute_value(ctx, doc, spec.get("input").unwrap_or(&Value::Undefined), None)?;
    if input.is_nullish() {
        return Ok(Value::Null);
    }
    let items = expect_array(&input, "$reduce")?;
    let mut acc = compute_value(
        ctx,
        doc,
        spec.get("initialValue").unwrap_or(&Value::Undefined),
        None,
    )?;
    let in_expr = spec.get("in").unwrap_or(&Value::Undefined);

    for item in items {
        let value_scope = VarScope::new(ctx.scope(), "value", acc);
        let this_scope = VarScope::new(Some(&value_scope), "this", item.clone());
        let child = ctx.child(&this_scope);
        acc = compute_value(&child, doc, in_expr, None)?;
    }
    Ok(acc)
}

fn reverse_array(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let value = compute_value(ctx, doc, expr, None)?;
    if value.is_nullish() {
        return Ok(Value::Null);
    }
    let mut items = expect_array(&value, "$reverseArray")?.to_vec();
    items.reverse();
    Ok(Value::Array(items))
}

fn size(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let value = compute_value(ctx, doc, expr, None)?;
    let items = expect_array(&value, "$size")?;
    Ok(Value::Int(items.len() as i64))
}

fn slice(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let args = expect_array(&evaluated, "$slice")?;
    if args.len() < 2 || args.len() > 3 {
        return Err(Error::invalid_argument("$slice expects 2 or 3 arguments"));
    }
    if args[0].is_nullish() {
        return Ok(Value::Null);
    }
    let items = expect_array(&args[0], "$slice")?;
    let Some(skip) = args[1].as_f64() else {
        return Err(Error::invalid_argument("$slice arguments must be numeric"));
    };
    let limit = match args.get(2) {
        Some(v) => Some(v.as_f64().ok_or_else(|| {
            Error::invalid_argument("$slice arguments must be numeric")
        })?),
        None => None,
    };
    Ok(Value::Array(slice_values(items, skip, limit)?))
}

fn zip(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument(
            "$zip expects { inputs, useLongestLength, defaults }",
        ));
    };
    let inputs = compute_value(ctx, doc, spec.get("inputs").unwrap_or(&Value::Undefined), None)?;
    let inputs = expect_array(&inputs, "$zip")?;
    let use_longest = spec
        .get("useLongestLength")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let defaults = match spec.get("defaults") {
        Some(d) => {
            if !use_longest {
                return Err(Error::invalid_argument(
                    "$zip 'defaults' requires 'useLongestLength'",
                ));
            }
            let d = compute_value(ctx, doc, d, None)?;
            Some(expect_array(&d, "$zip")?.to_vec())
        }
        None => None,
    };

    let mut arrays = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.is_nullish() {
            return Ok(Value::Null);
        }
        arrays.push(expect_array(input, "$zip")?);
    }
    if arrays.is_empty() {
        return Ok(Value::Array(Vec::new()));
    }

    let len = if use_longest {
        arrays.iter().map(|a| a.len()).max().unwrap_or(0)
    } else {
        arrays.iter().map(|a| a.len()).min().unwrap_or(0)
    };

    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let row: Vec<Value> = arrays
            .iter()
            .enumerate()
            .map(|(j, a)| match a.get(i) {
                Some(v) => v.clone(),
                None => defaults
                    .as_ref()
                    .and_then(|d| d.get(j).cloned())
                    .unwrap_or(Value::Null),
            })
            .collect();
        out.push(Value::Array(row));
    }
    Ok(Value::Array(out))
}
