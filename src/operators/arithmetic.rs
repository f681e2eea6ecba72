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

//! Arithmetic expression operators
//!
//! All of them share the soft-null contract: any null or undefined operand
//! short-circuits to null, NaN propagates, and a non-numeric operand is a
//! validation error.

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

use super::{eval_args, eval_unary, to_number, RawAggregate};

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$abs", abs),
    ("$add", add),
    ("$ceil", ceil),
    ("$divide", divide),
    ("$exp", exp),
    ("$floor", floor),
    ("$ln", ln),
    ("$log", log),
    ("$log10", log10),
    ("$mod", modulo),
    ("$multiply", multiply),
    ("$pow", pow),
    ("$sqrt", sqrt),
    ("$subtract", subtract),
    ("$trunc", trunc),
];

/// Apply a unary math function with soft-null semantics
fn unary_map(
    ctx: &Context,
    doc: &Value,
    expr: &Value,
    op: &str,
    f: impl FnOnce(f64) -> f64,
) -> Result<Value> {
    let value = eval_unary(ctx, doc, expr, op)?;
    match to_number(&value, op)? {
        None => Ok(Value::Null),
        Some(n) => Ok(Value::number(f(n))),
    }
}

/// Reduce an array operand with soft-null semantics
fn fold(
    ctx: &Context,
    doc: &Value,
    expr: &Value,
    op: &str,
    init: f64,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let Value::Array(items) = evaluated else {
        return Err(Error::invalid_argument(format!(
            "{} expects an array operand",
            op
        )));
    };
    let mut acc = init;
    for item in &items {
        match to_number(item, op)? {
            None => return Ok(Value::Null),
            Some(n) => acc = f(acc, n),
        }
    }
    Ok(Value::number(acc))
}

/// Evaluate a binary operand pair, short-circuiting on nullish inputs
fn binary_args(
    ctx: &Context,
    doc: &Value,
    expr: &Value,
    op: &str,
) -> Result<Option<(f64, f64)>> {
    let args = eval_args(ctx, doc, expr, op, 2)?;
    let Some(a) = to_number(&args[0], op)? else {
        return Ok(None);
    };
    let Some(b) = to_number(&args[1], op)? else {
        return Ok(None);
    };
    Ok(Some((a, b)))
}

fn abs(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    unary_map(ctx, doc, expr, "$abs", f64::abs)
}

fn add(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    fold(ctx, doc, expr, "$add", 0.0, |a, b| a + b)
}

fn ceil(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    unary_map(ctx, doc, expr, "$ceil", f64::ceil)
}

fn divide(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    match binary_args(ctx, doc, expr, "$divide")? {
        None => Ok(Value::Null),
        Some((a, b)) => Ok(Value::number(a / b)),
    }
}

fn exp(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    unary_map(ctx, doc, expr, "$exp", f64::exp)
}

fn floor(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    unary_map(ctx, doc, expr, "$floor", f64::floor)
}

fn ln(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    unary_map(ctx, doc, expr, "$ln", f64::ln)
}

fn log(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    match binary_args(ctx, doc, expr, "$log")? {
        None => Ok(Value::Null),
        Some((n, base)) => Ok(Value::number(n.log(base))),
    }
}

fn log10(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    unary_map(ctx, doc, expr, "$log10", f64::log10)
}

fn modulo(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    match binary_args(ctx, doc, expr, "$mod")? {
        None => Ok(Value::Null),
        Some((a, b)) => Ok(Value::number(a % b)),
    }
}

fn multiply(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    fold(ctx, doc, expr, "$multiply", 1.0, |a, b| a * b)
}

fn pow(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    match binary_args(ctx, doc, expr, "$pow")? {
        None => Ok(Value::Null),
        Some((base, exponent)) => {
            if base == 0.0 && exponent < 0.0 {
                return Err(Error::invalid_argument(
                    "$pow cannot raise 0 to a negative exponent",
                ));
            }
            Ok(Value::number(base.powf(exponent)))
        }
    }
}

fn sqrt(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let value = eval_unary(ctx, doc, expr, "$sqrt")?;
    match to_number(&value, "$sqrt")? {
        None => Ok(Value::Null),
        Some(n) if n.is_nan() => Ok(Value::Float(f64::NAN)),
        Some(n) if n < 0.0 => Err(Error::invalid_argument(
            "$sqrt expects a non-negative number",
        )),
        Some(n) => Ok(Value::number(n.sqrt())),
    }
}

fn subtract(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    match binary_args(ctx, doc, expr, "$subtract")? {
        None => Ok(Value::Null),
        Some((a, b)) => Ok(Value::number(a - b)),
    }
}

fn trunc(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    unary_map(ctx, doc, expr, "$trunc", f64::trunc)
}
