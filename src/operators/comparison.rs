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

//! Comparison expression operators
//!
//! Relational operators use the engine's total value order, so mixed-kind
//! comparisons are well defined.

use std::cmp::Ordering;

use crate::core::error::Result;
use crate::core::value::Value;
use crate::eval::Context;

use super::{eval_args, RawAggregate};

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$cmp", cmp),
    ("$eq", eq),
    ("$gt", gt),
    ("$gte", gte),
    ("$lt", lt),
    ("$lte", lte),
    ("$ne", ne),
];

fn pair(ctx: &Context, doc: &Value, expr: &Value, op: &str) -> Result<(Value, Value)> {
    let mut args = eval_args(ctx, doc, expr, op, 2)?;
    let b = args.pop().unwrap();
    let a = args.pop().unwrap();
    Ok((a, b))
}

fn cmp(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = pair(ctx, doc, expr, "$cmp")?;
    Ok(Value::Int(match a.cmp_total(&b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

fn eq(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = pair(ctx, doc, expr, "$eq")?;
    Ok(Value::Boolean(a == b))
}

fn ne(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = pair(ctx, doc, expr, "$ne")?;
    Ok(Value::Boolean(a != b))
}

fn gt(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = pair(ctx, doc, expr, "$gt")?;
    Ok(Value::Boolean(a.cmp_total(&b) == Ordering::Greater))
}

fn gte(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = pair(ctx, doc, expr, "$gte")?;
    Ok(Value::Boolean(a.cmp_total(&b) != Ordering::Less))
}

fn lt(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = pair(ctx, doc, expr, "$lt")?;
    Ok(Value::Boolean(a.cmp_total(&b) == Ordering::Less))
}

fn lte(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (a, b) = pair(ctx, doc, expr, "$lte")?;
    Ok(Value::Boolean(a.cmp_total(&b) != Ordering::Greater))
}
