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

//! Boolean expression operators

use crate::core::error::Result;
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

use super::{eval_unary, expect_array, RawAggregate};

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$and", and),
    ("$not", not),
    ("$or", or),
];

fn and(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let items = expect_array(&evaluated, "$and")?;
    Ok(Value::Boolean(items.iter().all(Value::is_truthy)))
}

fn or(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let items = expect_array(&evaluated, "$or")?;
    Ok(Value::Boolean(items.iter().any(Value::is_truthy)))
}

fn not(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let value = eval_unary(ctx, doc, expr, "$not")?;
    Ok(Value::Boolean(!value.is_truthy()))
}
