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

//! Variable binding and literal operators

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::eval::{compute_value, Context, VarScope};

use super::RawAggregate;

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$let", let_op),
    ("$literal", literal),
];

fn let_op(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument("$let expects { vars, in }"));
    };
    let Some(vars) = spec.get("vars").and_then(Value::as_object) else {
        return Err(Error::invalid_argument("$let requires a 'vars' document"));
    };
    let in_expr = spec
        .get("in")
        .ok_or_else(|| Error::invalid_argument("$let requires 'in'"))?;

    // bindings are independent: each is evaluated in the outer scope
    let mut bindings = Vec::with_capacity(vars.len());
    for (name, var_expr) in vars {
        bindings.push((name.as_str(), compute_value(ctx, doc, var_expr, None)?));
    }
    eval_with_bindings(ctx, doc, &bindings, in_expr)
}

fn eval_with_bindings(
    ctx: &Context,
    doc: &Value,
    bindings: &[(&str, Value)],
    in_expr: &Value,
) -> Result<Value> {
    match bindings.split_first() {
        None => compute_value(ctx, doc, in_expr, None),
        Some(((name, value), rest)) => {
            let scope = VarScope::new(ctx.scope(), *name, value.clone());
            let child = ctx.child(&scope);
            eval_with_bindings(&child, doc, rest, in_expr)
        }
    }
}

fn literal(_ctx: &Context, _doc: &Value, expr: &Value) -> Result<Value> {
    // returned un-interpreted
    Ok(expr.clone())
}
