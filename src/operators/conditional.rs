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

//! Conditional expression operators

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

use super::RawAggregate;

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$cond", cond),
    ("$ifNull", if_null),
    ("$switch", switch),
];

fn cond(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let (if_expr, then_expr, else_expr) = match expr {
        Value::Array(items) => {
            if items.len() != 3 {
                return Err(Error::invalid_argument(
                    "$cond expects exactly 3 arguments",
                ));
            }
            (&items[0], &items[1], &items[2])
        }
        Value::Object(spec) => {
            let if_expr = spec
                .get("if")
                .ok_or_else(|| Error::invalid_argument("$cond requires 'if'"))?;
            let then_expr = spec
                .get("then")
                .ok_or_else(|| Error::invalid_argument("$cond requires 'then'"))?;
            let else_expr = spec
                .get("else")
                .ok_or_else(|| Error::invalid_argument("$cond requires 'else'"))?;
            (if_expr, then_expr, else_expr)
        }
        _ => {
            return Err(Error::invalid_argument(
                "$cond expects an array or { if, then, else }",
            ))
        }
    };

    // only the taken branch is evaluated
    if compute_value(ctx, doc, if_expr, None)?.is_truthy() {
        compute_value(ctx, doc, then_expr, None)
    } else {
        compute_value(ctx, doc, else_expr, None)
    }
}

fn if_null(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Value::Array(items) = expr else {
        return Err(Error::invalid_argument(
            "$ifNull expects an array of 2 arguments",
        ));
    };
    if items.len() != 2 {
        return Err(Error::invalid_argument(
            "$ifNull expects exactly 2 arguments",
        ));
    }
    let first = compute_value(ctx, doc, &items[0], None)?;
    if !first.is_nullish() {
        return Ok(first);
    }
    compute_value(ctx, doc, &items[1], None)
}

fn switch(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument(
            "$switch expects { branches, default }",
        ));
    };
    let Some(Value::Array(branches)) = spec.get("branches") else {
        return Err(Error::invalid_argument(
            "$switch requires a 'branches' array",
        ));
    };

    for branch in branches {
        let Some(branch) = branch.as_object() else {
            return Err(Error::invalid_argument(
                "$switch branches must be { case, then }",
            ));
        };
        let case = branch.get("case").ok_or_else(|| {
            Error::invalid_argument("$switch branch requires 'case'")
        })?;
        if compute_value(ctx, doc, case, None)?.is_truthy() {
            let then = branch.get("then").ok_or_else(|| {
                Error::invalid_argument("$switch branch requires 'then'")
            })?;
            return compute_value(ctx, doc, then, None);
        }
    }

    match spec.get("default") {
        Some(default) => compute_value(ctx, doc, default, None),
        None => Err(Error::invalid_argument(
            "$switch found no matching branch and no default",
        )),
    }
}
