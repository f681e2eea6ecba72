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

//! Projection operators used inside `$project` field specifications

use crate::core::error::{Error, Result};
use crate::core::path::resolve;
use crate::core::util::stddev;
use crate::core::value::Value;
use crate::eval::{compute_value, Context};
use crate::query::Query;

use super::array::slice_values;
use super::RawProjection;

pub(super) const OPERATORS: &[(&str, RawProjection)] = &[
    ("$elemMatch", elem_match),
    ("$slice", slice),
    ("$stdDevPop", std_dev_pop),
    ("$stdDevSamp", std_dev_samp),
];

fn elem_match(ctx: &Context, doc: &Value, field: &str, operand: &Value) -> Result<Value> {
    let resolved = resolve(doc, field);
    let Value::Array(items) = resolved else {
        return Ok(Value::Undefined);
    };
    let query = Query::with_options(operand.clone(), ctx.options().clone())?;
    for item in items {
        if query.test(&item)? {
            // the first matching element, still wrapped in an array
            return Ok(Value::Array(vec![item]));
        }
    }
    Ok(Value::Undefined)
}

fn slice(_ctx: &Context, doc: &Value, field: &str, operand: &Value) -> Result<Value> {
    let resolved = resolve(doc, field);
    let Value::Array(items) = resolved else {
        return Ok(Value::Undefined);
    };
    match operand {
        Value::Array(args) => {
            if args.len() != 2 {
                return Err(Error::invalid_argument(
                    "$slice projection expects [skip, limit]",
                ));
            }
            let (Some(skip), Some(limit)) = (args[0].as_f64(), args[1].as_f64()) else {
                return Err(Error::invalid_argument(
                    "$slice projection arguments must be numeric",
                ));
            };
            Ok(Value::Array(slice_values(&items, skip, Some(limit))?))
        }
        other => {
            let Some(n) = other.as_f64() else {
                return Err(Error::invalid_argument(
                    "$slice projection expects a count or [skip, limit]",
                ));
            };
            Ok(Value::Array(slice_values(&items, n, None)?))
        }
    }
}

fn std_dev(ctx: &Context, doc: &Value, operand: &Value, sampled: bool) -> Result<Value> {
    // unlike $elemMatch/$slice, the dataset comes from the operand expression
    let evaluated = compute_value(ctx, doc, operand, None)?;
    let Value::Array(items) = evaluated else {
        return Ok(Value::Null);
    };
    let nums: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
    Ok(match stddev(&nums, sampled) {
        Some(sd) => Value::Float(sd),
        None => Value::Null,
    })
}

fn std_dev_pop(ctx: &Context, doc: &Value, _field: &str, operand: &Value) -> Result<Value> {
    std_dev(ctx, doc, operand, false)
}

fn std_dev_samp(ctx: &Context, doc: &Value, _field: &str, operand: &Value) -> Result<Value> {
    std_dev(ctx, doc, operand, true)
}
