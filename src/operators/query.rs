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

//! Query operators
//!
//! A predicate receives the field value already resolved against the
//! candidate document. A resolved array is matched element-wise, which is
//! MongoDB's array-traversal behaviour.

use std::cmp::Ordering;

use crate::core::error::{Error, Result};
use crate::core::util::{intersection, unique};
use crate::core::value::{Value, ValueRegex};
use crate::query::Query;

use super::{QueryArgs, RawQuery};

pub(super) const OPERATORS: &[(&str, RawQuery)] = &[
    ("$all", all),
    ("$elemMatch", elem_match),
    ("$eq", eq),
    ("$exists", exists),
    ("$gt", gt),
    ("$gte", gte),
    ("$in", is_in),
    ("$lt", lt),
    ("$lte", lte),
    ("$mod", modulo),
    ("$ne", ne),
    ("$nin", nin),
    ("$not", not),
    ("$regex", regex),
    ("$size", size),
    ("$type", type_of),
];

/// View a resolved value as match candidates: an array matches through its
/// elements, anything else matches as itself
fn candidates(lhs: &Value) -> Vec<&Value> {
    match lhs {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn eq_match(lhs: &Value, rhs: &Value) -> bool {
    if lhs == rhs {
        return true;
    }
    match lhs {
        Value::Array(items) => items.iter().any(|item| item == rhs),
        _ => false,
    }
}

fn eq(args: &QueryArgs) -> Result<bool> {
    Ok(eq_match(args.lhs, args.operand))
}

fn ne(args: &QueryArgs) -> Result<bool> {
    Ok(!eq_match(args.lhs, args.operand))
}

/// Shared relational matcher: some candidate of the same kind satisfies the
/// ordering against the operand
fn compare(lhs: &Value, rhs: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    candidates(lhs)
        .into_iter()
        .any(|x| x.kind() == rhs.kind() && accept(x.cmp_total(rhs)))
}

fn gt(args: &QueryArgs) -> Result<bool> {
    Ok(compare(args.lhs, args.operand, |ord| ord == Ordering::Greater))
}

fn gte(args: &QueryArgs) -> Result<bool> {
    Ok(compare(args.lhs, args.operand, |ord| ord != Ordering::Less))
}

fn lt(args: &QueryArgs) -> Result<bool> {
    Ok(compare(args.lhs, args.operand, |ord| ord == Ordering::Less))
}

fn lte(args: &QueryArgs) -> Result<bool> {
    Ok(compare(args.lhs, args.operand, |ord| ord != Ordering::Greater))
}

fn is_in(args: &QueryArgs) -> Result<bool> {
    let Value::Array(rhs) = args.operand else {
        return Err(Error::invalid_argument("$in expects an array operand"));
    };
    let lhs: Vec<Value> = candidates(args.lhs).into_iter().cloned().collect();
    Ok(!intersection(&lhs, rhs).is_empty())
}

fn nin(args: &QueryArgs) -> Result<bool> {
    Ok(!is_in(args)?)
}

fn modulo(args: &QueryArgs) -> Result<bool> {
    let Value::Array(pair) = args.operand else {
        return Err(Error::invalid_argument(
            "$mod expects a [divisor, remainder] array",
        ));
    };
    if pair.len() != 2 {
        return Err(Error::invalid_argument(
            "$mod expects a [divisor, remainder] array",
        ));
    }
    let (Some(divisor), Some(remainder)) = (pair[0].as_f64(), pair[1].as_f64()) else {
        return Err(Error::invalid_argument(
            "$mod expects a [divisor, remainder] array",
        ));
    };
    Ok(candidates(args.lhs)
        .into_iter()
        .filter_map(Value::as_f64)
        .any(|x| x % divisor == remainder))
}

fn regex(args: &QueryArgs) -> Result<bool> {
    let re = match args.operand {
        Value::Regex(r) => r.clone(),
        Value::Text(pattern) => ValueRegex::new(pattern)?,
        other => {
            return Err(Error::invalid_argument(format!(
                "$regex expects a pattern, got {}",
                other.kind()
            )))
        }
    };
    Ok(candidates(args.lhs)
        .into_iter()
        .filter_map(Value::as_str)
        .any(|s| re.is_match(s)))
}

fn exists(args: &QueryArgs) -> Result<bool> {
    Ok(args.operand.is_truthy() == !args.lhs.is_undefined())
}

fn all(args: &QueryArgs) -> Result<bool> {
    let Value::Array(rhs) = args.operand else {
        return Err(Error::invalid_argument("$all expects an array operand"));
    };
    let Value::Array(_) = args.lhs else {
        return Ok(false);
    };
    if rhs.is_empty() {
        return Ok(false);
    }

    for item in rhs {
        if let Some(map) = item.as_object() {
            if let Some(sub) = map.get("$elemMatch") {
                let sub_args = QueryArgs {
                    field: args.field,
                    doc: args.doc,
                    lhs: args.lhs,
                    operand: sub,
                    options: args.options,
                };
                // every clause must be satisfied
                if !elem_match(&sub_args)? {
                    return Ok(false);
                }
                continue;
            }
        }
        // plain members: rhs must be a subset of lhs; compare against the
        // deduplicated operand since intersection collapses duplicates
        let lhs: Vec<Value> = candidates(args.lhs).into_iter().cloned().collect();
        return Ok(intersection(rhs, &lhs).len() == unique(rhs).len());
    }
    Ok(true)
}

fn size(args: &QueryArgs) -> Result<bool> {
    let Value::Array(items) = args.lhs else {
        return Ok(false);
    };
    Ok(args
        .operand
        .as_f64()
        .is_some_and(|n| n == items.len() as f64))
}

fn elem_match(args: &QueryArgs) -> Result<bool> {
    let Value::Array(items) = args.lhs else {
        return Ok(false);
    };
    let query = Query::with_options(args.operand.clone(), args.options.clone())?;
    for item in items {
        if query.test(item)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn type_of(args: &QueryArgs) -> Result<bool> {
    let Some(code) = args.operand.as_i64() else {
        return Err(Error::invalid_argument("$type expects a numeric type code"));
    };
    let lhs = args.lhs;
    Ok(match code {
        1 => lhs.is_number(),
        2 => matches!(lhs, Value::Text(_)),
        3 => matches!(lhs, Value::Object(_)),
        4 => matches!(lhs, Value::Array(_)),
        5 => false, // binary data is not part of the document model
        8 => matches!(lhs, Value::Boolean(_)),
        9 => matches!(lhs, Value::DateTime(_)),
        10 => lhs.is_null(),
        11 => matches!(lhs, Value::Regex(_)),
        16 => lhs
            .as_f64()
            .is_some_and(|n| n.fract() == 0.0 && n.abs() <= i32::MAX as f64),
        18 => lhs
            .as_f64()
            .is_some_and(|n| n.fract() == 0.0 && n.abs() > i32::MAX as f64),
        _ => false,
    })
}

fn not(args: &QueryArgs) -> Result<bool> {
    // wrap the sub-expression in a nested query over the same field
    let mut criteria = crate::core::value::Document::new();
    criteria.insert(args.field.to_string(), args.operand.clone());
    let query = Query::with_options(Value::Object(criteria), args.options.clone())?;
    Ok(!query.test(args.doc)?)
}
