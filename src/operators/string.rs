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

//! String expression operators

use std::cmp::Ordering;

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

use super::{eval_unary, expect_array, RawAggregate};

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$concat", concat),
    ("$indexOfBytes", index_of_bytes),
    ("$split", split),
    ("$strcasecmp", strcasecmp),
    ("$substr", substr),
    ("$toLower", to_lower),
    ("$toUpper", to_upper),
];

fn expect_string(value: &Value, op: &str) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        Error::invalid_argument(format!("{} expects a string operand, got {}", op, value.kind()))
    })
}

fn concat(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let items = expect_array(&evaluated, "$concat")?;
    let mut out = String::new();
    for item in items {
        if item.is_nullish() {
            return Ok(Value::Null);
        }
        out.push_str(&expect_string(item, "$concat")?);
    }
    Ok(Value::text(out))
}

fn index_of_bytes(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let args = expect_array(&evaluated, "$indexOfBytes")?;
    if args.len() < 2 || args.len() > 4 {
        return Err(Error::invalid_argument(
            "$indexOfBytes expects between 2 and 4 arguments",
        ));
    }
    if args[0].is_nullish() {
        return Ok(Value::Null);
    }
    let haystack = expect_string(&args[0], "$indexOfBytes")?;
    let needle = expect_string(&args[1], "$indexOfBytes")?;

    let bound = |v: Option<&Value>, default: usize| -> Result<usize> {
        match v {
            None => Ok(default),
            Some(n) => match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(f as usize),
                _ => Err(Error::invalid_argument(
                    "$indexOfBytes bounds must be non-negative integers",
                )),
            },
        }
    };
    let bytes = haystack.as_bytes();
    let start = bound(args.get(2), 0)?.min(bytes.len());
    let end = bound(args.get(3), bytes.len())?.min(bytes.len());
    if start > end {
        return Ok(Value::Int(-1));
    }

    let window = &bytes[start..end];
    let found = find_bytes(window, needle.as_bytes());
    Ok(Value::Int(match found {
        Some(pos) => (pos + start) as i64,
        None => -1,
    }))
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn split(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let args = expect_array(&evaluated, "$split")?;
    if args.len() != 2 {
        return Err(Error::invalid_argument("$split expects exactly 2 arguments"));
    }
    if args[0].is_nullish() {
        return Ok(Value::Null);
    }
    let input = expect_string(&args[0], "$split")?;
    let delimiter = expect_string(&args[1], "$split")?;
    Ok(Value::Array(
        input.split(delimiter.as_str()).map(Value::text).collect(),
    ))
}

fn strcasecmp(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let args = expect_array(&evaluated, "$strcasecmp")?;
    if args.len() != 2 {
        return Err(Error::invalid_argument(
            "$strcasecmp expects exactly 2 arguments",
        ));
    }
    let a = args[0].as_str().unwrap_or("").to_uppercase();
    let b = args[1].as_str().unwrap_or("").to_uppercase();
    Ok(Value::Int(match a.cmp(&b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }))
}

fn substr(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let args = expect_array(&evaluated, "$substr")?;
    if args.len() != 3 {
        return Err(Error::invalid_argument("$substr expects exactly 3 arguments"));
    }
    let Some(s) = args[0].as_str() else {
        return Ok(Value::text(""));
    };
    let start = args[1].as_f64().unwrap_or(-1.0);
    let count = args[2].as_f64().unwrap_or(-1.0);
    if start < 0.0 {
        return Ok(Value::text(""));
    }
    let chars: Vec<char> = s.chars().collect();
    let start = (start as usize).min(chars.len());
    let taken: String = if count < 0.0 {
        chars[start..].iter().collect()
    } else {
        chars[start..].iter().take(count as usize).collect()
    };
    Ok(Value::text(taken))
}

fn to_lower(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let value = eval_unary(ctx, doc, expr, "$toLower")?;
    Ok(Value::text(
        value.as_str().map(str::to_lowercase).unwrap_or_default(),
    ))
}

fn to_upper(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let value = eval_unary(ctx, doc, expr, "$toUpper")?;
    Ok(Value::text(
        value.as_str().map(str::to_uppercase).unwrap_or_default(),
    ))
}
