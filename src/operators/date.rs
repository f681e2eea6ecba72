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

//! Date expression operators
//!
//! Every extraction reads UTC. Non-date input yields `Undefined`.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::core::error::{Error, Result};
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

use super::{eval_unary, RawAggregate};

pub(super) const OPERATORS: &[(&str, RawAggregate)] = &[
    ("$dateToString", date_to_string),
    ("$dayOfMonth", day_of_month),
    ("$dayOfWeek", day_of_week),
    ("$dayOfYear", day_of_year),
    ("$hour", hour),
    ("$millisecond", millisecond),
    ("$minute", minute),
    ("$month", month),
    ("$second", second),
    ("$week", week),
    ("$year", year),
];

/// Evaluate the operand and extract an integer date part
fn extract(
    ctx: &Context,
    doc: &Value,
    expr: &Value,
    op: &str,
    f: impl FnOnce(DateTime<Utc>) -> i64,
) -> Result<Value> {
    let value = eval_unary(ctx, doc, expr, op)?;
    match value.as_datetime() {
        Some(t) => Ok(Value::Int(f(t))),
        None => Ok(Value::Undefined),
    }
}

fn day_of_year(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$dayOfYear", |t| t.ordinal() as i64)
}

fn day_of_month(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$dayOfMonth", |t| t.day() as i64)
}

fn day_of_week(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    // Sunday is 1, Saturday is 7
    extract(ctx, doc, expr, "$dayOfWeek", |t| {
        t.weekday().num_days_from_sunday() as i64 + 1
    })
}

fn year(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$year", |t| t.year() as i64)
}

fn month(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$month", |t| t.month() as i64)
}

fn week(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    // ISO week number, anchored on Thursday
    extract(ctx, doc, expr, "$week", |t| t.iso_week().week() as i64)
}

fn hour(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$hour", |t| t.hour() as i64)
}

fn minute(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$minute", |t| t.minute() as i64)
}

fn second(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$second", |t| t.second() as i64)
}

fn millisecond(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    extract(ctx, doc, expr, "$millisecond", |t| {
        t.timestamp_subsec_millis() as i64
    })
}

fn date_to_string(ctx: &Context, doc: &Value, expr: &Value) -> Result<Value> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument(
            "$dateToString expects { format, date }",
        ));
    };
    let Some(format) = spec.get("format").and_then(Value::as_str) else {
        return Err(Error::invalid_argument(
            "$dateToString requires a string 'format'",
        ));
    };
    let date_expr = spec.get("date").cloned().unwrap_or(Value::Undefined);
    let value = compute_value(ctx, doc, &date_expr, None)?;
    let Some(t) = value.as_datetime() else {
        return Ok(Value::Undefined);
    };
    Ok(Value::text(format_date(format, t)))
}

/// Expand the `$dateToString` token table
fn format_date(format: &str, t: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('Y') => out.push_str(&format!("{:04}", t.year())),
            Some('m') => out.push_str(&format!("{:02}", t.month())),
            Some('d') => out.push_str(&format!("{:02}", t.day())),
            Some('H') => out.push_str(&format!("{:02}", t.hour())),
            Some('M') => out.push_str(&format!("{:02}", t.minute())),
            Some('S') => out.push_str(&format!("{:02}", t.second())),
            Some('L') => out.push_str(&format!("{:03}", t.timestamp_subsec_millis())),
            Some('j') => out.push_str(&format!("{:03}", t.ordinal())),
            Some('w') => out.push_str(&format!("{}", t.weekday().num_days_from_sunday() + 1)),
            Some('U') => out.push_str(&format!("{:02}", t.iso_week().week())),
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}
