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

//! Operator tables
//!
//! Operators are grouped into five classes, each with its own registry
//! table and handler signature:
//!
//! - `query` - field predicates used by the matcher
//! - `projection` - field reshaping used by `$project`
//! - `aggregate` - expression operators used by [`crate::eval::compute_value`]
//! - `group` - accumulators used by `$group`
//! - `pipeline` - document-stream stages used by [`crate::Aggregator`]

pub mod arithmetic;
pub mod array;
pub mod boolean;
pub mod comparison;
pub mod conditional;
pub mod date;
pub mod group;
pub mod projection;
pub mod query;
pub mod registry;
pub mod set;
pub mod string;
pub mod variable;

use std::fmt;
use std::sync::Arc;

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::value::Value;
use crate::eval::{compute_value, Context};

/// Operator class, naming which registry table an operator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorClass {
    Query,
    Projection,
    Group,
    Pipeline,
    Aggregate,
}

impl fmt::Display for OperatorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatorClass::Query => "query",
            OperatorClass::Projection => "projection",
            OperatorClass::Group => "group",
            OperatorClass::Pipeline => "pipeline",
            OperatorClass::Aggregate => "aggregate",
        };
        write!(f, "{}", name)
    }
}

// Raw handler signatures used by the built-in tables
pub(crate) type RawAggregate = fn(&Context, &Value, &Value) -> Result<Value>;
pub(crate) type RawGroup = fn(&Context, &[Value], Option<&Value>) -> Result<Value>;
pub(crate) type RawQuery = fn(&QueryArgs) -> Result<bool>;
pub(crate) type RawProjection = fn(&Context, &Value, &str, &Value) -> Result<Value>;
pub(crate) type RawPipeline = fn(&Options, Vec<Value>, &Value) -> Result<Vec<Value>>;

/// Shared handler types stored in the registry (built-ins and extensions)
pub(crate) type AggregateHandler =
    Arc<dyn Fn(&Context, &Value, &Value) -> Result<Value> + Send + Sync>;
pub(crate) type GroupHandler =
    Arc<dyn Fn(&Context, &[Value], Option<&Value>) -> Result<Value> + Send + Sync>;
pub(crate) type QueryHandler = Arc<dyn Fn(&QueryArgs) -> Result<bool> + Send + Sync>;

/// Arguments to a query-operator predicate
///
/// `lhs` is the field value already resolved against `doc` (it may be an
/// array, which is what enables array-traversal matching).
pub struct QueryArgs<'a> {
    pub field: &'a str,
    pub doc: &'a Value,
    pub lhs: &'a Value,
    pub operand: &'a Value,
    pub options: &'a Options,
}
pub(crate) type ProjectionHandler =
    Arc<dyn Fn(&Context, &Value, &str, &Value) -> Result<Value> + Send + Sync>;
pub(crate) type PipelineHandler =
    Arc<dyn Fn(&Options, Vec<Value>, &Value) -> Result<Vec<Value>> + Send + Sync>;

/// A user-supplied operator for [`registry::add_operators`]
///
/// Query and projection operators receive the selector and the
/// already-resolved left-hand value; the remaining classes use the same
/// calling convention as built-ins.
pub enum CustomOperator {
    Query(Box<dyn Fn(&str, &Value, &Value) -> Result<bool> + Send + Sync>),
    Projection(Box<dyn Fn(&str, &Value, &Value) -> Result<Value> + Send + Sync>),
    Aggregate(Box<dyn Fn(&Context, &Value, &Value) -> Result<Value> + Send + Sync>),
    Group(Box<dyn Fn(&Context, &[Value], Option<&Value>) -> Result<Value> + Send + Sync>),
    Pipeline(Box<dyn Fn(&Options, Vec<Value>, &Value) -> Result<Vec<Value>> + Send + Sync>),
}

impl CustomOperator {
    pub(crate) fn class(&self) -> OperatorClass {
        match self {
            CustomOperator::Query(_) => OperatorClass::Query,
            CustomOperator::Projection(_) => OperatorClass::Projection,
            CustomOperator::Aggregate(_) => OperatorClass::Aggregate,
            CustomOperator::Group(_) => OperatorClass::Group,
            CustomOperator::Pipeline(_) => OperatorClass::Pipeline,
        }
    }
}

// =============================================================================
// Shared operand helpers
// =============================================================================

/// Evaluate an operand expected to be an array of `count` sub-expressions
pub(crate) fn eval_args(
    ctx: &Context,
    doc: &Value,
    expr: &Value,
    op: &str,
    count: usize,
) -> Result<Vec<Value>> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    let Value::Array(items) = evaluated else {
        return Err(Error::invalid_argument(format!(
            "{} expects an array of {} arguments",
            op, count
        )));
    };
    if items.len() != count {
        return Err(Error::invalid_argument(format!(
            "{} expects exactly {} arguments, got {}",
            op,
            count,
            items.len()
        )));
    }
    Ok(items)
}

/// Evaluate a unary operand, unwrapping the `[x]` spelling
pub(crate) fn eval_unary(ctx: &Context, doc: &Value, expr: &Value, op: &str) -> Result<Value> {
    let evaluated = compute_value(ctx, doc, expr, None)?;
    match evaluated {
        Value::Array(mut items) if items.len() == 1 => Ok(items.pop().unwrap()),
        Value::Array(items) => Err(Error::invalid_argument(format!(
            "{} expects a single argument, got {}",
            op,
            items.len()
        ))),
        other => Ok(other),
    }
}

/// Numeric extraction with soft-null: `None` for null/undefined, error for
/// any other non-number
pub(crate) fn to_number(value: &Value, op: &str) -> Result<Option<f64>> {
    match value {
        Value::Null | Value::Undefined => Ok(None),
        Value::Int(i) => Ok(Some(*i as f64)),
        Value::Float(f) => Ok(Some(*f)),
        other => Err(Error::non_numeric(op, other.kind().to_string())),
    }
}

/// Borrow an operand as an array or fail
pub(crate) fn expect_array<'a>(value: &'a Value, op: &str) -> Result<&'a [Value]> {
    value.as_array().ok_or_else(|| {
        Error::invalid_argument(format!("{} expects an array operand, got {}", op, value.kind()))
    })
}

pub use registry::add_operators;
