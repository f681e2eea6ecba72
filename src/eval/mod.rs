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

//! Expression evaluator
//!
//! [`compute_value`] interprets an arbitrary document as an expression tree:
//! literals, `$`-prefixed field paths, `$$` variables, operator
//! applications, records of sub-expressions, and element-wise arrays.
//!
//! Variables bound by `$let`/`$map`/`$filter`/`$reduce` live in an explicit
//! scope chain on the [`Context`]; the document under evaluation is never
//! mutated.

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::path::resolve;
use crate::core::value::{Document, Value};
use crate::operators::registry::global_registry;

/// One variable binding in the evaluation scope chain
pub struct VarScope<'a> {
    parent: Option<&'a VarScope<'a>>,
    name: String,
    value: Value,
}

impl<'a> VarScope<'a> {
    /// Create a binding on top of an optional parent scope
    pub fn new(parent: Option<&'a VarScope<'a>>, name: impl Into<String>, value: Value) -> Self {
        VarScope {
            parent,
            name: name.into(),
            value,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        if self.name == name {
            Some(&self.value)
        } else {
            self.parent.and_then(|p| p.lookup(name))
        }
    }
}

/// Evaluation context: the root document, the variable environment, and
/// the engine options
///
/// The root is captured on the outermost call and propagated unchanged so
/// `$$ROOT` keeps meaning the original document through nested evaluation.
pub struct Context<'a> {
    root: &'a Value,
    options: &'a Options,
    vars: Option<&'a VarScope<'a>>,
}

impl<'a> Context<'a> {
    /// Context rooted at `root`
    pub fn new(root: &'a Value, options: &'a Options) -> Self {
        Context {
            root,
            options,
            vars: None,
        }
    }

    /// The document bound to `$$ROOT`
    pub fn root(&self) -> &Value {
        self.root
    }

    /// Engine options
    pub fn options(&self) -> &Options {
        self.options
    }

    /// The current variable scope, for stacking a child binding
    pub fn scope(&self) -> Option<&'a VarScope<'a>> {
        self.vars
    }

    /// A context sharing this root and options but with `scope` pushed
    pub fn child<'b>(&'b self, scope: &'b VarScope<'b>) -> Context<'b> {
        Context {
            root: self.root,
            options: self.options,
            vars: Some(scope),
        }
    }

    /// Look up a user variable
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.and_then(|scope| scope.lookup(name))
    }
}

/// Evaluate `expr` against `doc`
///
/// `field` is the key the expression was found under, if any; when it names
/// an aggregate or group operator the expression is dispatched to that
/// operator instead of being interpreted structurally.
pub fn compute_value(
    ctx: &Context,
    doc: &Value,
    expr: &Value,
    field: Option<&str>,
) -> Result<Value> {
    if let Some(name) = field {
        if let Some(op) = global_registry().aggregate_op(name) {
            return op(ctx, doc, expr);
        }
        if let Some(op) = global_registry().group_op(name) {
            // fully evaluate the expression, then accumulate over the array
            let evaluated = compute_value(ctx, doc, expr, None)?;
            let Value::Array(items) = evaluated else {
                return Err(Error::invalid_expression(format!(
                    "{} expects its operand to evaluate to an array",
                    name
                )));
            };
            return op(ctx, &items, None);
        }
    }

    match expr {
        Value::Text(s) if s.starts_with('$') => resolve_path_expr(ctx, doc, s),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(compute_value(ctx, doc, item, None)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            // operator-application form: a single $-key drawn from the
            // aggregate or group tables
            for key in map.keys() {
                if global_registry().has_aggregate(key) || global_registry().has_group(key) {
                    if map.len() != 1 {
                        return Err(Error::invalid_expression(format!(
                            "operator application for '{}' must have exactly one key",
                            key
                        )));
                    }
                    return compute_value(ctx, doc, &map[key], Some(key));
                }
            }
            // record of sub-expressions
            let mut out = Document::new();
            for (key, sub) in map {
                out.insert(key.clone(), compute_value(ctx, doc, sub, Some(key))?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// System variables recognized verbatim by the evaluator
const REDACT_SENTINELS: [&str; 3] = ["$$KEEP", "$$PRUNE", "$$DESCEND"];

fn resolve_path_expr(ctx: &Context, doc: &Value, expr: &str) -> Result<Value> {
    if expr == "$$ROOT" {
        return Ok(ctx.root().clone());
    }
    if expr == "$$CURRENT" {
        return Ok(doc.clone());
    }
    if REDACT_SENTINELS.contains(&expr) {
        return Ok(Value::text(expr));
    }
    if let Some(rest) = expr.strip_prefix("$$ROOT.") {
        return Ok(resolve(ctx.root(), rest));
    }
    if let Some(rest) = expr.strip_prefix("$$CURRENT.") {
        return Ok(resolve(doc, rest));
    }
    if let Some(rest) = expr.strip_prefix("$$") {
        // user variable, optionally with a trailing path
        let (head, tail) = match rest.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (rest, None),
        };
        return Ok(match ctx.lookup(head) {
            Some(bound) => match tail {
                Some(path) => resolve(bound, path),
                None => bound.clone(),
            },
            None => Value::Undefined,
        });
    }
    Ok(resolve(doc, &expr[1..]))
}
