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

//! Cursor over query results
//!
//! A cursor accumulates `sort`, `skip`, and `limit` modifiers, then
//! materializes lazily: the source is filtered by the compiled query and
//! the modifiers run as an internal pipeline in the fixed order
//! `[$sort, $skip, $limit, $project]` regardless of call order.

use crate::core::error::Result;
use crate::core::value::{Document, Value};
use crate::eval::Context;
use crate::operators::registry::global_registry;
use crate::pipeline::Aggregator;
use crate::query::Query;

/// Lazily-materialized view over the documents matching a query
pub struct Cursor {
    source: Vec<Value>,
    query: Query,
    projection: Option<Value>,
    sort: Option<Value>,
    skip: Option<usize>,
    limit: Option<usize>,
    result: Option<Vec<Value>>,
    position: usize,
}

impl Cursor {
    pub(crate) fn new(source: Vec<Value>, query: Query, projection: Option<Value>) -> Self {
        Cursor {
            source,
            query,
            projection,
            sort: None,
            skip: None,
            limit: None,
            result: None,
            position: 0,
        }
    }

    /// Sort the result set; `spec` is a `$sort` stage operand
    pub fn sort(mut self, spec: Value) -> Self {
        self.sort = Some(spec);
        self.result = None;
        self
    }

    /// Skip the first `n` results
    pub fn skip(mut self, n: usize) -> Self {
        self.skip = Some(n);
        self.result = None;
        self
    }

    /// Limit the result set to `n` documents
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self.result = None;
        self
    }

    fn single(op: &str, operand: Value) -> Value {
        let mut stage = Document::new();
        stage.insert(op.to_string(), operand);
        Value::Object(stage)
    }

    fn materialize(&mut self) -> Result<&[Value]> {
        if self.result.is_none() {
            let mut filtered = Vec::new();
            for doc in &self.source {
                if self.query.test(doc)? {
                    filtered.push(doc.clone());
                }
            }

            // fixed internal stage order, independent of call order
            let mut stages = Vec::new();
            if let Some(sort) = &self.sort {
                stages.push(Self::single("$sort", sort.clone()));
            }
            if let Some(skip) = self.skip {
                stages.push(Self::single("$skip", Value::Int(skip as i64)));
            }
            if let Some(limit) = self.limit {
                stages.push(Self::single("$limit", Value::Int(limit as i64)));
            }
            if let Some(projection) = &self.projection {
                stages.push(Self::single("$project", projection.clone()));
            }

            let result = if stages.is_empty() {
                filtered
            } else {
                let aggregator = Aggregator::with_options(
                    Value::Array(stages),
                    self.query.options().clone(),
                )?;
                aggregator.run(&filtered)?
            };
            self.result = Some(result);
        }
        Ok(self.result.as_deref().unwrap())
    }

    /// Every matching document
    pub fn all(&mut self) -> Result<Vec<Value>> {
        Ok(self.materialize()?.to_vec())
    }

    /// Number of matching documents
    pub fn count(&mut self) -> Result<usize> {
        Ok(self.materialize()?.len())
    }

    /// First matching document
    pub fn first(&mut self) -> Result<Option<Value>> {
        Ok(self.materialize()?.first().cloned())
    }

    /// Last matching document
    pub fn last(&mut self) -> Result<Option<Value>> {
        Ok(self.materialize()?.last().cloned())
    }

    /// True when another document is available
    pub fn has_next(&mut self) -> Result<bool> {
        let position = self.position;
        Ok(position < self.materialize()?.len())
    }

    /// Advance and return the next document
    pub fn next(&mut self) -> Result<Option<Value>> {
        let position = self.position;
        let result = self.materialize()?;
        if position < result.len() {
            let doc = result[position].clone();
            self.position += 1;
            Ok(Some(doc))
        } else {
            Ok(None)
        }
    }

    /// Map every matching document through `f`
    pub fn map<T>(&mut self, mut f: impl FnMut(&Value) -> T) -> Result<Vec<T>> {
        Ok(self.materialize()?.iter().map(&mut f).collect())
    }

    /// Visit every matching document
    pub fn for_each(&mut self, mut f: impl FnMut(&Value)) -> Result<()> {
        self.materialize()?.iter().for_each(&mut f);
        Ok(())
    }

    /// Smallest value of `expr` across matching documents
    pub fn min(&mut self, expr: &Value) -> Result<Value> {
        self.extremum("$min", expr)
    }

    /// Largest value of `expr` across matching documents
    pub fn max(&mut self, expr: &Value) -> Result<Value> {
        self.extremum("$max", expr)
    }

    fn extremum(&mut self, op: &str, expr: &Value) -> Result<Value> {
        let options = self.query.options().clone();
        let docs = self.materialize()?.to_vec();
        let unit = Value::Null;
        let ctx = Context::new(&unit, &options);
        let handler = global_registry().group_op(op).expect("built-in accumulator");
        handler(&ctx, &docs, Some(expr))
    }
}
