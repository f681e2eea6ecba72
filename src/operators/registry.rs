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

//! Operator Registry
//!
//! One global registry holds the per-class operator tables. Built-ins are
//! installed at first access; [`add_operators`] extends a class at
//! configuration time.

use std::sync::{Arc, OnceLock, RwLock};

use rustc_hash::FxHashMap;

use crate::core::error::{Error, Result};
use crate::core::path::resolve;

use super::{
    AggregateHandler, CustomOperator, GroupHandler, OperatorClass, PipelineHandler,
    ProjectionHandler, QueryHandler,
};

/// Global operator registry instance
static GLOBAL_REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();

/// Get the global operator registry
#[inline]
pub fn global_registry() -> &'static OperatorRegistry {
    GLOBAL_REGISTRY.get_or_init(OperatorRegistry::new)
}

/// Registry of operators keyed by class and name
pub struct OperatorRegistry {
    aggregate: RwLock<FxHashMap<String, AggregateHandler>>,
    group: RwLock<FxHashMap<String, GroupHandler>>,
    query: RwLock<FxHashMap<String, QueryHandler>>,
    projection: RwLock<FxHashMap<String, ProjectionHandler>>,
    pipeline: RwLock<FxHashMap<String, PipelineHandler>>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorRegistry {
    /// Create a registry with every built-in operator installed
    pub fn new() -> Self {
        let mut aggregate: FxHashMap<String, AggregateHandler> = FxHashMap::default();
        for table in [
            super::arithmetic::OPERATORS,
            super::array::OPERATORS,
            super::boolean::OPERATORS,
            super::comparison::OPERATORS,
            super::conditional::OPERATORS,
            super::date::OPERATORS,
            super::set::OPERATORS,
            super::string::OPERATORS,
            super::variable::OPERATORS,
        ] {
            for (name, f) in table {
                aggregate.insert((*name).to_string(), Arc::new(*f) as AggregateHandler);
            }
        }

        let mut group: FxHashMap<String, GroupHandler> = FxHashMap::default();
        for (name, f) in super::group::OPERATORS {
            group.insert((*name).to_string(), Arc::new(*f) as GroupHandler);
        }

        let mut query: FxHashMap<String, QueryHandler> = FxHashMap::default();
        for (name, f) in super::query::OPERATORS {
            query.insert((*name).to_string(), Arc::new(*f) as QueryHandler);
        }

        let mut projection: FxHashMap<String, ProjectionHandler> = FxHashMap::default();
        for (name, f) in super::projection::OPERATORS {
            projection.insert((*name).to_string(), Arc::new(*f) as ProjectionHandler);
        }

        let mut pipeline: FxHashMap<String, PipelineHandler> = FxHashMap::default();
        for (name, f) in crate::pipeline::OPERATORS {
            pipeline.insert((*name).to_string(), Arc::new(*f) as PipelineHandler);
        }

        OperatorRegistry {
            aggregate: RwLock::new(aggregate),
            group: RwLock::new(group),
            query: RwLock::new(query),
            projection: RwLock::new(projection),
            pipeline: RwLock::new(pipeline),
        }
    }

    /// Look up an aggregate (expression) operator
    pub(crate) fn aggregate_op(&self, name: &str) -> Option<AggregateHandler> {
        self.aggregate.read().unwrap().get(name).cloned()
    }

    /// Look up a group accumulator
    pub(crate) fn group_op(&self, name: &str) -> Option<GroupHandler> {
        self.group.read().unwrap().get(name).cloned()
    }

    /// Look up a query operator
    pub(crate) fn query_op(&self, name: &str) -> Option<QueryHandler> {
        self.query.read().unwrap().get(name).cloned()
    }

    /// Look up a projection operator
    pub(crate) fn projection_op(&self, name: &str) -> Option<ProjectionHandler> {
        self.projection.read().unwrap().get(name).cloned()
    }

    /// Look up a pipeline stage operator
    pub(crate) fn pipeline_op(&self, name: &str) -> Option<PipelineHandler> {
        self.pipeline.read().unwrap().get(name).cloned()
    }

    pub(crate) fn has_aggregate(&self, name: &str) -> bool {
        self.aggregate.read().unwrap().contains_key(name)
    }

    pub(crate) fn has_group(&self, name: &str) -> bool {
        self.group.read().unwrap().contains_key(name)
    }

    pub(crate) fn has_projection(&self, name: &str) -> bool {
        self.projection.read().unwrap().contains_key(name)
    }

    fn contains(&self, class: OperatorClass, name: &str) -> bool {
        match class {
            OperatorClass::Aggregate => self.aggregate.read().unwrap().contains_key(name),
            OperatorClass::Group => self.has_group(name),
            OperatorClass::Query => self.query.read().unwrap().contains_key(name),
            OperatorClass::Projection => self.has_projection(name),
            OperatorClass::Pipeline => self.pipeline.read().unwrap().contains_key(name),
        }
    }

    fn install(&self, name: String, op: CustomOperator) {
        match op {
            CustomOperator::Query(f) => {
                let wrapped: QueryHandler =
                    Arc::new(move |args| f(args.field, args.lhs, args.operand));
                self.query.write().unwrap().insert(name, wrapped);
            }
            CustomOperator::Projection(f) => {
                // resolve the field before handing over
                let wrapped: ProjectionHandler = Arc::new(move |_ctx, doc, field, operand| {
                    let lhs = resolve(doc, field);
                    f(field, &lhs, operand)
                });
                self.projection.write().unwrap().insert(name, wrapped);
            }
            CustomOperator::Aggregate(f) => {
                let wrapped: AggregateHandler =
                    Arc::new(move |ctx, doc, expr| f(ctx, doc, expr));
                self.aggregate.write().unwrap().insert(name, wrapped);
            }
            CustomOperator::Group(f) => {
                let wrapped: GroupHandler =
                    Arc::new(move |ctx, coll, expr| f(ctx, coll, expr));
                self.group.write().unwrap().insert(name, wrapped);
            }
            CustomOperator::Pipeline(f) => {
                let wrapped: PipelineHandler =
                    Arc::new(move |options, coll, expr| f(options, coll, expr));
                self.pipeline.write().unwrap().insert(name, wrapped);
            }
        }
    }
}

/// True when `name` is a legal operator name: `$` followed by word chars
fn valid_operator_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('$') else {
        return false;
    };
    !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Register user-supplied operators in `class`
///
/// The factory returns `(name, operator)` pairs. Names must match
/// `^\$\w+$`, each operator's variant must agree with `class`, and names
/// must not collide with an existing operator of the class.
pub fn add_operators<F>(class: OperatorClass, factory: F) -> Result<()>
where
    F: FnOnce() -> Vec<(String, CustomOperator)>,
{
    let registry = global_registry();
    let ops = factory();

    // validate everything before installing anything
    for (name, op) in &ops {
        if !valid_operator_name(name) {
            return Err(Error::InvalidOperatorName(name.clone()));
        }
        if op.class() != class {
            return Err(Error::invalid_argument(format!(
                "operator '{}' does not belong to class {}",
                name, class
            )));
        }
        if registry.contains(class, name) {
            return Err(Error::OperatorExists {
                class: class.to_string(),
                name: name.clone(),
            });
        }
    }

    for (name, op) in ops {
        registry.install(name, op);
    }
    Ok(())
}
