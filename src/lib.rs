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

//! # SiftQL - MongoDB-style queries over in-memory documents
//!
//! SiftQL evaluates MongoDB-style queries and aggregation pipelines over an
//! in-memory sequence of JSON-shaped documents, with no database backend.
//! It speaks the declarative query language MongoDB clients emit: field
//! predicates, compound logical operators, projections, and a staged
//! aggregation pipeline with roughly a hundred operators.
//!
//! ## Key Features
//!
//! - **Query matcher** - criteria documents compiled once into per-field
//!   predicates with MongoDB array-traversal semantics
//! - **Aggregation pipeline** - `$match`, `$project`, `$group`, `$sort`,
//!   `$unwind`, `$redact`, `$replaceRoot`, `$addFields`, `$sortByCount`,
//!   `$sample`, `$count`, `$limit`, `$skip`
//! - **Expression evaluator** - arithmetic, string, date, array, set,
//!   conditional, and variable-binding operators over arbitrary documents
//! - **Lazy cursors** - `skip`/`limit`/`sort` modifiers materialized on
//!   first access
//! - **Extensible operator registry** - register custom operators in any of
//!   the five operator classes
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use siftql::{aggregate, find, Value};
//!
//! let docs: Vec<Value> = [
//!     json!({"name": "Alice", "age": 30, "tags": ["admin", "dev"]}),
//!     json!({"name": "Bob", "age": 25, "tags": ["dev"]}),
//! ]
//! .into_iter()
//! .map(Value::from)
//! .collect();
//!
//! // array-traversal match: tags contains "admin"
//! let admins = find(&docs, Value::from(json!({"tags": "admin"})), None)
//!     .unwrap()
//!     .all()
//!     .unwrap();
//! assert_eq!(admins.len(), 1);
//!
//! // group with accumulators
//! let stats = aggregate(
//!     &docs,
//!     Value::from(json!([{"$group": {"_id": null, "avgAge": {"$avg": "$age"}}}])),
//! )
//! .unwrap();
//! assert_eq!(stats[0].get("avgAge"), &Value::Float(27.5));
//! ```
//!
//! ## Modules
//!
//! - [`core`] - document model ([`Value`], [`Document`]), errors, paths
//! - [`eval`] - the expression evaluator
//! - [`operators`] - the five operator classes and the global registry
//! - [`pipeline`] - the stage runtime ([`Aggregator`])
//! - [`query`] - criteria compilation ([`Query`])
//! - [`api`] - `find`/`remove`/`aggregate` and the [`Cursor`]

pub mod api;
pub mod core;
pub mod eval;
pub mod operators;
pub mod pipeline;
pub mod query;

// Re-export main types for convenience
pub use crate::core::{Document, Error, NativePredicate, Result, Value, ValueKind, ValueRegex};
pub use api::{aggregate, find, remove, Cursor};
pub use crate::core::options::Options;
pub use eval::{compute_value, Context};
pub use operators::{add_operators, CustomOperator, OperatorClass};
pub use pipeline::Aggregator;
pub use query::Query;
