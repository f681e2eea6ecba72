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

//! Top-level library API
//!
//! Thin facade over [`Query`] and [`Aggregator`]:
//!
//! ```rust
//! use serde_json::json;
//! use siftql::{find, Value};
//!
//! let docs: Vec<Value> = vec![
//!     Value::from(json!({"a": 1})),
//!     Value::from(json!({"a": 2})),
//! ];
//! let count = find(&docs, Value::from(json!({"a": {"$gt": 1}})), None)
//!     .unwrap()
//!     .count()
//!     .unwrap();
//! assert_eq!(count, 1);
//! ```

pub mod cursor;

pub use cursor::Cursor;

use crate::core::error::Result;
use crate::core::value::Value;
use crate::pipeline::Aggregator;
use crate::query::Query;

/// Query `collection`, returning a lazy [`Cursor`]
pub fn find(collection: &[Value], criteria: Value, projection: Option<Value>) -> Result<Cursor> {
    Ok(Query::new(criteria)?.find(collection, projection))
}

/// The complement of [`find`]: every document NOT matching `criteria`
pub fn remove(collection: &[Value], criteria: Value) -> Result<Vec<Value>> {
    Query::new(criteria)?.remove(collection)
}

/// Run an aggregation pipeline over `collection`
pub fn aggregate(collection: &[Value], pipeline: Value) -> Result<Vec<Value>> {
    Aggregator::new(pipeline)?.run(collection)
}
