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

//! Engine options
//!
//! A configuration record passed into [`crate::Query`] and
//! [`crate::Aggregator`] rather than a process-wide setting.

/// Options for query and pipeline evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Name of the identity field used by `$group`, `$project`, and cursor
    /// identity logic
    pub id_key: String,
}

impl Options {
    /// Options with a custom identity field
    pub fn with_id_key(id_key: impl Into<String>) -> Self {
        Options {
            id_key: id_key.into(),
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            id_key: "_id".to_string(),
        }
    }
}
