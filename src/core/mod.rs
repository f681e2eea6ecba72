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

//! Core types for SiftQL
//!
//! - [`Value`] / [`Document`] - the document model
//! - [`Error`] / [`Result`] - the unified error type
//! - [`path`] - dot-path resolution with array broadcast
//! - [`util`] - set operations, flatten, stddev, group-by

pub mod error;
pub mod options;
pub mod path;
pub mod util;
pub mod value;

pub use error::{Error, Result};
pub use options::Options;
pub use value::{Document, NativePredicate, Value, ValueKind, ValueRegex};
