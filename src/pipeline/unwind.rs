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

//! `$unwind` stage

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::path::{resolve, set_value};
use crate::core::value::Value;

pub(crate) fn unwind_stage(
    _options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    let field = expr
        .as_str()
        .and_then(|s| s.strip_prefix('$'))
        .ok_or_else(|| {
            Error::invalid_argument("$unwind expects a \"$field\" path")
        })?;

    let mut out = Vec::new();
    for doc in collection {
        let value = resolve(&doc, field);
        let Value::Array(items) = value else {
            return Err(Error::invalid_expression(format!(
                "$unwind target '{}' must be an array",
                field
            )));
        };
        for item in items {
            let mut unwound = doc.clone();
            set_value(&mut unwound, field, item);
            out.push(unwound);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(j: serde_json::Value) -> Vec<Value> {
        match Value::from(j) {
            Value::Array(items) => items,
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn test_unwind_emits_one_doc_per_element() {
        let out = unwind_stage(
            &Options::default(),
            docs(json!([{"a": [1, 2, 3]}])),
            &Value::from(json!("$a")),
        )
        .unwrap();
        assert_eq!(out, docs(json!([{"a": 1}, {"a": 2}, {"a": 3}])));
    }

    #[test]
    fn test_unwind_empty_array_drops_doc() {
        let out = unwind_stage(
            &Options::default(),
            docs(json!([{"a": [], "b": 1}])),
            &Value::from(json!("$a")),
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_unwind_non_array_fails() {
        let result = unwind_stage(
            &Options::default(),
            docs(json!([{"a": 5}])),
            &Value::from(json!("$a")),
        );
        assert!(result.is_err());
    }
}
