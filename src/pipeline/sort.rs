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

//! `$sort` stage
//!
//! Sort keys are applied in reverse declaration order, one stable pass per
//! key: documents are partitioned by the resolved key value, the distinct
//! keys are ordered, and partitions are concatenated. Ties keep their
//! relative input order, which makes the whole sort stable and the first
//! declared key dominant.

use crate::core::error::{Error, Result};
use crate::core::options::Options;
use crate::core::path::resolve;
use crate::core::util::group_by;
use crate::core::value::Value;

pub(crate) fn sort_stage(
    _options: &Options,
    collection: Vec<Value>,
    expr: &Value,
) -> Result<Vec<Value>> {
    let Some(spec) = expr.as_object() else {
        return Err(Error::invalid_argument(
            "$sort expects a document of sort keys",
        ));
    };

    let mut current = collection;
    for (key, direction) in spec.iter().rev() {
        let direction = match direction.as_i64() {
            Some(1) => 1,
            Some(-1) => -1,
            _ => {
                return Err(Error::invalid_argument(
                    "$sort direction must be 1 or -1",
                ))
            }
        };

        let grouping = group_by(&current, |doc| Ok::<_, Error>(resolve(doc, key)))?;
        let mut order: Vec<usize> = (0..grouping.keys.len()).collect();
        order.sort_by(|&a, &b| grouping.keys[a].cmp_total(&grouping.keys[b]));
        if direction == -1 {
            order.reverse();
        }

        current = Vec::with_capacity(grouping.groups.iter().map(Vec::len).sum());
        for i in order {
            current.extend(grouping.groups[i].iter().cloned());
        }
    }
    Ok(current)
}
