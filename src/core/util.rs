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

//! Collection utilities shared by the operator tables
//!
//! Set identity goes through [`Value::canonical_key`], so two structurally
//! equal values always collapse to one member regardless of their numeric
//! representation.

use rustc_hash::{FxHashMap, FxHashSet};

use super::value::Value;

/// Remove structural duplicates, keeping first occurrences in order
pub fn unique(values: &[Value]) -> Vec<Value> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for v in values {
        if seen.insert(v.canonical_key()) {
            out.push(v.clone());
        }
    }
    out
}

/// Union of two arrays as sets, left operand's order first
pub fn union(a: &[Value], b: &[Value]) -> Vec<Value> {
    let mut combined: Vec<Value> = a.to_vec();
    combined.extend_from_slice(b);
    unique(&combined)
}

/// Intersection of two arrays as sets, in left operand order
pub fn intersection(a: &[Value], b: &[Value]) -> Vec<Value> {
    let keys: FxHashSet<String> = b.iter().map(Value::canonical_key).collect();
    unique(a)
        .into_iter()
        .filter(|v| keys.contains(&v.canonical_key()))
        .collect()
}

/// True when every element of `a` appears in `b`
pub fn is_subset(a: &[Value], b: &[Value]) -> bool {
    let keys: FxHashSet<String> = b.iter().map(Value::canonical_key).collect();
    a.iter().all(|v| keys.contains(&v.canonical_key()))
}

/// Flatten nested arrays to `depth` levels; `-1` means unbounded
pub fn flatten(values: &[Value], depth: i32) -> Vec<Value> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Value::Array(inner) if depth != 0 => {
                out.extend(flatten(inner, if depth < 0 { depth } else { depth - 1 }));
            }
            _ => out.push(v.clone()),
        }
    }
    out
}

/// Standard deviation over the numeric members of `dataset`
///
/// The mean always divides by `N`; `sampled` applies Bessel's correction to
/// the variance denominator only. Returns `None` for an empty (or, when
/// sampled, single-element) dataset.
pub fn stddev(dataset: &[f64], sampled: bool) -> Option<f64> {
    let n = dataset.len();
    if n == 0 || (sampled && n < 2) {
        return None;
    }
    let mean = dataset.iter().sum::<f64>() / n as f64;
    let divisor = if sampled { n - 1 } else { n } as f64;
    let variance = dataset.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / divisor;
    Some(variance.sqrt())
}

/// A partitioning of values: distinct keys paired with their groups
///
/// `keys[i]` is the partition key for `groups[i]`. Within a group, input
/// order is preserved, which `$sort` relies on for stability.
#[derive(Debug, Default)]
pub struct Grouping {
    pub keys: Vec<Value>,
    pub groups: Vec<Vec<Value>>,
}

/// Partition `values` by the computed key, keeping first-seen key order
pub fn group_by<F, E>(values: &[Value], mut key_fn: F) -> Result<Grouping, E>
where
    F: FnMut(&Value) -> Result<Value, E>,
{
    let mut grouping = Grouping::default();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for v in values {
        let key = key_fn(v)?;
        let hash = key.canonical_key();
        let slot = *index.entry(hash).or_insert_with(|| {
            grouping.keys.push(key);
            grouping.groups.push(Vec::new());
            grouping.groups.len() - 1
        });
        grouping.groups[slot].push(v.clone());
    }
    Ok(grouping)
}
