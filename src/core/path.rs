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

//! Field path resolution
//!
//! Dot-separated paths traverse documents. A segment of digits indexes an
//! array; any other segment is a map key. When a non-index segment meets an
//! array, resolution broadcasts into every element, which is what gives the
//! matcher its array-traversal semantics.

use super::value::{Document, Value};

/// Split a path into segments
fn segments(path: &str) -> Vec<&str> {
    path.split('.').collect()
}

/// True when the segment addresses an array index
fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Resolve `path` against `obj`, returning the value or `Undefined`
pub fn resolve(obj: &Value, path: &str) -> Value {
    resolve_segments(obj, &segments(path), false)
}

fn resolve_segments(obj: &Value, names: &[&str], deep: bool) -> Value {
    let mut current = obj;
    for (i, name) in names.iter().enumerate() {
        match current {
            Value::Array(items) => {
                if is_index(name) {
                    let idx: usize = name.parse().unwrap_or(usize::MAX);
                    match items.get(idx) {
                        Some(item) => current = item,
                        None => return Value::Undefined,
                    }
                } else {
                    // already broadcasting: stop to avoid a double broadcast
                    // on consecutive array-valued keys
                    if i == 0 && deep {
                        return current.clone();
                    }
                    let results: Vec<Value> = items
                        .iter()
                        .map(|item| resolve_segments(item, &names[i..], true))
                        .collect();
                    if results.len() == 1 {
                        return results.into_iter().next().unwrap();
                    }
                    return Value::Array(results);
                }
            }
            Value::Object(doc) => match doc.get(*name) {
                Some(v) => current = v,
                None => return Value::Undefined,
            },
            _ => return Value::Undefined,
        }
    }
    current.clone()
}

/// Build the minimal object subtree containing the value at `path`
///
/// Nesting is preserved, which is what `$project` uses to rebuild
/// sub-documents. Any missing intermediate collapses the whole result to
/// `Undefined`.
pub fn resolve_obj(obj: &Value, path: &str) -> Value {
    resolve_obj_segments(obj, &segments(path))
}

fn resolve_obj_segments(obj: &Value, names: &[&str]) -> Value {
    let key = names[0];
    let has_next = names.len() > 1;

    match obj {
        Value::Array(items) => {
            if is_index(key) {
                let idx: usize = key.parse().unwrap_or(usize::MAX);
                let mut found = match items.get(idx) {
                    Some(item) => item.clone(),
                    None => return Value::Undefined,
                };
                if has_next {
                    found = resolve_obj_segments(&found, &names[1..]);
                    if found.is_undefined() {
                        return Value::Undefined;
                    }
                }
                Value::Array(vec![found])
            } else {
                let results: Vec<Value> = items
                    .iter()
                    .map(|item| resolve_obj_segments(item, names))
                    .filter(|v| !v.is_undefined())
                    .collect();
                if results.is_empty() {
                    return Value::Undefined;
                }
                Value::Array(results)
            }
        }
        Value::Object(doc) => {
            let mut found = match doc.get(key) {
                Some(v) => v.clone(),
                None => return Value::Undefined,
            };
            if has_next {
                found = resolve_obj_segments(&found, &names[1..]);
                if found.is_undefined() {
                    return Value::Undefined;
                }
            }
            let mut result = Document::new();
            result.insert(key.to_string(), found);
            Value::Object(result)
        }
        _ => Value::Undefined,
    }
}

/// Walk to the terminal segment of `path` and call `f(container, last_key)`
///
/// With `force`, missing intermediate maps are created. Non-index segments
/// over arrays broadcast into every element.
pub fn traverse<F>(obj: &mut Value, path: &str, f: &mut F, force: bool)
where
    F: FnMut(&mut Value, &str),
{
    traverse_segments(obj, &segments(path), f, force)
}

fn traverse_segments<F>(obj: &mut Value, names: &[&str], f: &mut F, force: bool)
where
    F: FnMut(&mut Value, &str),
{
    let key = names[0];
    let has_next = names.len() > 1;

    if let Value::Array(items) = obj {
        if !is_index(key) {
            for item in items.iter_mut() {
                traverse_segments(item, names, f, force);
            }
            return;
        }
    }

    if !has_next {
        f(obj, key);
        return;
    }

    match obj {
        Value::Object(doc) => {
            if force && !doc.contains_key(key) {
                doc.insert(key.to_string(), Value::object());
            }
            if let Some(next) = doc.get_mut(key) {
                traverse_segments(next, &names[1..], f, force);
            }
        }
        Value::Array(items) => {
            let idx: usize = key.parse().unwrap_or(usize::MAX);
            if let Some(next) = items.get_mut(idx) {
                traverse_segments(next, &names[1..], f, force);
            }
        }
        _ => {}
    }
}

/// Set the value at `path`, creating intermediate maps as needed
///
/// A path broadcasting over an array writes into every element.
pub fn set_value(obj: &mut Value, path: &str, value: Value) {
    traverse(
        obj,
        path,
        &mut |container, key| {
            let v = value.clone();
            match container {
                Value::Object(doc) => {
                    doc.insert(key.to_string(), v);
                }
                Value::Array(items) => {
                    let idx: usize = key.parse().unwrap_or(usize::MAX);
                    if idx < items.len() {
                        items[idx] = v;
                    } else if idx == items.len() {
                        items.push(v);
                    }
                }
                _ => {}
            }
        },
        true,
    );
}

/// Remove the value at `path`; an array-index terminal segment splices
pub fn remove_value(obj: &mut Value, path: &str) {
    traverse(
        obj,
        path,
        &mut |container, key| match container {
            Value::Object(doc) => {
                doc.shift_remove(key);
            }
            Value::Array(items) => {
                let idx: usize = key.parse().unwrap_or(usize::MAX);
                if idx < items.len() {
                    items.remove(idx);
                }
            }
            _ => {}
        },
        false,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    #[test]
    fn test_resolve_simple() {
        let doc = v(json!({"a": {"b": {"c": 7}}}));
        assert_eq!(resolve(&doc, "a.b.c"), Value::Int(7));
        assert_eq!(resolve(&doc, "a.b"), v(json!({"c": 7})));
        assert_eq!(resolve(&doc, "a.x"), Value::Undefined);
        assert_eq!(resolve(&doc, "a.b.c.d"), Value::Undefined);
    }

    #[test]
    fn test_resolve_array_index() {
        let doc = v(json!({"xs": [10, 20, 30]}));
        assert_eq!(resolve(&doc, "xs.1"), Value::Int(20));
        assert_eq!(resolve(&doc, "xs.5"), Value::Undefined);
    }

    #[test]
    fn test_resolve_broadcast() {
        let doc = v(json!({"items": [{"p": 1}, {"p": 2}]}));
        assert_eq!(resolve(&doc, "items.p"), v(json!([1, 2])));
    }

    #[test]
    fn test_resolve_broadcast_unit_unwrap() {
        let doc = v(json!({"items": [{"p": 5}]}));
        assert_eq!(resolve(&doc, "items.p"), Value::Int(5));
    }

    #[test]
    fn test_resolve_no_double_broadcast() {
        // inner arrays are returned as-is rather than broadcast again
        let doc = v(json!({"a": [{"b": [1, 2]}, {"b": [3]}]}));
        assert_eq!(resolve(&doc, "a.b"), v(json!([[1, 2], [3]])));
    }

    #[test]
    fn test_resolve_obj_preserves_nesting() {
        let doc = v(json!({"a": {"b": 1, "c": 2}, "d": 3}));
        assert_eq!(resolve_obj(&doc, "a.b"), v(json!({"a": {"b": 1}})));
        assert_eq!(resolve_obj(&doc, "a.x"), Value::Undefined);
    }

    #[test]
    fn test_resolve_obj_arrays() {
        let doc = v(json!({"xs": [{"p": 1}, {"q": 2}]}));
        assert_eq!(resolve_obj(&doc, "xs.p"), v(json!({"xs": [{"p": 1}]})));
        let doc = v(json!({"xs": [5, 6]}));
        assert_eq!(resolve_obj(&doc, "xs.1"), v(json!({"xs": [6]})));
    }

    #[test]
    fn test_set_value_forces_path() {
        let mut doc = v(json!({}));
        set_value(&mut doc, "a.b.c", Value::Int(1));
        assert_eq!(doc, v(json!({"a": {"b": {"c": 1}}})));
    }

    #[test]
    fn test_set_value_overwrites() {
        let mut doc = v(json!({"a": {"b": 0}}));
        set_value(&mut doc, "a.b", Value::Int(9));
        assert_eq!(doc, v(json!({"a": {"b": 9}})));
    }

    #[test]
    fn test_remove_value_splices_arrays() {
        let mut doc = v(json!({"xs": [1, 2, 3]}));
        remove_value(&mut doc, "xs.1");
        assert_eq!(doc, v(json!({"xs": [1, 3]})));

        let mut doc = v(json!({"a": {"b": 1}}));
        remove_value(&mut doc, "a.b");
        assert_eq!(doc, v(json!({"a": {}})));
    }
}
