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

//! Array and Set Expression Tests

use serde_json::json;
use siftql::{compute_value, Context, Options, Value};

fn eval(doc: serde_json::Value, expr: serde_json::Value) -> siftql::Result<Value> {
    let doc = Value::from(doc);
    let options = Options::default();
    let ctx = Context::new(&doc, &options);
    compute_value(&ctx, &doc, &Value::from(expr), None)
}

fn v(j: serde_json::Value) -> Value {
    Value::from(j)
}

// =============================================================================
// Arrays
// =============================================================================

#[test]
fn test_array_elem_at() {
    let doc = json!({"xs": [10, 20, 30]});
    assert_eq!(
        eval(doc.clone(), json!({"$arrayElemAt": ["$xs", 1]})).unwrap(),
        v(json!(20))
    );
    assert_eq!(
        eval(doc.clone(), json!({"$arrayElemAt": ["$xs", -1]})).unwrap(),
        v(json!(30))
    );
    assert_eq!(
        eval(doc, json!({"$arrayElemAt": ["$xs", 9]})).unwrap(),
        Value::Undefined
    );
}

#[test]
fn test_concat_arrays() {
    assert_eq!(
        eval(json!({"a": [1]}), json!({"$concatArrays": ["$a", [2, 3]]})).unwrap(),
        v(json!([1, 2, 3]))
    );
    assert_eq!(
        eval(json!({}), json!({"$concatArrays": [[1], "$missing"]})).unwrap(),
        Value::Null
    );
}

#[test]
fn test_filter() {
    let expr = json!({"$filter": {
        "input": [1, 5, 10, 2],
        "as": "n",
        "cond": {"$gt": ["$$n", 3]}
    }});
    assert_eq!(eval(json!({}), expr).unwrap(), v(json!([5, 10])));
}

#[test]
fn test_index_of_array() {
    assert_eq!(
        eval(json!({}), json!({"$indexOfArray": [["a", "b", "c"], "b"]})).unwrap(),
        v(json!(1))
    );
    assert_eq!(
        eval(json!({}), json!({"$indexOfArray": [["a", "b", "a"], "a", 1]})).unwrap(),
        v(json!(2))
    );
    assert_eq!(
        eval(json!({}), json!({"$indexOfArray": [["a"], "z"]})).unwrap(),
        v(json!(-1))
    );
    assert_eq!(
        eval(json!({}), json!({"$indexOfArray": [null, "z"]})).unwrap(),
        Value::Null
    );
}

#[test]
fn test_is_array() {
    assert_eq!(
        eval(json!({"a": [1]}), json!({"$isArray": ["$a"]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(
        eval(json!({"a": "no"}), json!({"$isArray": ["$a"]})).unwrap(),
        v(json!(false))
    );
}

#[test]
fn test_map() {
    let expr = json!({"$map": {
        "input": "$xs",
        "as": "x",
        "in": {"$multiply": ["$$x", 2]}
    }});
    assert_eq!(
        eval(json!({"xs": [1, 2, 3]}), expr).unwrap(),
        v(json!([2, 4, 6]))
    );
}

#[test]
fn test_map_default_binding() {
    let expr = json!({"$map": {
        "input": [1, 2],
        "in": {"$add": ["$$this", 10]}
    }});
    assert_eq!(eval(json!({}), expr).unwrap(), v(json!([11, 12])));
}

#[test]
fn test_range() {
    assert_eq!(
        eval(json!({}), json!({"$range": [0, 5]})).unwrap(),
        v(json!([0, 1, 2, 3, 4]))
    );
    assert_eq!(
        eval(json!({}), json!({"$range": [10, 0, -3]})).unwrap(),
        v(json!([10, 7, 4, 1]))
    );
    assert_eq!(eval(json!({}), json!({"$range": [3, 3]})).unwrap(), v(json!([])));
    assert!(eval(json!({}), json!({"$range": [0, 5, 0]})).is_err());
}

#[test]
fn test_reduce() {
    let expr = json!({"$reduce": {
        "input": ["a", "b", "c"],
        "initialValue": "",
        "in": {"$concat": ["$$value", "$$this"]}
    }});
    assert_eq!(eval(json!({}), expr).unwrap(), v(json!("abc")));
}

#[test]
fn test_reverse_and_size() {
    assert_eq!(
        eval(json!({"a": [1, 2, 3]}), json!({"$reverseArray": "$a"})).unwrap(),
        v(json!([3, 2, 1]))
    );
    assert_eq!(eval(json!({"a": [1, 2]}), json!({"$size": "$a"})).unwrap(), v(json!(2)));
    assert!(eval(json!({"a": 5}), json!({"$size": "$a"})).is_err());
}

#[test]
fn test_slice_aggregation() {
    let doc = json!({"xs": [1, 2, 3, 4, 5]});
    assert_eq!(
        eval(doc.clone(), json!({"$slice": ["$xs", 2]})).unwrap(),
        v(json!([1, 2]))
    );
    assert_eq!(
        eval(doc.clone(), json!({"$slice": ["$xs", -2]})).unwrap(),
        v(json!([4, 5]))
    );
    assert_eq!(
        eval(doc.clone(), json!({"$slice": ["$xs", 1, 2]})).unwrap(),
        v(json!([2, 3]))
    );
    assert_eq!(
        eval(doc, json!({"$slice": ["$xs", -3, 2]})).unwrap(),
        v(json!([3, 4]))
    );
}

#[test]
fn test_zip() {
    assert_eq!(
        eval(json!({}), json!({"$zip": {"inputs": [[1, 2], ["a", "b"]]}})).unwrap(),
        v(json!([[1, "a"], [2, "b"]]))
    );
    // shortest length wins by default
    assert_eq!(
        eval(json!({}), json!({"$zip": {"inputs": [[1, 2, 3], ["a"]]}})).unwrap(),
        v(json!([[1, "a"]]))
    );
    // longest length with defaults
    let expr = json!({"$zip": {
        "inputs": [[1, 2, 3], ["a"]],
        "useLongestLength": true,
        "defaults": [0, "z"]
    }});
    assert_eq!(
        eval(json!({}), expr).unwrap(),
        v(json!([[1, "a"], [2, "z"], [3, "z"]]))
    );
    // defaults require the flag
    let expr = json!({"$zip": {"inputs": [[1]], "defaults": [0]}});
    assert!(eval(json!({}), expr).is_err());
}

// =============================================================================
// Sets
// =============================================================================

#[test]
fn test_set_equals() {
    assert_eq!(
        eval(json!({}), json!({"$setEquals": [[1, 2, 2], [2, 1]]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(
        eval(json!({}), json!({"$setEquals": [[1, 2], [1, 3]]})).unwrap(),
        v(json!(false))
    );
}

#[test]
fn test_set_intersection_union_difference() {
    assert_eq!(
        eval(json!({}), json!({"$setIntersection": [[1, 2, 3], [3, 2, 5]]})).unwrap(),
        v(json!([2, 3]))
    );
    assert_eq!(
        eval(json!({}), json!({"$setUnion": [[1, 2], [2, 3]]})).unwrap(),
        v(json!([1, 2, 3]))
    );
    assert_eq!(
        eval(json!({}), json!({"$setDifference": [[1, 2, 3], [2]]})).unwrap(),
        v(json!([1, 3]))
    );
}

#[test]
fn test_set_is_subset() {
    assert_eq!(
        eval(json!({}), json!({"$setIsSubset": [[1, 2], [1, 2, 3]]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(
        eval(json!({}), json!({"$setIsSubset": [[1, 9], [1, 2, 3]]})).unwrap(),
        v(json!(false))
    );
}

#[test]
fn test_element_truth_operators() {
    assert_eq!(
        eval(json!({}), json!({"$allElementsTrue": [[1, true, "x"]]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(
        eval(json!({}), json!({"$allElementsTrue": [[1, 0]]})).unwrap(),
        v(json!(false))
    );
    assert_eq!(
        eval(json!({}), json!({"$anyElementTrue": [[0, "", 2]]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(
        eval(json!({}), json!({"$anyElementTrue": [[0, ""]]})).unwrap(),
        v(json!(false))
    );
}

#[test]
fn test_sets_collapse_numeric_representations() {
    assert_eq!(
        eval(json!({}), json!({"$setUnion": [[1], [1.0]]})).unwrap(),
        v(json!([1]))
    );
}
