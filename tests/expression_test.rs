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

//! Expression Evaluator Tests
//!
//! Tests arithmetic, string, boolean, comparison, conditional, and
//! variable-binding expression operators.

use serde_json::json;
use siftql::{compute_value, Context, Error, Options, Value};

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
// Arithmetic
// =============================================================================

#[test]
fn test_add_multiply_subtract() {
    assert_eq!(eval(json!({}), json!({"$add": [1, 2, 3]})).unwrap(), v(json!(6)));
    assert_eq!(
        eval(json!({"a": 4}), json!({"$multiply": ["$a", 2.5]})).unwrap(),
        v(json!(10))
    );
    assert_eq!(
        eval(json!({}), json!({"$subtract": [10, 3]})).unwrap(),
        v(json!(7))
    );
}

#[test]
fn test_arithmetic_soft_null() {
    assert_eq!(eval(json!({}), json!({"$add": [1, null]})).unwrap(), Value::Null);
    assert_eq!(
        eval(json!({}), json!({"$subtract": ["$missing", 1]})).unwrap(),
        Value::Null
    );
    assert_eq!(eval(json!({}), json!({"$abs": null})).unwrap(), Value::Null);
}

#[test]
fn test_arithmetic_type_error() {
    let err = eval(json!({}), json!({"$add": [1, "two"]})).unwrap_err();
    assert!(matches!(err, Error::NonNumericOperand { .. }));
}

#[test]
fn test_nan_propagates() {
    let result = eval(json!({}), json!({"$ln": -1})).unwrap();
    assert_eq!(result, Value::Float(f64::NAN));
    let result = eval(json!({}), json!({"$add": [{"$ln": -1}, 5]})).unwrap();
    assert_eq!(result, Value::Float(f64::NAN));
}

#[test]
fn test_divide_and_mod() {
    assert_eq!(eval(json!({}), json!({"$divide": [7, 2]})).unwrap(), v(json!(3.5)));
    assert_eq!(eval(json!({}), json!({"$mod": [7, 3]})).unwrap(), v(json!(1)));
}

#[test]
fn test_pow_sqrt_rules() {
    assert_eq!(eval(json!({}), json!({"$pow": [2, 10]})).unwrap(), v(json!(1024)));
    assert!(eval(json!({}), json!({"$pow": [0, -1]})).is_err());

    assert_eq!(eval(json!({}), json!({"$sqrt": 25})).unwrap(), v(json!(5)));
    assert_eq!(eval(json!({}), json!({"$sqrt": 0})).unwrap(), v(json!(0)));
    assert!(eval(json!({}), json!({"$sqrt": -4})).is_err());
}

#[test]
fn test_trunc_ceil_floor() {
    assert_eq!(eval(json!({}), json!({"$trunc": 7.8})).unwrap(), v(json!(7)));
    assert_eq!(eval(json!({}), json!({"$trunc": -7.8})).unwrap(), v(json!(-7)));
    assert_eq!(eval(json!({}), json!({"$ceil": 7.2})).unwrap(), v(json!(8)));
    assert_eq!(eval(json!({}), json!({"$floor": -7.2})).unwrap(), v(json!(-8)));
}

#[test]
fn test_log_family() {
    let log = eval(json!({}), json!({"$log": [8, 2]})).unwrap();
    assert!((log.as_f64().unwrap() - 3.0).abs() < 1e-9);
    let log10 = eval(json!({}), json!({"$log10": 1000})).unwrap();
    assert!((log10.as_f64().unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(eval(json!({}), json!({"$exp": 0})).unwrap(), v(json!(1)));
}

// =============================================================================
// Strings
// =============================================================================

#[test]
fn test_concat() {
    assert_eq!(
        eval(json!({"f": "a"}), json!({"$concat": ["$f", "-", "b"]})).unwrap(),
        v(json!("a-b"))
    );
    assert_eq!(
        eval(json!({}), json!({"$concat": ["a", null, "b"]})).unwrap(),
        Value::Null
    );
}

#[test]
fn test_substr_quirks() {
    assert_eq!(
        eval(json!({}), json!({"$substr": ["hello", 1, 3]})).unwrap(),
        v(json!("ell"))
    );
    // negative start yields the empty string
    assert_eq!(
        eval(json!({}), json!({"$substr": ["hello", -1, 3]})).unwrap(),
        v(json!(""))
    );
    // negative count takes the tail
    assert_eq!(
        eval(json!({}), json!({"$substr": ["hello", 2, -1]})).unwrap(),
        v(json!("llo"))
    );
}

#[test]
fn test_case_operators() {
    assert_eq!(
        eval(json!({}), json!({"$toLower": "AbC"})).unwrap(),
        v(json!("abc"))
    );
    assert_eq!(
        eval(json!({}), json!({"$toUpper": "AbC"})).unwrap(),
        v(json!("ABC"))
    );
    // nullish input folds to the empty string
    assert_eq!(eval(json!({}), json!({"$toUpper": null})).unwrap(), v(json!("")));
}

#[test]
fn test_strcasecmp() {
    assert_eq!(
        eval(json!({}), json!({"$strcasecmp": ["hello", "HELLO"]})).unwrap(),
        v(json!(0))
    );
    assert_eq!(
        eval(json!({}), json!({"$strcasecmp": ["abc", "abd"]})).unwrap(),
        v(json!(-1))
    );
    assert_eq!(
        eval(json!({}), json!({"$strcasecmp": ["b", "a"]})).unwrap(),
        v(json!(1))
    );
}

#[test]
fn test_split() {
    assert_eq!(
        eval(json!({}), json!({"$split": ["a,b,c", ","]})).unwrap(),
        v(json!(["a", "b", "c"]))
    );
    assert_eq!(
        eval(json!({}), json!({"$split": [null, ","]})).unwrap(),
        Value::Null
    );
}

#[test]
fn test_index_of_bytes() {
    assert_eq!(
        eval(json!({}), json!({"$indexOfBytes": ["cafeteria", "e"]})).unwrap(),
        v(json!(3))
    );
    assert_eq!(
        eval(json!({}), json!({"$indexOfBytes": ["cafeteria", "e", 4]})).unwrap(),
        v(json!(7))
    );
    // start beyond end yields -1
    assert_eq!(
        eval(json!({}), json!({"$indexOfBytes": ["abc", "b", 3, 1]})).unwrap(),
        v(json!(-1))
    );
    assert_eq!(
        eval(json!({}), json!({"$indexOfBytes": [null, "x"]})).unwrap(),
        Value::Null
    );
    // true byte offsets in multi-byte text
    assert_eq!(
        eval(json!({}), json!({"$indexOfBytes": ["é-b", "b"]})).unwrap(),
        v(json!(3))
    );
}

// =============================================================================
// Boolean and comparison
// =============================================================================

#[test]
fn test_boolean_operators() {
    assert_eq!(
        eval(json!({"a": 1}), json!({"$and": ["$a", true, 5]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(
        eval(json!({}), json!({"$and": [1, 0]})).unwrap(),
        v(json!(false))
    );
    assert_eq!(
        eval(json!({}), json!({"$or": [0, "", "x"]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(eval(json!({}), json!({"$not": [0]})).unwrap(), v(json!(true)));
    assert_eq!(eval(json!({}), json!({"$not": ["x"]})).unwrap(), v(json!(false)));
}

#[test]
fn test_comparison_operators() {
    assert_eq!(eval(json!({}), json!({"$cmp": [2, 5]})).unwrap(), v(json!(-1)));
    assert_eq!(eval(json!({}), json!({"$cmp": [5, 5.0]})).unwrap(), v(json!(0)));
    assert_eq!(eval(json!({}), json!({"$eq": [1, 1.0]})).unwrap(), v(json!(true)));
    assert_eq!(
        eval(json!({}), json!({"$gt": ["b", "a"]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(
        eval(json!({"a": 2}), json!({"$lte": ["$a", 2]})).unwrap(),
        v(json!(true))
    );
    assert_eq!(eval(json!({}), json!({"$ne": [1, 2]})).unwrap(), v(json!(true)));
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn test_cond_forms() {
    assert_eq!(
        eval(json!({"a": 5}), json!({"$cond": [{"$gt": ["$a", 3]}, "big", "small"]})).unwrap(),
        v(json!("big"))
    );
    assert_eq!(
        eval(
            json!({"a": 1}),
            json!({"$cond": {"if": {"$gt": ["$a", 3]}, "then": "big", "else": "small"}})
        )
        .unwrap(),
        v(json!("small"))
    );
    assert!(eval(json!({}), json!({"$cond": [true, 1]})).is_err());
}

#[test]
fn test_if_null() {
    assert_eq!(
        eval(json!({}), json!({"$ifNull": ["$missing", "fallback"]})).unwrap(),
        v(json!("fallback"))
    );
    assert_eq!(
        eval(json!({"a": 0}), json!({"$ifNull": ["$a", "fallback"]})).unwrap(),
        v(json!(0))
    );
    assert!(eval(json!({}), json!({"$ifNull": [1, 2, 3]})).is_err());
}

#[test]
fn test_switch() {
    let expr = json!({"$switch": {
        "branches": [
            {"case": {"$gt": ["$n", 10]}, "then": "big"},
            {"case": {"$gt": ["$n", 5]}, "then": "medium"}
        ],
        "default": "small"
    }});
    assert_eq!(eval(json!({"n": 20}), expr.clone()).unwrap(), v(json!("big")));
    assert_eq!(eval(json!({"n": 7}), expr.clone()).unwrap(), v(json!("medium")));
    assert_eq!(eval(json!({"n": 1}), expr).unwrap(), v(json!("small")));

    let no_default = json!({"$switch": {
        "branches": [{"case": false, "then": 1}]
    }});
    assert!(eval(json!({}), no_default).is_err());
}

// =============================================================================
// Variables and literals
// =============================================================================

#[test]
fn test_let_binding() {
    let expr = json!({"$let": {
        "vars": {"total": {"$add": ["$price", "$tax"]}},
        "in": {"$multiply": ["$$total", 2]}
    }});
    assert_eq!(eval(json!({"price": 10, "tax": 2}), expr).unwrap(), v(json!(24)));
}

#[test]
fn test_literal_is_not_interpreted() {
    assert_eq!(
        eval(json!({"a": 1}), json!({"$literal": "$a"})).unwrap(),
        v(json!("$a"))
    );
    assert_eq!(
        eval(json!({}), json!({"$literal": {"$add": [1, 2]}})).unwrap(),
        v(json!({"$add": [1, 2]}))
    );
}

#[test]
fn test_root_and_current() {
    assert_eq!(
        eval(json!({"a": {"b": 2}}), json!("$$ROOT.a.b")).unwrap(),
        v(json!(2))
    );
    let doc = v(json!({"a": 1}));
    let options = Options::default();
    let ctx = Context::new(&doc, &options);
    assert_eq!(
        compute_value(&ctx, &doc, &v(json!("$$CURRENT")), None).unwrap(),
        doc
    );
}
