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

//! Operator Extension Tests

use serde_json::json;
use siftql::{
    add_operators, aggregate, find, CustomOperator, Error, OperatorClass, Value,
};

fn v(j: serde_json::Value) -> Value {
    Value::from(j)
}

fn docs(j: serde_json::Value) -> Vec<Value> {
    match Value::from(j) {
        Value::Array(items) => items,
        _ => panic!("expected array"),
    }
}

#[test]
fn test_custom_query_operator() {
    add_operators(OperatorClass::Query, || {
        vec![(
            "$between".to_string(),
            CustomOperator::Query(Box::new(|_field, lhs, operand| {
                let Some(bounds) = operand.as_array().filter(|b| b.len() == 2) else {
                    return Err(Error::invalid_argument("$between expects [lo, hi]"));
                };
                Ok(lhs.cmp_total(&bounds[0]) != std::cmp::Ordering::Less
                    && lhs.cmp_total(&bounds[1]) != std::cmp::Ordering::Greater)
            })),
        )]
    })
    .unwrap();

    let input = docs(json!([{"age": 10}, {"age": 20}, {"age": 30}]));
    let result = find(&input, v(json!({"age": {"$between": [15, 25]}})), None)
        .unwrap()
        .all()
        .unwrap();
    assert_eq!(result, docs(json!([{"age": 20}])));
}

#[test]
fn test_custom_aggregate_operator() {
    add_operators(OperatorClass::Aggregate, || {
        vec![(
            "$shout".to_string(),
            CustomOperator::Aggregate(Box::new(|ctx, doc, expr| {
                let value = siftql::compute_value(ctx, doc, expr, None)?;
                Ok(Value::text(format!(
                    "{}!",
                    value.as_str().unwrap_or_default().to_uppercase()
                )))
            })),
        )]
    })
    .unwrap();

    let result = aggregate(
        &docs(json!([{"name": "quiet"}])),
        v(json!([{"$project": {"loud": {"$shout": "$name"}}}])),
    )
    .unwrap();
    assert_eq!(result, docs(json!([{"loud": "QUIET!"}])));
}

#[test]
fn test_rejects_invalid_name() {
    let result = add_operators(OperatorClass::Query, || {
        vec![(
            "notdollar".to_string(),
            CustomOperator::Query(Box::new(|_, _, _| Ok(true))),
        )]
    });
    assert!(matches!(result, Err(Error::InvalidOperatorName(_))));
}

#[test]
fn test_rejects_builtin_collision() {
    let result = add_operators(OperatorClass::Group, || {
        vec![(
            "$sum".to_string(),
            CustomOperator::Group(Box::new(|_, _, _| Ok(Value::Null))),
        )]
    });
    assert!(matches!(result, Err(Error::OperatorExists { .. })));
}

#[test]
fn test_custom_pipeline_operator() {
    add_operators(OperatorClass::Pipeline, || {
        vec![(
            "$reverse".to_string(),
            CustomOperator::Pipeline(Box::new(|_options, mut collection, _expr| {
                collection.reverse();
                Ok(collection)
            })),
        )]
    })
    .unwrap();

    let result = aggregate(
        &docs(json!([{"n": 1}, {"n": 2}])),
        v(json!([{"$reverse": {}}])),
    )
    .unwrap();
    assert_eq!(result, docs(json!([{"n": 2}, {"n": 1}])));
}
