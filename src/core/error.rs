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

//! Error types for SiftQL
//!
//! All validation and evaluation failures surface through a single [`Error`]
//! enum. Evaluation never returns partial results: the first error unwinds
//! the whole query or pipeline run.

use thiserror::Error;

/// Result type alias for SiftQL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for query and pipeline evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Operator lookup and registration
    // =========================================================================
    /// Operator name is not registered in its class
    #[error("unknown {class} operator '{name}'")]
    UnknownOperator { class: String, name: String },

    /// Operator name does not match `^\$\w+$` during registration
    #[error("invalid operator name '{0}'")]
    InvalidOperatorName(String),

    /// Operator name already registered in the class
    #[error("operator '{name}' already exists in class {class}")]
    OperatorExists { class: String, name: String },

    // =========================================================================
    // Operand validation
    // =========================================================================
    /// Operand has the wrong shape or type for the operator
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Criteria, pipeline, or stage document is malformed
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Mixed inclusion and exclusion in a projection
    #[error("projection cannot mix inclusion and exclusion")]
    MixedProjection,

    // =========================================================================
    // Evaluation
    // =========================================================================
    /// Arithmetic operand was not numeric
    #[error("{operator} expects a numeric operand, got {got}")]
    NonNumericOperand { operator: String, got: String },

    /// Type error outside arithmetic
    #[error("type error: {0}")]
    Type(String),
}

impl Error {
    /// Create an UnknownOperator error
    pub fn unknown_operator(class: impl Into<String>, name: impl Into<String>) -> Self {
        Error::UnknownOperator {
            class: class.into(),
            name: name.into(),
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create an InvalidExpression error
    pub fn invalid_expression(message: impl Into<String>) -> Self {
        Error::InvalidExpression(message.into())
    }

    /// Create a NonNumericOperand error
    pub fn non_numeric(operator: impl Into<String>, got: impl Into<String>) -> Self {
        Error::NonNumericOperand {
            operator: operator.into(),
            got: got.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_operator("query", "$frobnicate");
        assert_eq!(err.to_string(), "unknown query operator '$frobnicate'");

        let err = Error::invalid_argument("$mod requires a two-element array");
        assert_eq!(
            err.to_string(),
            "invalid argument: $mod requires a two-element array"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(
            Error::unknown_operator("pipeline", "$x"),
            Error::unknown_operator("pipeline", "$x")
        );
        assert_ne!(Error::MixedProjection, Error::Type("x".into()));
    }
}
