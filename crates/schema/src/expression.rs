//! Reaction expressions
//!
//! Boolean expressions over the run-time values of a reaction's dependencies.
//! `dep` indexes into the reaction's dependency list. Truthiness and strict
//! equality follow the JavaScript rules form renderers evaluate with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Boolean expression bound to a dependency list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Expression {
    Const { value: bool },
    Truthy { dep: usize },
    Falsy { dep: usize },
    StrictEquals { dep: usize, value: Value },
    StrictNotEquals { dep: usize, value: Value },
    Not { expr: Box<Expression> },
}

impl Expression {
    /// Wrap in one negation layer
    pub fn negate(self) -> Self {
        Expression::Not {
            expr: Box::new(self),
        }
    }

    /// Evaluate against dependency values; a missing dependency reads as null
    pub fn evaluate(&self, deps: &[Value]) -> bool {
        let dep_value = |index: &usize| deps.get(*index).unwrap_or(&Value::Null);
        match self {
            Expression::Const { value } => *value,
            Expression::Truthy { dep } => is_truthy(dep_value(dep)),
            Expression::Falsy { dep } => !is_truthy(dep_value(dep)),
            Expression::StrictEquals { dep, value } => strict_equals(dep_value(dep), value),
            Expression::StrictNotEquals { dep, value } => !strict_equals(dep_value(dep), value),
            Expression::Not { expr } => !expr.evaluate(deps),
        }
    }

    /// Conventional source form, e.g. `$deps[0] === "approved"`
    pub fn to_source(&self) -> String {
        match self {
            Expression::Const { value } => value.to_string(),
            Expression::Truthy { dep } => format!("!!$deps[{dep}]"),
            Expression::Falsy { dep } => format!("!$deps[{dep}]"),
            Expression::StrictEquals { dep, value } => format!("$deps[{dep}] === {value}"),
            Expression::StrictNotEquals { dep, value } => format!("$deps[{dep}] !== {value}"),
            Expression::Not { expr } => format!("!({})", expr.to_source()),
        }
    }

    /// Source form wrapped in template braces
    pub fn to_template(&self) -> String {
        format!("{{{{{}}}}}", self.to_source())
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_source())
    }
}

/// JavaScript truthiness of a JSON value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strict equality on JSON values; numbers compare by numeric value
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

// ============================================================================
// Tests
// ============================================================================
