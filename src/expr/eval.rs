//! Evaluation of parsed test expressions against production data

use std::cmp::Ordering;

use tracing::info;

use crate::data::{Data, Value};
use crate::variables::{resolve_path, sole_placeholder, substitute};

use super::ast::{BinaryOp, Expr};

/// Evaluate an expression to a value. Evaluation has no failure mode:
/// operands that cannot be compared make the comparison false.
pub fn eval(expr: &Expr, data: &Data) -> Value {
    match expr {
        Expr::Null => Value::Null,
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Number(n) => Value::Number(*n),
        Expr::Reference(path) => lookup(data, path),
        Expr::Text(text) => match sole_placeholder(text) {
            Some(path) => lookup(data, path),
            None => Value::String(substitute(text, data)),
        },
        Expr::Not(operand) => Value::Bool(!eval(operand, data).is_truthy()),
        Expr::Binary { op, lhs, rhs } => match op {
            BinaryOp::And => {
                Value::Bool(eval(lhs, data).is_truthy() && eval(rhs, data).is_truthy())
            }
            BinaryOp::Or => Value::Bool(eval(lhs, data).is_truthy() || eval(rhs, data).is_truthy()),
            _ => {
                let (l, r) = (eval(lhs, data), eval(rhs, data));
                Value::Bool(compare(*op, &l, &r))
            }
        },
    }
}

fn lookup(data: &Data, path: &str) -> Value {
    match resolve_path(data, path) {
        Some(value) => value.clone(),
        None => {
            info!(path, "no data for placeholder in test expression");
            Value::Null
        }
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> bool {
    match op {
        BinaryOp::Equal => loose_eq(l, r),
        BinaryOp::NotEqual => !loose_eq(l, r),
        BinaryOp::StrictEqual => l == r,
        BinaryOp::StrictNotEqual => l != r,
        BinaryOp::Less => ordering(l, r) == Some(Ordering::Less),
        BinaryOp::LessOrEqual => matches!(ordering(l, r), Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Greater => ordering(l, r) == Some(Ordering::Greater),
        BinaryOp::GreaterOrEqual => {
            matches!(ordering(l, r), Some(Ordering::Greater | Ordering::Equal))
        }
        BinaryOp::And | BinaryOp::Or => false,
    }
}

/// Numeric reading of a scalar: booleans count as 0/1, blank strings as 0
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(_) | Value::Bool(_), _) | (_, Value::Number(_) | Value::Bool(_)) => {
            match (as_number(l), as_number(r)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => l == r,
    }
}

fn ordering(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Null, _) | (_, Value::Null) => None,
        _ => as_number(l)?.partial_cmp(&as_number(r)?),
    }
}
