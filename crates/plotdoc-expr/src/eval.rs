use std::collections::BTreeMap;

use crate::error::{ExprError, Result};
use crate::functions;
use crate::parser::{BinaryOp, Expr, UnaryOp};
use crate::value::Value;

/// Source of values for names in an expression.
///
/// `Ok(None)` means the name is not bound here; the evaluator then tries the
/// built-in constants before reporting [`ExprError::UnknownName`].
pub trait Scope {
    fn lookup(&self, name: &str) -> Result<Option<Value>>;
}

impl Scope for BTreeMap<String, Value> {
    fn lookup(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.get(name).cloned())
    }
}

/// Scope with no bindings; only constants resolve.
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, _name: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}

pub fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        "inf" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    }
}

pub fn evaluate(expr: &Expr, scope: &dyn Scope) -> Result<Value> {
    match expr {
        Expr::Number(value) => Ok(Value::Scalar(*value)),
        Expr::Name(name) => match scope.lookup(name)? {
            Some(value) => Ok(value),
            None => constant(name)
                .map(Value::Scalar)
                .ok_or_else(|| ExprError::UnknownName(name.clone())),
        },
        Expr::List(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                match evaluate(item, scope)? {
                    Value::Scalar(value) => values.push(value),
                    Value::Array(_) => {
                        return Err(ExprError::type_error("list elements must be numbers"));
                    }
                }
            }
            Ok(Value::Array(values))
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope)?;
            Ok(match op {
                UnaryOp::Negate => value.map(|v| -v),
                UnaryOp::Plus => value,
            })
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            left.zip_with(right, binary_op(*op))
        }
        Expr::Call { function, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>>>()?;
            functions::call(function, args)
        }
        Expr::Index { target, index } => {
            let target = evaluate(target, scope)?;
            let index = evaluate(index, scope)?;
            let Value::Array(values) = target else {
                return Err(ExprError::type_error("cannot index a scalar"));
            };
            let index = integer(&index, "index")?;
            let pos = resolve_index(index, values.len())?;
            Ok(Value::Scalar(values[pos]))
        }
        Expr::Slice { target, start, end } => {
            let target = evaluate(target, scope)?;
            let Value::Array(values) = target else {
                return Err(ExprError::type_error("cannot slice a scalar"));
            };
            let len = values.len();
            let bound = |bound: &Option<Box<Expr>>, default: usize| -> Result<usize> {
                match bound {
                    None => Ok(default),
                    Some(expr) => {
                        let value = integer(&evaluate(expr, scope)?, "slice bound")?;
                        Ok(clamp_bound(value, len))
                    }
                }
            };
            let start = bound(start, 0)?;
            let end = bound(end, len)?;
            if start >= end {
                return Ok(Value::Array(Vec::new()));
            }
            Ok(Value::Array(values[start..end].to_vec()))
        }
    }
}

fn binary_op(op: BinaryOp) -> fn(f64, f64) -> f64 {
    match op {
        BinaryOp::Add => |a, b| a + b,
        BinaryOp::Subtract => |a, b| a - b,
        BinaryOp::Multiply => |a, b| a * b,
        BinaryOp::Divide => |a, b| a / b,
        BinaryOp::Modulo => floored_modulo,
        BinaryOp::Power => f64::powf,
    }
}

/// Remainder with the sign of the divisor, matching `floor` division.
fn floored_modulo(a: f64, b: f64) -> f64 {
    let rem = a % b;
    if rem != 0.0 && (rem < 0.0) != (b < 0.0) {
        rem + b
    } else {
        rem
    }
}

pub(crate) fn integer(value: &Value, what: &str) -> Result<i64> {
    match value {
        Value::Scalar(number) if number.fract() == 0.0 && number.is_finite() => Ok(*number as i64),
        Value::Scalar(number) => Err(ExprError::type_error(format!(
            "{what} must be an integer, got {number}"
        ))),
        Value::Array(_) => Err(ExprError::type_error(format!("{what} must be a scalar"))),
    }
}

fn resolve_index(index: i64, len: usize) -> Result<usize> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    if resolved < 0 || resolved >= len as i64 {
        return Err(ExprError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

fn clamp_bound(bound: i64, len: usize) -> usize {
    let len = len as i64;
    let bound = if bound < 0 { bound + len } else { bound };
    bound.clamp(0, len) as usize
}
