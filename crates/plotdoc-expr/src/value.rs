use crate::error::{ExprError, Result};

/// Result of evaluating an expression: a single number or a sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Value {
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Value::Scalar(_) => None,
            Value::Array(values) => Some(values.len()),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(value) => Some(*value),
            Value::Array(_) => None,
        }
    }

    /// Expand to a sequence, repeating scalars `len` times.
    pub fn into_vec(self, len: usize) -> Vec<f64> {
        match self {
            Value::Scalar(value) => vec![value; len],
            Value::Array(values) => values,
        }
    }

    /// View as a sequence; a scalar counts as one element.
    pub fn as_slice(&self) -> &[f64] {
        match self {
            Value::Scalar(value) => std::slice::from_ref(value),
            Value::Array(values) => values,
        }
    }

    pub fn map(self, op: impl Fn(f64) -> f64) -> Value {
        match self {
            Value::Scalar(value) => Value::Scalar(op(value)),
            Value::Array(values) => Value::Array(values.into_iter().map(op).collect()),
        }
    }

    /// Combine two values element by element, broadcasting scalars.
    pub fn zip_with(self, other: Value, op: impl Fn(f64, f64) -> f64) -> Result<Value> {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(op(a, b))),
            (Value::Scalar(a), Value::Array(b)) => {
                Ok(Value::Array(b.into_iter().map(|b| op(a, b)).collect()))
            }
            (Value::Array(a), Value::Scalar(b)) => {
                Ok(Value::Array(a.into_iter().map(|a| op(a, b)).collect()))
            }
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return Err(ExprError::LengthMismatch {
                        left: a.len(),
                        right: b.len(),
                    });
                }
                Ok(Value::Array(
                    a.into_iter().zip(b).map(|(a, b)| op(a, b)).collect(),
                ))
            }
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(values: Vec<f64>) -> Self {
        Value::Array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast() {
        let value = Value::from(vec![1.0, 2.0])
            .zip_with(Value::Scalar(10.0), |a, b| a + b)
            .unwrap();
        assert_eq!(value, Value::Array(vec![11.0, 12.0]));
    }

    #[test]
    fn test_length_mismatch() {
        let err = Value::from(vec![1.0, 2.0])
            .zip_with(Value::from(vec![1.0]), |a, b| a + b)
            .unwrap_err();
        assert_eq!(err, ExprError::LengthMismatch { left: 2, right: 1 });
    }

    #[test]
    fn test_into_vec() {
        assert_eq!(Value::Scalar(2.0).into_vec(3), vec![2.0, 2.0, 2.0]);
        assert_eq!(Value::Scalar(2.0).as_slice(), &[2.0]);
    }
}
