//! Built-in functions available to formulas.

use crate::error::{ExprError, Result};
use crate::eval::integer;
use crate::value::Value;

/// Names of every built-in function, for listings and help output.
pub const FUNCTIONS: &[&str] = &[
    "abs", "arange", "arccos", "arcsin", "arctan", "arctan2", "ceil", "clip", "cos", "cosh",
    "cumsum", "exp", "floor", "hypot", "len", "linspace", "log", "log10", "log2", "max",
    "maximum", "mean", "min", "minimum", "ones", "round", "sign", "sin", "sinh", "sqrt", "sum",
    "tan", "tanh", "zeros",
];

/// Largest array a formula may create, in bytes.
pub const MAX_ARRAY_BYTES: usize = 1 << 27;

pub fn call(name: &str, args: Vec<Value>) -> Result<Value> {
    if let Some(op) = elementwise(name) {
        let [value] = take::<1>(name, args)?;
        return Ok(value.map(op));
    }
    match name {
        "arctan2" => pairwise(name, args, f64::atan2),
        "hypot" => pairwise(name, args, f64::hypot),
        "minimum" => pairwise(name, args, f64::min),
        "maximum" => pairwise(name, args, f64::max),
        "min" => reduce(name, args, f64::min),
        "max" => reduce(name, args, f64::max),
        "sum" => {
            let [value] = take::<1>(name, args)?;
            Ok(Value::Scalar(value.as_slice().iter().sum()))
        }
        "mean" => {
            let [value] = take::<1>(name, args)?;
            let values = value.as_slice();
            Ok(Value::Scalar(
                values.iter().sum::<f64>() / values.len() as f64,
            ))
        }
        "len" => {
            let [value] = take::<1>(name, args)?;
            match value {
                Value::Array(values) => Ok(Value::Scalar(values.len() as f64)),
                Value::Scalar(_) => Err(ExprError::type_error("len() of a scalar")),
            }
        }
        "cumsum" => {
            let [value] = take::<1>(name, args)?;
            let mut total = 0.0;
            let values = value
                .as_slice()
                .iter()
                .map(|v| {
                    total += v;
                    total
                })
                .collect();
            Ok(Value::Array(values))
        }
        "clip" => {
            let [value, low, high] = take::<3>(name, args)?;
            value
                .zip_with(low, f64::max)?
                .zip_with(high, f64::min)
        }
        "arange" => arange(&args),
        "linspace" => {
            let [start, stop, count] = take::<3>(name, args)?;
            let start = scalar(&start, "linspace start")?;
            let stop = scalar(&stop, "linspace stop")?;
            let count = count_arg(&count, "linspace count")?;
            Ok(Value::Array(linspace(start, stop, count)))
        }
        "zeros" | "ones" => {
            let [count] = take::<1>(name, args)?;
            let count = count_arg(&count, "array length")?;
            let fill = if name == "zeros" { 0.0 } else { 1.0 };
            Ok(Value::Array(vec![fill; count]))
        }
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}

fn elementwise(name: &str) -> Option<fn(f64) -> f64> {
    let op: fn(f64) -> f64 = match name {
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "arcsin" => f64::asin,
        "arccos" => f64::acos,
        "arctan" => f64::atan,
        "sinh" => f64::sinh,
        "cosh" => f64::cosh,
        "tanh" => f64::tanh,
        "exp" => f64::exp,
        "log" => f64::ln,
        "log10" => f64::log10,
        "log2" => f64::log2,
        "sqrt" => f64::sqrt,
        "abs" => f64::abs,
        "floor" => f64::floor,
        "ceil" => f64::ceil,
        "round" => f64::round_ties_even,
        "sign" => sign,
        _ => return None,
    };
    Some(op)
}

fn sign(value: f64) -> f64 {
    if value.is_nan() || value == 0.0 {
        value
    } else {
        value.signum()
    }
}

fn take<const N: usize>(name: &str, args: Vec<Value>) -> Result<[Value; N]> {
    let found = args.len();
    args.try_into().map_err(|_| ExprError::Arity {
        function: name.to_string(),
        expected: arity_text(N),
        found,
    })
}

fn arity_text(count: usize) -> &'static str {
    match count {
        0 => "0",
        1 => "1",
        2 => "2",
        3 => "3",
        _ => "several",
    }
}

fn pairwise(name: &str, args: Vec<Value>, op: fn(f64, f64) -> f64) -> Result<Value> {
    let [left, right] = take::<2>(name, args)?;
    left.zip_with(right, op)
}

fn reduce(name: &str, args: Vec<Value>, op: fn(f64, f64) -> f64) -> Result<Value> {
    let [value] = take::<1>(name, args)?;
    let values = value.as_slice();
    let Some((&first, rest)) = values.split_first() else {
        return Err(ExprError::type_error(format!(
            "{name}() of an empty sequence"
        )));
    };
    // NaN propagates, unlike f64::min/max
    if values.iter().any(|v| v.is_nan()) {
        return Ok(Value::Scalar(f64::NAN));
    }
    Ok(Value::Scalar(rest.iter().fold(first, |acc, &v| op(acc, v))))
}

fn scalar(value: &Value, what: &str) -> Result<f64> {
    value
        .as_scalar()
        .ok_or_else(|| ExprError::type_error(format!("{what} must be a scalar")))
}

fn count_arg(value: &Value, what: &str) -> Result<usize> {
    let count = integer(value, what)?;
    let count = usize::try_from(count)
        .map_err(|_| ExprError::type_error(format!("{what} must not be negative")))?;
    checked_len(count, what)
}

/// Reject lengths whose storage would exceed [`MAX_ARRAY_BYTES`].
fn checked_len(count: usize, what: &str) -> Result<usize> {
    count
        .checked_mul(size_of::<f64>())
        .filter(|bytes| *bytes <= MAX_ARRAY_BYTES)
        .map(|_| count)
        .ok_or_else(|| ExprError::type_error(format!("{what} {count} is too large")))
}

fn arange(args: &[Value]) -> Result<Value> {
    let (start, stop, step) = match args {
        [stop] => (0.0, scalar(stop, "arange stop")?, 1.0),
        [start, stop] => (
            scalar(start, "arange start")?,
            scalar(stop, "arange stop")?,
            1.0,
        ),
        [start, stop, step] => (
            scalar(start, "arange start")?,
            scalar(stop, "arange stop")?,
            scalar(step, "arange step")?,
        ),
        _ => {
            return Err(ExprError::Arity {
                function: "arange".to_string(),
                expected: "1 to 3",
                found: args.len(),
            });
        }
    };
    if step == 0.0 || !step.is_finite() {
        return Err(ExprError::type_error("arange step must be finite and non-zero"));
    }
    let count = ((stop - start) / step).ceil();
    if !count.is_finite() {
        return Err(ExprError::type_error("arange bounds must be finite"));
    }
    // Saturating cast; anything past the limit is rejected below.
    let count = checked_len(count.max(0.0) as usize, "arange length")?;
    Ok(Value::Array(
        (0..count).map(|i| start + i as f64 * step).collect(),
    ))
}

fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| {
                    if i == count - 1 {
                        stop
                    } else {
                        start + i as f64 * step
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(values: &[f64]) -> Value {
        Value::Array(values.to_vec())
    }

    #[test]
    fn test_elementwise() {
        assert_eq!(
            call("abs", vec![array(&[-1.0, 2.0])]).unwrap(),
            array(&[1.0, 2.0])
        );
        assert_eq!(call("round", vec![Value::Scalar(2.5)]).unwrap(), Value::Scalar(2.0));
        assert_eq!(call("sign", vec![Value::Scalar(-3.0)]).unwrap(), Value::Scalar(-1.0));
        assert_eq!(call("sign", vec![Value::Scalar(0.0)]).unwrap(), Value::Scalar(0.0));
    }

    #[test]
    fn test_reductions() {
        let values = array(&[3.0, 1.0, 2.0]);
        assert_eq!(call("min", vec![values.clone()]).unwrap(), Value::Scalar(1.0));
        assert_eq!(call("max", vec![values.clone()]).unwrap(), Value::Scalar(3.0));
        assert_eq!(call("sum", vec![values.clone()]).unwrap(), Value::Scalar(6.0));
        assert_eq!(call("mean", vec![values.clone()]).unwrap(), Value::Scalar(2.0));
        assert_eq!(call("len", vec![values.clone()]).unwrap(), Value::Scalar(3.0));
        assert_eq!(
            call("cumsum", vec![values]).unwrap(),
            array(&[3.0, 4.0, 6.0])
        );
        assert!(matches!(call("min", vec![array(&[])]), Err(ExprError::Type(_))));
    }

    #[test]
    fn test_huge_lengths_are_rejected() {
        for length in [1e19, 1e17, 1e9] {
            for name in ["zeros", "ones"] {
                assert!(matches!(
                    call(name, vec![Value::Scalar(length)]),
                    Err(ExprError::Type(_))
                ));
            }
            assert!(matches!(
                call("arange", vec![Value::Scalar(length)]),
                Err(ExprError::Type(_))
            ));
            assert!(matches!(
                call(
                    "linspace",
                    vec![Value::Scalar(0.0), Value::Scalar(1.0), Value::Scalar(length)]
                ),
                Err(ExprError::Type(_))
            ));
        }
        let limit = (MAX_ARRAY_BYTES / size_of::<f64>()) as f64;
        assert!(call("zeros", vec![Value::Scalar(limit + 1.0)]).is_err());
        assert_eq!(call("zeros", vec![Value::Scalar(4.0)]).unwrap(), array(&[0.0; 4]));
    }

    #[test]
    fn test_generators() {
        assert_eq!(
            call("arange", vec![Value::Scalar(3.0)]).unwrap(),
            array(&[0.0, 1.0, 2.0])
        );
        assert_eq!(
            call(
                "arange",
                vec![Value::Scalar(1.0), Value::Scalar(2.0), Value::Scalar(0.25)]
            )
            .unwrap(),
            array(&[1.0, 1.25, 1.5, 1.75])
        );
        assert_eq!(
            call(
                "linspace",
                vec![Value::Scalar(0.0), Value::Scalar(1.0), Value::Scalar(5.0)]
            )
            .unwrap(),
            array(&[0.0, 0.25, 0.5, 0.75, 1.0])
        );
        assert_eq!(call("ones", vec![Value::Scalar(2.0)]).unwrap(), array(&[1.0, 1.0]));
        assert!(matches!(
            call("zeros", vec![Value::Scalar(-1.0)]),
            Err(ExprError::Type(_))
        ));
    }

    #[test]
    fn test_clip_broadcasts() {
        assert_eq!(
            call(
                "clip",
                vec![array(&[-2.0, 0.5, 9.0]), Value::Scalar(0.0), Value::Scalar(1.0)]
            )
            .unwrap(),
            array(&[0.0, 0.5, 1.0])
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            call("nope", vec![]),
            Err(ExprError::UnknownFunction("nope".to_string()))
        );
        assert_eq!(
            call("sin", vec![]),
            Err(ExprError::Arity {
                function: "sin".to_string(),
                expected: "1",
                found: 0,
            })
        );
    }
}
