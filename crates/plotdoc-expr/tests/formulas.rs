//! Tests for formula parsing and evaluation.
//!
//! Covers operator precedence, broadcasting against named sequences and the
//! numeric function library.

use std::collections::BTreeMap;

use proptest::prelude::*;

use plotdoc_expr::{EmptyScope, ExprError, Formula, Scope, Value};

fn scope(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

fn eval(source: &str, scope: &dyn Scope) -> Result<Value, ExprError> {
    Formula::parse(source)?.evaluate(scope)
}

fn close(actual: &[f64], expected: &[f64]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, b)| (a - b).abs() < 1e-9)
}

// =========================================================================
// Arithmetic
// =========================================================================

#[test]
fn converts_kelvin_to_celsius() {
    let scope = scope(&[("temp", Value::Array(vec![1.0, 2.0, 3.0]))]);
    let Value::Array(values) = eval("temp - 273.15", &scope).unwrap() else {
        panic!("expected an array");
    };
    assert!(close(&values, &[-272.15, -271.15, -270.15]));
}

#[test]
fn unary_minus_applies_after_power() {
    assert_eq!(eval("-2**2", &EmptyScope).unwrap(), Value::Scalar(-4.0));
    assert_eq!(eval("(-2)**2", &EmptyScope).unwrap(), Value::Scalar(4.0));
    assert_eq!(eval("2**-1", &EmptyScope).unwrap(), Value::Scalar(0.5));
}

#[test]
fn division_by_zero_is_not_an_error() {
    assert_eq!(eval("1 / 0", &EmptyScope).unwrap(), Value::Scalar(f64::INFINITY));
    let Value::Scalar(value) = eval("0 / 0", &EmptyScope).unwrap() else {
        panic!("expected a scalar");
    };
    assert!(value.is_nan());
}

#[test]
fn mismatched_sequences_fail() {
    let scope = scope(&[
        ("a", Value::Array(vec![1.0, 2.0, 3.0])),
        ("b", Value::Array(vec![1.0, 2.0])),
    ]);
    assert_eq!(
        eval("a + b", &scope),
        Err(ExprError::LengthMismatch { left: 3, right: 2 })
    );
}

// =========================================================================
// Names and functions
// =========================================================================

#[test]
fn reports_unknown_names_and_functions() {
    assert_eq!(
        eval("missing * 2", &EmptyScope),
        Err(ExprError::UnknownName("missing".to_string()))
    );
    assert_eq!(
        eval("frobnicate(1)", &EmptyScope),
        Err(ExprError::UnknownFunction("frobnicate".to_string()))
    );
}

#[test]
fn functions_compose_with_slicing() {
    let scope = scope(&[("x", Value::Array(vec![4.0, 9.0, 16.0, 25.0]))]);
    assert_eq!(
        eval("sqrt(x[1:-1])", &scope).unwrap(),
        Value::Array(vec![3.0, 4.0])
    );
    assert_eq!(eval("mean(sqrt(x))", &scope).unwrap(), Value::Scalar(3.5));
    assert!(eval("len(x[::])", &scope).is_err());
}

#[test]
fn formula_lists_the_names_it_reads() {
    let formula = Formula::parse("hypot(x, y) + sum(x) * pi").unwrap();
    let names: Vec<String> = formula.names().into_iter().collect();
    assert_eq!(names, vec!["pi", "x", "y"]);
    assert_eq!(formula.source(), "hypot(x, y) + sum(x) * pi");
}

#[test]
fn reference_errors_from_scope_propagate() {
    struct Failing;
    impl Scope for Failing {
        fn lookup(&self, name: &str) -> Result<Option<Value>, ExprError> {
            Err(ExprError::reference(name, "circular reference"))
        }
    }
    assert_eq!(
        eval("a + 1", &Failing),
        Err(ExprError::Reference {
            name: "a".to_string(),
            message: "circular reference".to_string(),
        })
    );
}

#[test]
fn oversized_arrays_fail_instead_of_allocating() {
    for source in ["zeros(1e19)", "ones(1e17)", "arange(1e18)", "linspace(0, 1, 1e12)"] {
        assert!(
            matches!(eval(source, &EmptyScope), Err(ExprError::Type(_))),
            "{source}"
        );
    }
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #[test]
    fn scalar_broadcast_preserves_length(
        values in prop::collection::vec(-1.0e3..1.0e3f64, 0..32),
        offset in -1.0e3..1.0e3f64,
    ) {
        let scope = scope(&[
            ("x", Value::Array(values.clone())),
            ("k", Value::Scalar(offset)),
        ]);
        let result = eval("x * 2 - k", &scope).unwrap();
        prop_assert_eq!(result.array_len(), Some(values.len()));
    }

    #[test]
    fn slicing_never_panics(
        values in prop::collection::vec(-10.0..10.0f64, 0..8),
        start in -12i64..12,
        end in -12i64..12,
    ) {
        let scope = scope(&[("x", Value::Array(values.clone()))]);
        let result = eval(&format!("x[{start}:{end}]"), &scope).unwrap();
        prop_assert!(result.array_len().unwrap_or(0) <= values.len());
    }
}
