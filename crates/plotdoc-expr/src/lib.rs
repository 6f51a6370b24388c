//! Formula language for derived datasets.
//!
//! Formulas are arithmetic over named 1-D sequences: the usual operators with
//! element-wise broadcasting of scalars, indexing and slicing, list literals,
//! and a fixed library of numeric functions. Names are resolved through a
//! [`Scope`], which the document implements on top of its dataset mapping.

pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{ExprError, Result};
pub use eval::{EmptyScope, Scope, constant, evaluate};
pub use functions::FUNCTIONS;
pub use parser::{BinaryOp, Expr, UnaryOp, parse};
pub use value::Value;

use std::collections::BTreeSet;

/// A parsed formula together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Names of the values the formula reads.
    pub fn names(&self) -> BTreeSet<String> {
        self.expr.names()
    }

    pub fn evaluate(&self, scope: &dyn Scope) -> Result<Value> {
        tracing::trace!(formula = %self.source, "evaluating formula");
        evaluate(&self.expr, scope)
    }
}
