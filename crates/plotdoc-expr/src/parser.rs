use std::collections::BTreeSet;

use crate::error::{ExprError, Result};
use crate::lexer::{Spanned, Token, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Name(String),
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: String,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        target: Box<Expr>,
        start: Option<Box<Expr>>,
        end: Option<Box<Expr>>,
    },
}

impl Expr {
    /// Names the expression reads, excluding called function names.
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Name(name) => {
                names.insert(name.clone());
            }
            Expr::List(items) | Expr::Call { args: items, .. } => {
                for item in items {
                    item.collect_names(names);
                }
            }
            Expr::Unary { operand, .. } => operand.collect_names(names),
            Expr::Binary { left, right, .. } => {
                left.collect_names(names);
                right.collect_names(names);
            }
            Expr::Index { target, index } => {
                target.collect_names(names);
                index.collect_names(names);
            }
            Expr::Slice { target, start, end } => {
                target.collect_names(names);
                for bound in [start, end].into_iter().flatten() {
                    bound.collect_names(names);
                }
            }
        }
    }
}

/// Parse formula text into an expression tree.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    if parser.tokens.is_empty() {
        return Err(ExprError::syntax(0, "empty expression"));
    }
    let expr = parser.expression()?;
    if let Some(token) = parser.peek() {
        return Err(ExprError::syntax(
            token.offset,
            format!("unexpected '{}'", token.node),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, token: &Token) -> bool {
        self.peek().is_some_and(|next| &next.node == token)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |token| token.offset)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_is(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            return Ok(());
        }
        let found = match self.peek() {
            Some(next) => format!("'{}'", next.node),
            None => "end of expression".to_string(),
        };
        Err(ExprError::syntax(
            self.offset(),
            format!("expected '{token}', found {found}"),
        ))
    }

    fn expression(&mut self) -> Result<Expr> {
        let mut left = self.term()?;
        loop {
            let op = if self.eat(&Token::Plus) {
                BinaryOp::Add
            } else if self.eat(&Token::Minus) {
                BinaryOp::Subtract
            } else {
                return Ok(left);
            };
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = if self.eat(&Token::Asterisk) {
                BinaryOp::Multiply
            } else if self.eat(&Token::Slash) {
                BinaryOp::Divide
            } else if self.eat(&Token::Percent) {
                BinaryOp::Modulo
            } else {
                return Ok(left);
            };
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    // Unary minus binds looser than `**`, so `-2**2` is `-(2**2)`.
    fn unary(&mut self) -> Result<Expr> {
        let op = if self.eat(&Token::Minus) {
            UnaryOp::Negate
        } else if self.eat(&Token::Plus) {
            UnaryOp::Plus
        } else {
            return self.power();
        };
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.postfix()?;
        if self.eat(&Token::Power) {
            let exponent = self.unary()?;
            return Ok(binary(BinaryOp::Power, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.peek_is(&Token::BracketRoundOpen) {
                let offset = self.offset();
                let Expr::Name(function) = expr else {
                    return Err(ExprError::syntax(offset, "only named functions can be called"));
                };
                self.pos += 1;
                let args = self.sequence(&Token::BracketRoundClose)?;
                expr = Expr::Call { function, args };
            } else if self.eat(&Token::BracketSquareOpen) {
                expr = self.subscript(expr)?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn subscript(&mut self, target: Expr) -> Result<Expr> {
        let target = Box::new(target);
        let start = if self.peek_is(&Token::Colon) {
            None
        } else {
            let index = Box::new(self.expression()?);
            if !self.peek_is(&Token::Colon) {
                self.expect(&Token::BracketSquareClose)?;
                return Ok(Expr::Index { target, index });
            }
            Some(index)
        };
        self.expect(&Token::Colon)?;
        let end = if self.peek_is(&Token::BracketSquareClose) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        self.expect(&Token::BracketSquareClose)?;
        Ok(Expr::Slice { target, start, end })
    }

    /// Comma separated expressions up to `close`; a trailing comma is allowed.
    fn sequence(&mut self, close: &Token) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr> {
        let offset = self.offset();
        let Some(token) = self.tokens.get(self.pos).map(|token| token.node.clone()) else {
            return Err(ExprError::syntax(offset, "unexpected end of expression"));
        };
        self.pos += 1;
        match token {
            Token::Number(number) => Ok(Expr::Number(number)),
            Token::Identifier(name) => Ok(Expr::Name(name)),
            Token::BracketRoundOpen => {
                let inner = self.expression()?;
                self.expect(&Token::BracketRoundClose)?;
                Ok(inner)
            }
            Token::BracketSquareOpen => Ok(Expr::List(self.sequence(&Token::BracketSquareClose)?)),
            other => Err(ExprError::syntax(offset, format!("unexpected '{other}'"))),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(value: f64) -> Box<Expr> {
        Box::new(Expr::Number(value))
    }

    #[test]
    fn test_power_binds_tighter_than_negation() {
        let expr = parse("-2**2").unwrap();
        assert_eq!(
            expr,
            Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(Expr::Binary {
                    op: BinaryOp::Power,
                    left: num(2.0),
                    right: num(2.0),
                }),
            }
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse("2**3**2").unwrap();
        let Expr::Binary { op, left, right } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Power);
        assert_eq!(left, num(2.0));
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Power, .. }));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3").unwrap();
        let Expr::Binary { op, right, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Multiply, .. }));
    }

    #[test]
    fn test_calls_and_subscripts() {
        let expr = parse("sum(x[1:], y[-1])").unwrap();
        let Expr::Call { function, args } = expr else {
            panic!("expected call");
        };
        assert_eq!(function, "sum");
        assert!(matches!(args[0], Expr::Slice { end: None, .. }));
        assert!(matches!(args[1], Expr::Index { .. }));
    }

    #[test]
    fn test_names() {
        let expr = parse("sqrt(a**2 + b[0]) * a").unwrap();
        let names: Vec<_> = expr.names().into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse(""), Err(ExprError::Syntax { position: 0, .. })));
        assert!(matches!(parse("1 +"), Err(ExprError::Syntax { position: 3, .. })));
        assert!(matches!(parse("(1"), Err(ExprError::Syntax { .. })));
        assert!(matches!(parse("1 2"), Err(ExprError::Syntax { position: 2, .. })));
        assert!(matches!(parse("(1)(2)"), Err(ExprError::Syntax { .. })));
        assert!(matches!(parse("x[]"), Err(ExprError::Syntax { .. })));
    }
}
