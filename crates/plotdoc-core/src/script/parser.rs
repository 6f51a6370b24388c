use super::ScriptError;
use super::lexer::{Spanned, Token, tokenize};

/// A constant argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A list or tuple.
    List(Vec<Literal>),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::None => "None",
            Literal::Bool(_) => "a boolean",
            Literal::Int(_) => "an integer",
            Literal::Float(_) => "a number",
            Literal::Str(_) => "a string",
            Literal::List(_) => "a list",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Int(value) => Some(*value as f64),
            Literal::Float(value) => Some(*value),
            _ => None,
        }
    }
}

/// One statement: `Name(positional, ..., keyword=value, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub line: usize,
    pub name: String,
    pub args: Vec<Literal>,
    pub kwargs: Vec<(String, Literal)>,
}

/// Parse a whole script.
pub fn parse(source: &str) -> Result<Vec<Call>, ScriptError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let mut calls = Vec::new();
    while let Some(call) = parser.statement()? {
        calls.push(call);
    }
    Ok(calls)
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |spanned| spanned.line)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|spanned| &spanned.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ScriptError> {
        let line = self.line();
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ScriptError::syntax(
                line,
                format!("expected '{expected}', found '{token}'"),
            )),
            None => Err(ScriptError::syntax(
                line,
                format!("expected '{expected}', found end of script"),
            )),
        }
    }

    fn statement(&mut self) -> Result<Option<Call>, ScriptError> {
        while self.peek() == Some(&Token::Newline) {
            self.pos += 1;
        }
        let line = self.line();
        let name = match self.next() {
            None => return Ok(None),
            Some(Token::Name(name)) => name.clone(),
            Some(token) => {
                return Err(ScriptError::syntax(
                    line,
                    format!("expected a command, found '{token}'"),
                ));
            }
        };
        self.expect(&Token::BracketRoundOpen)?;

        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Literal)> = Vec::new();
        loop {
            if self.peek() == Some(&Token::BracketRoundClose) {
                self.pos += 1;
                break;
            }
            let keyword = match (self.peek(), self.tokens.get(self.pos + 1)) {
                (Some(Token::Name(key)), Some(next)) if next.token == Token::Equals => {
                    Some(key.clone())
                }
                _ => None,
            };
            if let Some(key) = keyword {
                self.pos += 2;
                if kwargs.iter().any(|(existing, _)| *existing == key) {
                    return Err(ScriptError::syntax(
                        self.line(),
                        format!("keyword '{key}' given twice"),
                    ));
                }
                let value = self.literal()?;
                kwargs.push((key, value));
            } else {
                if !kwargs.is_empty() {
                    return Err(ScriptError::syntax(
                        self.line(),
                        "positional argument follows keyword argument",
                    ));
                }
                args.push(self.literal()?);
            }
            match self.peek() {
                Some(Token::Comma) => self.pos += 1,
                Some(Token::BracketRoundClose) => {}
                _ => self.expect(&Token::BracketRoundClose)?,
            }
        }

        match self.peek() {
            None | Some(Token::Newline) => {}
            Some(token) => {
                return Err(ScriptError::syntax(
                    self.line(),
                    format!("unexpected '{token}' after statement"),
                ));
            }
        }
        Ok(Some(Call {
            line,
            name,
            args,
            kwargs,
        }))
    }

    fn literal(&mut self) -> Result<Literal, ScriptError> {
        let line = self.line();
        let Some(token) = self.next().cloned() else {
            return Err(ScriptError::syntax(line, "expected a value, found end of script"));
        };
        match token {
            Token::Str(text) => {
                let mut text = text;
                // adjacent literals concatenate
                while let Some(Token::Str(more)) = self.peek() {
                    text.push_str(more);
                    self.pos += 1;
                }
                Ok(Literal::Str(text))
            }
            Token::Int(value) => Ok(Literal::Int(value)),
            Token::Float(value) => Ok(Literal::Float(value)),
            Token::Minus => match self.literal()? {
                Literal::Int(value) => Ok(Literal::Int(-value)),
                Literal::Float(value) => Ok(Literal::Float(-value)),
                other => Err(ScriptError::syntax(
                    line,
                    format!("cannot negate {}", other.type_name()),
                )),
            },
            Token::Name(name) => match name.as_str() {
                "None" => Ok(Literal::None),
                "True" => Ok(Literal::Bool(true)),
                "False" => Ok(Literal::Bool(false)),
                "nan" => Ok(Literal::Float(f64::NAN)),
                "inf" => Ok(Literal::Float(f64::INFINITY)),
                _ => Err(ScriptError::syntax(line, format!("unknown name '{name}'"))),
            },
            Token::BracketSquareOpen => self.sequence(&Token::BracketSquareClose),
            Token::BracketRoundOpen => self.sequence(&Token::BracketRoundClose),
            other => Err(ScriptError::syntax(
                line,
                format!("expected a value, found '{other}'"),
            )),
        }
    }

    /// Items of a list or tuple after the opening bracket.
    fn sequence(&mut self, close: &Token) -> Result<Literal, ScriptError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Literal::List(items));
            }
            items.push(self.literal()?);
            match self.peek() {
                Some(Token::Comma) => self.pos += 1,
                _ => self.expect(close)?,
            }
            if self.tokens.get(self.pos - 1).map(|spanned| &spanned.token) == Some(close) {
                return Ok(Literal::List(items));
            }
        }
    }
}
