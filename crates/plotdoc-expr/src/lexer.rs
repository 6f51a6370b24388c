use std::fmt;

use crate::error::{ExprError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Power,
    BracketRoundOpen,
    BracketRoundClose,
    BracketSquareOpen,
    BracketSquareClose,
    Comma,
    Colon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(number) => write!(f, "{number}"),
            Token::Identifier(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Asterisk => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Percent => f.write_str("%"),
            Token::Power => f.write_str("**"),
            Token::BracketRoundOpen => f.write_str("("),
            Token::BracketRoundClose => f.write_str(")"),
            Token::BracketSquareOpen => f.write_str("["),
            Token::BracketSquareClose => f.write_str("]"),
            Token::Comma => f.write_str(","),
            Token::Colon => f.write_str(":"),
        }
    }
}

/// A token with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub offset: usize,
}

/// Split formula text into tokens.
///
/// Identifiers are ASCII words (`temp`, `temp_serr`); names containing other
/// characters can be written between backquotes (`` `flux (mJy)` ``).
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let ch = bytes[pos];
        let start = pos;
        let token = match ch {
            b' ' | b'\t' | b'\r' | b'\n' => {
                pos += 1;
                continue;
            }
            b'+' => {
                pos += 1;
                Token::Plus
            }
            b'-' => {
                pos += 1;
                Token::Minus
            }
            b'*' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2;
                Token::Power
            }
            b'*' => {
                pos += 1;
                Token::Asterisk
            }
            b'/' => {
                pos += 1;
                Token::Slash
            }
            b'%' => {
                pos += 1;
                Token::Percent
            }
            b'(' => {
                pos += 1;
                Token::BracketRoundOpen
            }
            b')' => {
                pos += 1;
                Token::BracketRoundClose
            }
            b'[' => {
                pos += 1;
                Token::BracketSquareOpen
            }
            b']' => {
                pos += 1;
                Token::BracketSquareClose
            }
            b',' => {
                pos += 1;
                Token::Comma
            }
            b':' => {
                pos += 1;
                Token::Colon
            }
            b'`' => {
                let Some(len) = source[pos + 1..].find('`') else {
                    return Err(ExprError::syntax(start, "unterminated quoted name"));
                };
                let name = &source[pos + 1..pos + 1 + len];
                if name.is_empty() {
                    return Err(ExprError::syntax(start, "empty quoted name"));
                }
                pos += len + 2;
                Token::Identifier(name.to_string())
            }
            b'0'..=b'9' | b'.' => {
                let (number, end) = lex_number(source, pos)?;
                pos = end;
                Token::Number(number)
            }
            c if c == b'_' || c.is_ascii_alphabetic() => {
                while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric())
                {
                    pos += 1;
                }
                Token::Identifier(source[start..pos].to_string())
            }
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('?');
                return Err(ExprError::syntax(
                    start,
                    format!("unexpected character '{ch}'"),
                ));
            }
        };
        tokens.push(Spanned {
            node: token,
            offset: start,
        });
    }

    Ok(tokens)
}

fn lex_number(source: &str, start: usize) -> Result<(f64, usize)> {
    let bytes = source.as_bytes();
    let mut pos = start;
    let digits = |pos: &mut usize| {
        let begin = *pos;
        while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
            *pos += 1;
        }
        *pos - begin
    };

    let mut mantissa = digits(&mut pos);
    if pos < bytes.len() && bytes[pos] == b'.' {
        pos += 1;
        mantissa += digits(&mut pos);
    }
    if mantissa == 0 {
        return Err(ExprError::syntax(start, "expected a number"));
    }
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp = pos + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        if digits(&mut exp) > 0 {
            pos = exp;
        }
    }

    let text = &source[start..pos];
    text.parse::<f64>()
        .map(|number| (number, pos))
        .map_err(|_| ExprError::syntax(start, format!("invalid number '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.node)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a**2 * -b"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Power,
                Token::Number(2.0),
                Token::Asterisk,
                Token::Minus,
                Token::Identifier("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5 .5 3e2 4.E-1"),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(0.5),
                Token::Number(300.0),
                Token::Number(0.4),
            ]
        );
    }

    #[test]
    fn test_quoted_name() {
        assert_eq!(
            kinds("`flux (mJy)` / 2"),
            vec![
                Token::Identifier("flux (mJy)".to_string()),
                Token::Slash,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_offsets_and_errors() {
        let tokens = tokenize("x + $").unwrap_err();
        assert_eq!(tokens, ExprError::syntax(4, "unexpected character '$'"));
        let tokens = tokenize("  y").unwrap();
        assert_eq!(tokens[0].offset, 2);
        assert!(tokenize("`open").is_err());
    }
}
