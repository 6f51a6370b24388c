use std::fmt;

use super::ScriptError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Str(String),
    Int(i64),
    Float(f64),
    BracketRoundOpen,
    BracketRoundClose,
    BracketSquareOpen,
    BracketSquareClose,
    Comma,
    Equals,
    Minus,
    Newline,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => f.write_str(name),
            Token::Str(_) => f.write_str("string"),
            Token::Int(value) => write!(f, "{value}"),
            Token::Float(value) => write!(f, "{value}"),
            Token::BracketRoundOpen => f.write_str("("),
            Token::BracketRoundClose => f.write_str(")"),
            Token::BracketSquareOpen => f.write_str("["),
            Token::BracketSquareClose => f.write_str("]"),
            Token::Comma => f.write_str(","),
            Token::Equals => f.write_str("="),
            Token::Minus => f.write_str("-"),
            Token::Newline => f.write_str("end of line"),
        }
    }
}

/// A token with the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

/// Split a script into tokens.
///
/// Line ends inside brackets are dropped so a call may span several lines;
/// `#` starts a comment running to the end of the line.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ScriptError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;
    let mut depth = 0usize;

    while pos < chars.len() {
        let ch = chars[pos];
        let start = line;
        let token = match ch {
            '\n' => {
                pos += 1;
                line += 1;
                if depth > 0 {
                    continue;
                }
                Token::Newline
            }
            ' ' | '\t' | '\r' | ';' => {
                pos += 1;
                continue;
            }
            '#' => {
                while pos < chars.len() && chars[pos] != '\n' {
                    pos += 1;
                }
                continue;
            }
            '\\' if chars.get(pos + 1) == Some(&'\n') => {
                pos += 2;
                line += 1;
                continue;
            }
            '(' | '[' => {
                pos += 1;
                depth += 1;
                if ch == '(' {
                    Token::BracketRoundOpen
                } else {
                    Token::BracketSquareOpen
                }
            }
            ')' | ']' => {
                pos += 1;
                depth = depth.saturating_sub(1);
                if ch == ')' {
                    Token::BracketRoundClose
                } else {
                    Token::BracketSquareClose
                }
            }
            ',' => {
                pos += 1;
                Token::Comma
            }
            '=' => {
                pos += 1;
                Token::Equals
            }
            '-' => {
                pos += 1;
                Token::Minus
            }
            '+' => {
                // unary plus
                pos += 1;
                continue;
            }
            '\'' | '"' => {
                let (text, end, lines) = lex_string(&chars, pos, start)?;
                pos = end;
                line += lines;
                Token::Str(text)
            }
            '0'..='9' | '.' => {
                let (token, end) = lex_number(&chars, pos, start)?;
                pos = end;
                token
            }
            c if c == '_' || c.is_alphabetic() => {
                let begin = pos;
                while pos < chars.len() && (chars[pos] == '_' || chars[pos].is_alphanumeric()) {
                    pos += 1;
                }
                Token::Name(chars[begin..pos].iter().collect())
            }
            other => {
                return Err(ScriptError::syntax(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        tokens.push(Spanned { token, line: start });
    }

    Ok(tokens)
}

/// Lex a quoted string starting at `start`. Returns the text, the position
/// after the closing quote and the number of line breaks it spanned.
fn lex_string(
    chars: &[char],
    start: usize,
    line: usize,
) -> Result<(String, usize, usize), ScriptError> {
    let quote = chars[start];
    let triple = chars.get(start + 1) == Some(&quote) && chars.get(start + 2) == Some(&quote);
    let mut pos = start + if triple { 3 } else { 1 };
    let mut text = String::new();
    let mut lines = 0;

    loop {
        let Some(&ch) = chars.get(pos) else {
            return Err(ScriptError::syntax(line, "unterminated string"));
        };
        if ch == quote {
            if !triple {
                return Ok((text, pos + 1, lines));
            }
            if chars.get(pos + 1) == Some(&quote) && chars.get(pos + 2) == Some(&quote) {
                return Ok((text, pos + 3, lines));
            }
        }
        match ch {
            '\n' if !triple => {
                return Err(ScriptError::syntax(line, "unterminated string"));
            }
            '\n' => {
                lines += 1;
                text.push('\n');
                pos += 1;
            }
            '\\' => {
                let Some(&next) = chars.get(pos + 1) else {
                    return Err(ScriptError::syntax(line, "unterminated string"));
                };
                pos += 2;
                match next {
                    '\\' => text.push('\\'),
                    '\'' => text.push('\''),
                    '"' => text.push('"'),
                    'n' => text.push('\n'),
                    'r' => text.push('\r'),
                    't' => text.push('\t'),
                    '0' => text.push('\0'),
                    '\n' => lines += 1,
                    'x' => {
                        let digits: String = chars.iter().skip(pos).take(2).collect();
                        let decoded = u32::from_str_radix(&digits, 16)
                            .ok()
                            .filter(|_| digits.len() == 2)
                            .and_then(char::from_u32)
                            .ok_or_else(|| {
                                ScriptError::syntax(line + lines, format!("bad escape '\\x{digits}'"))
                            })?;
                        text.push(decoded);
                        pos += 2;
                    }
                    other => {
                        text.push('\\');
                        text.push(other);
                    }
                }
            }
            ch => {
                text.push(ch);
                pos += 1;
            }
        }
    }
}

fn lex_number(chars: &[char], start: usize, line: usize) -> Result<(Token, usize), ScriptError> {
    let mut pos = start;
    let digits = |pos: &mut usize| {
        let begin = *pos;
        while *pos < chars.len() && chars[*pos].is_ascii_digit() {
            *pos += 1;
        }
        *pos - begin
    };

    let mut mantissa = digits(&mut pos);
    let mut float = false;
    if pos < chars.len() && chars[pos] == '.' {
        pos += 1;
        float = true;
        mantissa += digits(&mut pos);
    }
    if mantissa == 0 {
        return Err(ScriptError::syntax(line, "expected a number"));
    }
    if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
        let mut exp = pos + 1;
        if exp < chars.len() && (chars[exp] == '+' || chars[exp] == '-') {
            exp += 1;
        }
        if digits(&mut exp) > 0 {
            pos = exp;
            float = true;
        }
    }

    let text: String = chars[start..pos].iter().collect();
    let token = if float {
        text.parse().map(Token::Float).ok()
    } else {
        text.parse().map(Token::Int).ok()
    };
    token
        .map(|token| (token, pos))
        .ok_or_else(|| ScriptError::syntax(line, format!("invalid number '{text}'")))
}
