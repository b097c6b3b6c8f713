//! A restricted literal evaluator for row tuples lifted out of SQL dumps.
//!
//! Only a bracketed list of parenthesised tuples of scalars is accepted:
//! integers, floats, quoted strings, `True`, `False` and `None`. Anything
//! else (bare identifiers such as `NULL`, operators, nested containers)
//! is rejected, so arbitrary dump content can never be interpreted as
//! anything but data.

use std::fmt;

use crate::errors::AppError;

/// A scalar value found inside a row tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => f.write_str(&format_float(*v)),
            Literal::Str(s) => f.write_str(s),
        }
    }
}

/// Shortest round-trip rendering in Python's `repr` shape: positional with a
/// trailing `.0` for integral values (`3.0`, never `3`), and scientific with a
/// signed two-digit exponent below `1e-4` or from `1e16` up (`1e+20`, `1.5e-05`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let parts = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| exp.parse::<i32>().ok().map(|exp| (mantissa, exp)));
    if let Some((mantissa, exp)) = parts {
        if !(-4..16).contains(&exp) {
            let sign = if exp < 0 { '-' } else { '+' };
            return format!("{}e{}{:02}", mantissa, sign, exp.abs());
        }
    }

    let rendered = value.to_string();
    if rendered.contains('.') {
        rendered
    } else {
        format!("{}.0", rendered)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Sign(bool),
    /// Unsigned magnitude; a preceding sign is applied by the parser.
    Int(u64),
    Float(f64),
    Str(String),
    Name(String),
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, at: usize, message: impl Into<String>) -> AppError {
        AppError::LiteralParse {
            offset: at,
            message: message.into(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<(usize, Token)>, AppError> {
        let mut tokens = vec![];

        while let Some(c) = self.peek() {
            let start = self.pos;
            let token = match c {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '[' => {
                    self.bump();
                    Token::LBracket
                }
                ']' => {
                    self.bump();
                    Token::RBracket
                }
                '(' => {
                    self.bump();
                    Token::LParen
                }
                ')' => {
                    self.bump();
                    Token::RParen
                }
                ',' => {
                    self.bump();
                    Token::Comma
                }
                '-' | '+' => {
                    self.bump();
                    Token::Sign(c == '-')
                }
                '\'' | '"' => self.read_string(c)?,
                '.' if self.peek_second().is_some_and(|n| n.is_ascii_digit()) => {
                    self.read_number()?
                }
                c if c.is_ascii_digit() => self.read_number()?,
                c if c.is_alphabetic() || c == '_' => {
                    let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
                    Token::Name(name.to_string())
                }
                other => {
                    return Err(self.error(start, format!("unexpected character {:?}", other)))
                }
            };

            tokens.push((start, token));
        }

        Ok(tokens)
    }

    fn take_while<F>(&mut self, cond: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while self.peek().is_some_and(&cond) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn take_digits(&mut self) -> Result<&'a str, AppError> {
        let start = self.pos;
        let digits = self.take_while(|c| c.is_ascii_digit() || c == '_');
        if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
            return Err(self.error(start, "misplaced underscore in number"));
        }
        Ok(digits)
    }

    fn read_number(&mut self) -> Result<Token, AppError> {
        let start = self.pos;
        let integral = self.take_digits()?;
        let mut is_float = false;

        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            self.take_digits()?;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.take_digits()?.is_empty() {
                return Err(self.error(mark, "malformed exponent"));
            }
            is_float = true;
        }

        if self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            return Err(self.error(self.pos, "invalid character in number"));
        }

        let text = self.input[start..self.pos].replace('_', "");
        if is_float {
            return text
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(start, format!("invalid float {:?}", text)));
        }

        if integral.starts_with('0') && !integral.trim_start_matches(['0', '_']).is_empty() {
            return Err(self.error(start, "leading zeros in integer"));
        }

        text.parse::<u64>()
            .map(Token::Int)
            .map_err(|_| self.error(start, format!("integer out of range {:?}", text)))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, AppError> {
        let start = self.pos;
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(start, "unterminated string")),
                Some(c) if c == quote => break,
                Some('\\') => {
                    let escape_at = self.pos;
                    match self.bump() {
                        None => return Err(self.error(start, "unterminated string")),
                        Some('\\') => value.push('\\'),
                        Some('\'') => value.push('\''),
                        Some('"') => value.push('"'),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('0') => value.push('\0'),
                        Some('\n') => {}
                        Some('x') => value.push(self.read_code_point(escape_at, 2)?),
                        Some('u') => value.push(self.read_code_point(escape_at, 4)?),
                        Some('U') => value.push(self.read_code_point(escape_at, 8)?),
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                    }
                }
                Some(c) => value.push(c),
            }
        }

        Ok(Token::Str(value))
    }

    fn read_code_point(&mut self, at: usize, width: usize) -> Result<char, AppError> {
        let digits: String = self.rest().chars().take(width).collect();
        if digits.len() != width || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(self.error(at, "truncated escape sequence"));
        }
        self.pos += width;

        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(at, "escape is not a valid code point"))
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    i: usize,
    end: usize,
}

impl Parser {
    fn head(&self) -> Option<&Token> {
        self.tokens.get(self.i).map(|(_, token)| token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.i)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) {
        self.i += 1;
    }

    fn bail(&self, message: &str) -> AppError {
        AppError::LiteralParse {
            offset: self.offset(),
            message: format!("{}, found {}", message, describe(self.head())),
        }
    }

    fn must_swallow(&mut self, expected: &Token) -> Result<(), AppError> {
        if self.head() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.bail(&format!("expected {}", describe(Some(expected)))))
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Vec<Literal>>, AppError> {
        self.must_swallow(&Token::LBracket)?;
        let mut rows = vec![];

        while self.head() != Some(&Token::RBracket) {
            rows.push(self.parse_tuple()?);
            match self.head() {
                Some(Token::Comma) => self.advance(),
                Some(Token::RBracket) => {}
                _ => return Err(self.bail("expected ',' or ']'")),
            }
        }
        self.must_swallow(&Token::RBracket)?;

        if self.head().is_some() {
            return Err(self.bail("unexpected trailing input"));
        }

        Ok(rows)
    }

    fn parse_tuple(&mut self) -> Result<Vec<Literal>, AppError> {
        self.must_swallow(&Token::LParen)?;
        let mut fields = vec![];
        let mut saw_comma = false;

        while self.head() != Some(&Token::RParen) {
            fields.push(self.parse_scalar()?);
            match self.head() {
                Some(Token::Comma) => {
                    saw_comma = true;
                    self.advance();
                }
                Some(Token::RParen) => {}
                _ => return Err(self.bail("expected ',' or ')'")),
            }
        }
        self.must_swallow(&Token::RParen)?;

        // `(x)` is a parenthesised scalar, not a one-element tuple.
        if fields.len() == 1 && !saw_comma {
            return Err(AppError::LiteralParse {
                offset: self.offset(),
                message: "expected a tuple, found a parenthesised value".into(),
            });
        }

        Ok(fields)
    }

    fn signed_int(&self, negative: bool, magnitude: u64) -> Result<i64, AppError> {
        let value = if negative {
            -i128::from(magnitude)
        } else {
            i128::from(magnitude)
        };
        i64::try_from(value).map_err(|_| AppError::LiteralParse {
            offset: self.offset(),
            message: format!("integer out of range {}", value),
        })
    }

    fn parse_scalar(&mut self) -> Result<Literal, AppError> {
        let Some(head) = self.head().cloned() else {
            return Err(self.bail("expected a value"));
        };

        match head {
            Token::Sign(negative) => {
                self.advance();
                match self.head().cloned() {
                    Some(Token::Int(v)) => {
                        let value = self.signed_int(negative, v)?;
                        self.advance();
                        Ok(Literal::Int(value))
                    }
                    Some(Token::Float(v)) => {
                        self.advance();
                        Ok(Literal::Float(if negative { -v } else { v }))
                    }
                    _ => Err(self.bail("expected a number after sign")),
                }
            }
            Token::Int(v) => {
                let value = self.signed_int(false, v)?;
                self.advance();
                Ok(Literal::Int(value))
            }
            Token::Float(v) => {
                self.advance();
                Ok(Literal::Float(v))
            }
            Token::Str(s) => {
                self.advance();
                let mut value = s;
                // Adjacent string literals concatenate.
                while let Some(Token::Str(next)) = self.head() {
                    value.push_str(next);
                    self.advance();
                }
                Ok(Literal::Str(value))
            }
            Token::Name(name) => {
                let literal = match name.as_str() {
                    "True" => Literal::Bool(true),
                    "False" => Literal::Bool(false),
                    "None" => Literal::None,
                    _ => return Err(self.bail("expected a literal value")),
                };
                self.advance();
                Ok(literal)
            }
            Token::LParen | Token::LBracket => Err(self.bail("nested containers are not allowed")),
            _ => Err(self.bail("expected a value")),
        }
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        None => "end of input".to_string(),
        Some(Token::LBracket) => "'['".to_string(),
        Some(Token::RBracket) => "']'".to_string(),
        Some(Token::LParen) => "'('".to_string(),
        Some(Token::RParen) => "')'".to_string(),
        Some(Token::Comma) => "','".to_string(),
        Some(Token::Sign(true)) => "'-'".to_string(),
        Some(Token::Sign(false)) => "'+'".to_string(),
        Some(Token::Int(v)) => format!("integer {}", v),
        Some(Token::Float(v)) => format!("float {}", format_float(*v)),
        Some(Token::Str(s)) => format!("string {:?}", s),
        Some(Token::Name(n)) => format!("name {}", n),
    }
}

/// Parses `[(...), (...), ...]` into rows of scalar literals.
///
/// # Errors
///
/// Returns [`AppError::LiteralParse`] for anything that is not a list of
/// tuples of scalar literals.
pub fn parse_tuple_list(input: &str) -> Result<Vec<Vec<Literal>>, AppError> {
    let tokens = Lexer::new(input).tokenize()?;
    let mut parser = Parser {
        tokens,
        i: 0,
        end: input.len(),
    };
    parser.parse_list()
}
