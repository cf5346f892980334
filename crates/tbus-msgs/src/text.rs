//! ---
//! tbus_section: "02-messaging-data-model"
//! tbus_subsection: "module"
//! tbus_type: "source"
//! tbus_scope: "code"
//! tbus_description: "Runtime message registry, dynamic messages and text format."
//! tbus_version: "v0.0.0-prealpha"
//! tbus_owner: "tbd"
//! ---
//! Text-format payloads: `name: value` pairs with nested `name { ... }` blocks.
//!
//! ```text
//! position { x: 1 y: 2.5 }   # nested block, the colon is optional
//! name: "base" 'link'        # adjacent strings concatenate
//! ```

use std::collections::HashSet;
use std::iter::Peekable;
use std::str::Chars;

use crate::descriptor::FieldKind;
use crate::{DynamicMessage, TextErrorReason, TextFormatError, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Number(String),
    Symbol(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(ident) => format!("identifier `{}`", ident),
            Token::Str(_) => "string literal".to_owned(),
            Token::Number(number) => format!("number `{}`", number),
            Token::Symbol(symbol) => format!("`{}`", symbol),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, reason: TextErrorReason) -> TextFormatError {
        TextFormatError {
            line,
            column,
            reason,
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Tokenize the whole input; the second element is the end position.
    fn tokenize(mut self) -> Result<(Vec<Spanned>, (usize, usize)), TextFormatError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.column);
            let Some(&c) = self.chars.peek() else {
                return Ok((tokens, (line, column)));
            };
            let token = match c {
                '"' | '\'' => Token::Str(self.string(line, column)?),
                c if c.is_ascii_alphabetic() || c == '_' => Token::Ident(self.take_while(|c| {
                    c.is_ascii_alphanumeric() || c == '_'
                })),
                c if c.is_ascii_digit() || c == '.' => Token::Number(self.number()),
                ':' | '{' | '}' | '<' | '>' | ',' | ';' | '-' => {
                    self.bump();
                    Token::Symbol(c)
                }
                other => {
                    return Err(self.error(line, column, TextErrorReason::UnexpectedChar(other)))
                }
            };
            tokens.push(Spanned {
                token,
                line,
                column,
            });
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    fn number(&mut self) -> String {
        let mut raw = String::new();
        while let Some(&c) = self.chars.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && matches!(raw.chars().last(), Some('e' | 'E'))
                && !raw.starts_with("0x")
                && !raw.starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '.' || exponent_sign {
                raw.push(c);
                self.bump();
            } else {
                break;
            }
        }
        raw
    }

    fn string(&mut self, line: usize, column: usize) -> Result<String, TextFormatError> {
        let quote = self.bump();
        let mut bytes = Vec::new();
        loop {
            let (esc_line, esc_column) = (self.line, self.column);
            match self.bump() {
                None | Some('\n') => {
                    return Err(self.error(line, column, TextErrorReason::UnterminatedString))
                }
                Some(c) if Some(c) == quote => break,
                Some('\\') => {
                    let Some(escape) = self.bump() else {
                        return Err(self.error(line, column, TextErrorReason::UnterminatedString));
                    };
                    match escape {
                        'n' => bytes.push(b'\n'),
                        't' => bytes.push(b'\t'),
                        'r' => bytes.push(b'\r'),
                        'a' => bytes.push(0x07),
                        'b' => bytes.push(0x08),
                        'f' => bytes.push(0x0c),
                        'v' => bytes.push(0x0b),
                        '\\' | '\'' | '"' | '?' => bytes.push(escape as u8),
                        '0'..='7' => {
                            let mut value = escape.to_digit(8).unwrap_or(0);
                            for _ in 0..2 {
                                match self.chars.peek().and_then(|c| c.to_digit(8)) {
                                    Some(digit) => {
                                        value = value * 8 + digit;
                                        self.bump();
                                    }
                                    None => break,
                                }
                            }
                            bytes.push((value & 0xff) as u8);
                        }
                        'x' | 'X' => {
                            let mut value = 0u32;
                            let mut digits = 0;
                            while digits < 2 {
                                match self.chars.peek().and_then(|c| c.to_digit(16)) {
                                    Some(digit) => {
                                        value = value * 16 + digit;
                                        digits += 1;
                                        self.bump();
                                    }
                                    None => break,
                                }
                            }
                            if digits == 0 {
                                return Err(self.error(
                                    esc_line,
                                    esc_column,
                                    TextErrorReason::InvalidEscape(escape),
                                ));
                            }
                            bytes.push(value as u8);
                        }
                        other => {
                            return Err(self.error(
                                esc_line,
                                esc_column,
                                TextErrorReason::InvalidEscape(other),
                            ))
                        }
                    }
                }
                Some(c) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: (usize, usize),
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_symbol(&self, symbol: char) -> bool {
        matches!(self.peek(), Some(Spanned { token: Token::Symbol(c), .. }) if *c == symbol)
    }

    fn at(spanned: &Spanned, reason: TextErrorReason) -> TextFormatError {
        TextFormatError {
            line: spanned.line,
            column: spanned.column,
            reason,
        }
    }

    fn at_end(&self, expected: &'static str) -> TextFormatError {
        TextFormatError {
            line: self.end.0,
            column: self.end.1,
            reason: TextErrorReason::UnexpectedEnd(expected),
        }
    }

    fn expect_next(&mut self, expected: &'static str) -> Result<Spanned, TextFormatError> {
        self.next().ok_or_else(|| self.at_end(expected))
    }

    /// Parse fields into `message` until `close` (or end of input at top level).
    fn fields(
        &mut self,
        message: &mut DynamicMessage,
        close: Option<char>,
    ) -> Result<(), TextFormatError> {
        let mut seen = HashSet::new();
        loop {
            let Some(spanned) = self.next() else {
                return match close {
                    Some('}') => Err(self.at_end("`}`")),
                    Some(_) => Err(self.at_end("`>`")),
                    None => Ok(()),
                };
            };
            let name = match &spanned.token {
                Token::Symbol(c) if Some(*c) == close => return Ok(()),
                Token::Ident(name) => name.clone(),
                other => {
                    return Err(Self::at(
                        &spanned,
                        TextErrorReason::Unexpected {
                            expected: "field name",
                            found: other.describe(),
                        },
                    ))
                }
            };
            if !seen.insert(name.clone()) {
                return Err(Self::at(&spanned, TextErrorReason::DuplicateField(name)));
            }
            let kind = message
                .descriptor()
                .field(&name)
                .map(|field| field.kind().clone())
                .ok_or_else(|| {
                    Self::at(
                        &spanned,
                        TextErrorReason::Field(crate::FieldError::UnknownField {
                            type_name: message.type_name().to_owned(),
                            field: name.clone(),
                        }),
                    )
                })?;

            if let FieldKind::Message(_) = kind {
                if self.peek_symbol(':') {
                    self.next();
                }
                let open = self.expect_next("`{`")?;
                let nested_close = match open.token {
                    Token::Symbol('{') => '}',
                    Token::Symbol('<') => '>',
                    ref other => {
                        return Err(Self::at(
                            &open,
                            TextErrorReason::Unexpected {
                                expected: "`{`",
                                found: other.describe(),
                            },
                        ))
                    }
                };
                let nested = message
                    .message_mut(&name)
                    .map_err(|err| Self::at(&spanned, err.into()))?;
                self.fields(nested, Some(nested_close))?;
            } else {
                let colon = self.expect_next("`:`")?;
                if colon.token != Token::Symbol(':') {
                    return Err(Self::at(
                        &colon,
                        TextErrorReason::Unexpected {
                            expected: "`:`",
                            found: colon.token.describe(),
                        },
                    ));
                }
                let (value, position) = self.scalar(&name, &kind)?;
                message
                    .set(&name, value)
                    .map_err(|err| Self::at(&position, err.into()))?;
            }

            if self.peek_symbol(',') || self.peek_symbol(';') {
                self.next();
            }
        }
    }

    fn scalar(&mut self, field: &str, kind: &FieldKind) -> Result<(Value, Spanned), TextFormatError> {
        let first = self.expect_next("value")?;
        let invalid = |spanned: &Spanned, literal: String| {
            Self::at(
                spanned,
                TextErrorReason::InvalidLiteral {
                    field: field.to_owned(),
                    kind: kind.name().to_owned(),
                    literal,
                },
            )
        };

        match kind {
            FieldKind::String => {
                let Token::Str(mut text) = first.token.clone() else {
                    return Err(Self::at(
                        &first,
                        TextErrorReason::Unexpected {
                            expected: "string literal",
                            found: first.token.describe(),
                        },
                    ));
                };
                while let Some(Spanned {
                    token: Token::Str(more),
                    ..
                }) = self.peek()
                {
                    text.push_str(more);
                    self.next();
                }
                Ok((Value::String(text), first))
            }
            FieldKind::Bool => {
                let value = match &first.token {
                    Token::Ident(word) => match word.as_str() {
                        "true" | "True" | "t" => Some(true),
                        "false" | "False" | "f" => Some(false),
                        _ => None,
                    },
                    Token::Number(number) => match number.as_str() {
                        "1" => Some(true),
                        "0" => Some(false),
                        _ => None,
                    },
                    _ => None,
                };
                match value {
                    Some(value) => Ok((Value::Bool(value), first)),
                    None => Err(invalid(&first, first.token.describe())),
                }
            }
            FieldKind::Int32 | FieldKind::Int64 | FieldKind::UInt32 | FieldKind::UInt64 => {
                let (negative, literal) = self.signed(first.clone())?;
                let Token::Number(raw) = &literal.token else {
                    return Err(invalid(&literal, literal.token.describe()));
                };
                let magnitude = parse_integer(raw).ok_or_else(|| invalid(&literal, raw.clone()))?;
                let value = if negative {
                    0i64.checked_sub_unsigned(magnitude)
                        .map(Value::Int)
                        .ok_or_else(|| invalid(&literal, format!("-{}", raw)))?
                } else {
                    Value::UInt(magnitude)
                };
                Ok((value, first))
            }
            FieldKind::Float | FieldKind::Double => {
                let (negative, literal) = self.signed(first.clone())?;
                let magnitude = match &literal.token {
                    Token::Number(raw) => parse_float(raw),
                    Token::Ident(word) => match word.to_ascii_lowercase().as_str() {
                        "inf" | "infinity" => Some(f64::INFINITY),
                        "nan" => Some(f64::NAN),
                        _ => None,
                    },
                    _ => None,
                }
                .ok_or_else(|| invalid(&literal, literal.token.describe()))?;
                Ok((Value::Double(if negative { -magnitude } else { magnitude }), first))
            }
            FieldKind::Message(_) => Err(invalid(&first, first.token.describe())),
        }
    }

    /// Consume an optional leading `-`, returning the literal that follows.
    fn signed(&mut self, first: Spanned) -> Result<(bool, Spanned), TextFormatError> {
        if first.token == Token::Symbol('-') {
            Ok((true, self.expect_next("number")?))
        } else {
            Ok((false, first))
        }
    }
}

fn parse_integer(raw: &str) -> Option<u64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        raw.parse().ok()
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    let trimmed = raw.strip_suffix(|c| c == 'f' || c == 'F').unwrap_or(raw);
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        return parse_integer(raw).map(|v| v as f64);
    }
    trimmed.parse().ok()
}

/// Parse `text` and merge its fields into `message`.
///
/// Fields already present in `message` but absent from `text` are kept.
/// On error `message` may be partially updated.
pub fn merge(text: &str, message: &mut DynamicMessage) -> Result<(), TextFormatError> {
    let (tokens, end) = Lexer::new(text).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end,
    };
    parser.fields(message, None)
}
