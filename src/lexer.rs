use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ast::{Keyword, NumberLiteral, Token, TokenKind};

/// Errors raised while turning source text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("unterminated literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid escape sequence '\\{ch}' at offset {offset}")]
    InvalidEscape { ch: char, offset: usize },

    #[error("invalid numeric literal '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { offset, .. }
            | LexError::UnterminatedString { offset }
            | LexError::InvalidEscape { offset, .. }
            | LexError::InvalidNumber { offset, .. } => *offset,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn text_from(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    let escape_offset = self.position;
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('0') => result.push('\0'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some('u') => {
                            result.push(self.read_unicode_escape(escape_offset)?);
                            continue;
                        }
                        Some(ch) => {
                            return Err(LexError::InvalidEscape {
                                ch,
                                offset: escape_offset,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { offset: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { offset: start })
    }

    /// Reads the `XXXX` of a `\uXXXX` escape; the cursor sits on the `u`.
    fn read_unicode_escape(&mut self, escape_offset: usize) -> Result<char, LexError> {
        self.advance();
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(16))
                .ok_or(LexError::InvalidEscape {
                    ch: 'u',
                    offset: escape_offset,
                })?;
            code = code * 16 + digit;
            self.advance();
        }
        char::from_u32(code).ok_or(LexError::InvalidEscape {
            ch: 'u',
            offset: escape_offset,
        })
    }

    fn read_digits(&mut self, radix: u32) -> String {
        let mut digits = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_digit(radix) {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        digits
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;

        if self.current_char() == Some('0')
            && matches!(self.peek_char(1), Some('x' | 'X'))
            && self.peek_char(2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.advance();
            self.advance();
            let digits = self.read_digits(16);
            let suffix = self.read_identifier().to_lowercase();
            let text = self.text_from(start);
            let invalid = || LexError::InvalidNumber {
                text: text.clone(),
                offset: start,
            };
            let value = u64::from_str_radix(&digits, 16).map_err(|_| invalid())?;
            let literal = integer_literal(value, &suffix).ok_or_else(invalid)?;
            return Ok(Token::new(TokenKind::Number(literal), text, start));
        }

        let mut number = self.read_digits(10);
        let mut is_real = false;

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_real = true;
            number.push('.');
            self.advance();
            number.push_str(&self.read_digits(10));
        }

        let has_exponent = matches!(self.current_char(), Some('e' | 'E'))
            && match self.peek_char(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_char(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
        if has_exponent {
            is_real = true;
            number.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.current_char() {
                number.push(sign);
                self.advance();
            }
            number.push_str(&self.read_digits(10));
        }

        let suffix = self.read_identifier().to_lowercase();
        let text = self.text_from(start);
        let invalid = || LexError::InvalidNumber {
            text: text.clone(),
            offset: start,
        };

        let literal = match suffix.as_str() {
            "f" => NumberLiteral::Single(number.parse::<f32>().map_err(|_| invalid())?),
            "d" => NumberLiteral::Double(number.parse::<f64>().map_err(|_| invalid())?),
            "m" => NumberLiteral::Decimal(parse_decimal(&number).ok_or_else(invalid)?),
            "" if is_real => NumberLiteral::Double(number.parse::<f64>().map_err(|_| invalid())?),
            _ if is_real => return Err(invalid()),
            _ => {
                let value = number.parse::<u64>().map_err(|_| invalid())?;
                integer_literal(value, &suffix).ok_or_else(invalid)?
            }
        };

        Ok(Token::new(TokenKind::Number(literal), text, start))
    }

    fn single(&mut self, kind: TokenKind, text: &str) -> Token {
        let offset = self.position;
        self.advance();
        Token::new(kind, text, offset)
    }

    fn double(&mut self, kind: TokenKind, text: &str) -> Token {
        let offset = self.position;
        self.advance();
        self.advance();
        Token::new(kind, text, offset)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let offset = self.position;

        let token = match self.current_char() {
            None => Token::new(TokenKind::Eof, "", offset),
            Some('+') => self.single(TokenKind::Plus, "+"),
            Some('-') => self.single(TokenKind::Minus, "-"),
            Some('*') => self.single(TokenKind::Star, "*"),
            Some('/') => self.single(TokenKind::Slash, "/"),
            Some('%') => self.single(TokenKind::Percent, "%"),
            Some('.') => self.single(TokenKind::Dot, "."),
            Some(',') => self.single(TokenKind::Comma, ","),
            Some(':') => self.single(TokenKind::Colon, ":"),
            Some('(') => self.single(TokenKind::LParen, "("),
            Some(')') => self.single(TokenKind::RParen, ")"),
            Some('[') => self.single(TokenKind::LBracket, "["),
            Some(']') => self.single(TokenKind::RBracket, "]"),
            Some('{') => self.single(TokenKind::LBrace, "{"),
            Some('}') => self.single(TokenKind::RBrace, "}"),
            Some('!') => match self.peek_char(1) {
                Some('=') => self.double(TokenKind::NotEq, "!="),
                _ => self.single(TokenKind::Bang, "!"),
            },
            Some('=') => match self.peek_char(1) {
                Some('=') => self.double(TokenKind::EqEq, "=="),
                Some('>') => self.double(TokenKind::Arrow, "=>"),
                _ => self.single(TokenKind::EqEq, "="),
            },
            Some('<') => match self.peek_char(1) {
                Some('=') => self.double(TokenKind::LtEq, "<="),
                Some('>') => self.double(TokenKind::NotEq, "<>"),
                _ => self.single(TokenKind::Lt, "<"),
            },
            Some('>') => match self.peek_char(1) {
                Some('=') => self.double(TokenKind::GtEq, ">="),
                _ => self.single(TokenKind::Gt, ">"),
            },
            Some('?') => match self.peek_char(1) {
                Some('?') => self.double(TokenKind::QuestionQuestion, "??"),
                _ => self.single(TokenKind::Question, "?"),
            },
            Some('&') if self.peek_char(1) == Some('&') => self.double(TokenKind::AmpAmp, "&&"),
            Some('|') if self.peek_char(1) == Some('|') => {
                self.double(TokenKind::PipePipe, "||")
            }
            Some('"') => {
                let value = self.read_string('"')?;
                Token::new(TokenKind::String(value), self.text_from(offset), offset)
            }
            Some('\'') => {
                let value = self.read_string('\'')?;
                let mut chars = value.chars();
                let kind = match (chars.next(), chars.next()) {
                    (Some(ch), None) => TokenKind::Char(ch),
                    _ => TokenKind::String(value),
                };
                Token::new(kind, self.text_from(offset), offset)
            }
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                let kind = match Keyword::from_ident(&ident) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Identifier(ident.clone()),
                };
                Token::new(kind, ident, offset)
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => return Err(LexError::UnexpectedCharacter { ch, offset }),
        };

        Ok(token)
    }

    /// Lexes the whole input eagerly. The last token is always `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Picks the integer subtype for a literal: the first type in the suffix's
/// candidate list that can hold the value.
fn integer_literal(value: u64, suffix: &str) -> Option<NumberLiteral> {
    let fits_i32 = value <= i32::MAX as u64;
    let fits_u32 = value <= u32::MAX as u64;
    let fits_i64 = value <= i64::MAX as u64;
    let literal = match suffix {
        "" if fits_i32 => NumberLiteral::Int32(value as i32),
        "" | "u" if fits_u32 => NumberLiteral::UInt32(value as u32),
        "" | "l" if fits_i64 => NumberLiteral::Int64(value as i64),
        "" | "u" | "l" | "ul" | "lu" => NumberLiteral::UInt64(value),
        "f" => NumberLiteral::Single(value as f32),
        "d" => NumberLiteral::Double(value as f64),
        "m" => NumberLiteral::Decimal(Decimal::from(value)),
        _ => return None,
    };
    Some(literal)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.contains('e') {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

#[test]
fn test_keywords_ignore_case() {
    let mut lexer = Lexer::new("it IT Null TRUE false New as AND or NOT mod Np IIF");
    let expected = [
        Keyword::It,
        Keyword::It,
        Keyword::Null,
        Keyword::True,
        Keyword::False,
        Keyword::New,
        Keyword::As,
        Keyword::And,
        Keyword::Or,
        Keyword::Not,
        Keyword::Mod,
        Keyword::Np,
        Keyword::Iif,
    ];
    for keyword in expected {
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Keyword(keyword));
    }
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_conversion_call() {
    let mut lexer = Lexer::new("long?(it)");
    assert_eq!(
        lexer.next_token().unwrap().kind,
        TokenKind::Identifier("long".to_string())
    );
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Question);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::LParen);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Keyword(Keyword::It));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::RParen);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_number_subtypes() {
    let cases = [
        ("42", NumberLiteral::Int32(42)),
        ("3000000000", NumberLiteral::UInt32(3_000_000_000)),
        ("42L", NumberLiteral::Int64(42)),
        ("42u", NumberLiteral::UInt32(42)),
        ("42UL", NumberLiteral::UInt64(42)),
        ("1.5", NumberLiteral::Double(1.5)),
        ("1.5f", NumberLiteral::Single(1.5)),
        ("2m", NumberLiteral::Decimal(Decimal::from(2))),
        ("0xFF", NumberLiteral::Int32(255)),
    ];
    for (input, expected) in cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Number(expected), "input: {input}");
        assert_eq!(token.text, input);
    }
}
