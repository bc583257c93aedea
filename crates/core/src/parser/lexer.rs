//! Content stream tokenizer.
//!
//! Classifies raw bytes into typed tokens. The lexer reads through the
//! `ByteStream` trait one byte at a time, so it works the same way over a
//! single physical body or over a logical stream spanning several bodies.

use crate::error::{PdfError, Result};
use crate::io::ByteStream;
use crate::utils::{is_delimiter, is_keyword_end, is_whitespace};
use smol_str::SmolStr;

/// Token classes exposed to the content parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Numbers, names, literal strings, booleans and null
    Literal,
    /// Hexadecimal string
    Hex,
    /// Operator or unknown bare word
    Keyword,
    /// `[`, `]`, `<<`, `>>`
    Delimiter,
}

/// Content stream token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Integer value
    Int(i64),
    /// Floating point value
    Real(f64),
    /// Boolean value
    Bool(bool),
    /// `null`
    Null,
    /// Name (e.g., /F1), with `#xx` escapes decoded
    Name(String),
    /// Literal string `( ... )`
    String(Vec<u8>),
    /// Hexadecimal string `< ... >`
    HexString(Vec<u8>),
    /// Operator keyword (e.g., BT, Tj, re)
    Keyword(SmolStr),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

impl Token {
    /// Classify this token.
    pub const fn token_type(&self) -> TokenType {
        match self {
            Self::HexString(_) => TokenType::Hex,
            Self::Keyword(_) => TokenType::Keyword,
            Self::ArrayStart | Self::ArrayEnd | Self::DictStart | Self::DictEnd => {
                TokenType::Delimiter
            }
            _ => TokenType::Literal,
        }
    }
}

/// Tokenizer over a byte stream.
pub struct Lexer<S> {
    stream: S,
}

impl<S: ByteStream> Lexer<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Current position in the underlying stream.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Move the underlying stream to an absolute position.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.stream.seek(position)
    }

    /// Raw access to the underlying stream, bypassing tokenization.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Skip whitespace and comments, then report whether any byte remains.
    pub fn has_more(&mut self) -> bool {
        self.skip_whitespace();
        self.stream.peek_byte().is_some()
    }

    fn peek(&mut self) -> Option<u8> {
        self.stream.peek_byte()
    }

    fn advance(&mut self) -> Option<u8> {
        self.stream.read_byte()
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'%' {
                while let Some(c) = self.advance() {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                }
                continue;
            }
            if !is_whitespace(b) {
                return;
            }
            self.advance();
        }
    }

    /// Collect a run of regular characters.
    fn read_regular(&mut self) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Some(b) = self.peek() {
            if is_keyword_end(b) {
                break;
            }
            bytes.push(b);
            self.advance();
        }
        bytes
    }

    /// Parse a name (/Name)
    fn parse_name(&mut self) -> Result<Token> {
        self.advance(); // Skip '/'
        let raw = self.read_regular();
        let mut name = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' {
                if let (Some(h1), Some(h2)) = (
                    raw.get(i + 1).copied().and_then(hex_value),
                    raw.get(i + 2).copied().and_then(hex_value),
                ) {
                    name.push((h1 << 4) | h2);
                    i += 3;
                    continue;
                }
                // Invalid hex escape - drop '#' and keep the following chars
                i += 1;
                continue;
            }
            name.push(raw[i]);
            i += 1;
        }
        Ok(Token::Name(name_from_bytes(&name)))
    }

    /// Parse a number (integer or real)
    fn parse_number(&mut self, start: u64) -> Result<Token> {
        let mut text = Vec::new();
        let mut has_dot = false;

        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            text.push(sign);
            self.advance();
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                text.push(b);
                self.advance();
            } else if b == b'.' && !has_dot {
                has_dot = true;
                text.push(b);
                self.advance();
            } else {
                break;
            }
        }

        let s = String::from_utf8_lossy(&text);
        if has_dot {
            let val: f64 = s.parse().map_err(|_| PdfError::TokenError {
                pos: start,
                msg: format!("invalid real: {s}"),
            })?;
            Ok(Token::Real(val))
        } else {
            let val: i64 = s.parse().map_err(|_| PdfError::TokenError {
                pos: start,
                msg: format!("invalid int: {s}"),
            })?;
            Ok(Token::Int(val))
        }
    }

    /// Parse a literal string (...)
    fn parse_string(&mut self) -> Result<Token> {
        self.advance(); // Skip '('
        let mut result = Vec::new();
        let mut depth = 1;

        while depth > 0 {
            match self.advance() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'\r') => {
                        // Line continuation - skip \r and optional \n
                        if self.peek() == Some(b'\n') {
                            self.advance();
                        }
                    }
                    Some(b'\n') => {}
                    Some(c @ b'0'..=b'7') => {
                        // Octal escape (1-3 digits)
                        let mut octal = u32::from(c - b'0');
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d @ b'0'..=b'7') => {
                                    self.advance();
                                    octal = octal * 8 + u32::from(d - b'0');
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    // `\(`, `\)`, `\\` and unknown escapes keep the character
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(Token::String(result))
    }

    /// Parse a hex string <...>
    fn parse_hex_string(&mut self, start: u64) -> Result<Token> {
        self.advance(); // Skip '<'
        let mut result = Vec::new();
        let mut pending: Option<u8> = None;

        loop {
            match self.advance() {
                Some(b'>') => break,
                Some(c) if is_whitespace(c) => {}
                Some(c) => {
                    let nibble = hex_value(c).ok_or_else(|| PdfError::TokenError {
                        pos: start,
                        msg: format!("invalid hex digit {:?}", char::from(c)),
                    })?;
                    if let Some(high) = pending.take() {
                        result.push((high << 4) | nibble);
                    } else {
                        pending = Some(nibble);
                    }
                }
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        // Odd digit count: the final nibble is padded with zero
        if let Some(high) = pending {
            result.push(high << 4);
        }

        Ok(Token::HexString(result))
    }

    /// Parse a keyword
    fn parse_keyword(&mut self) -> Token {
        let bytes = self.read_regular();
        match bytes.as_slice() {
            b"true" => Token::Bool(true),
            b"false" => Token::Bool(false),
            b"null" => Token::Null,
            _ => Token::Keyword(SmolStr::new(name_from_bytes(&bytes))),
        }
    }

    /// Get next token with its start position.
    pub fn next_token(&mut self) -> Option<Result<(u64, Token)>> {
        self.skip_whitespace();
        let start = self.stream.position();
        let b = self.peek()?;

        let result = match b {
            b'/' => self.parse_name(),
            b'(' => self.parse_string(),
            b'<' => {
                self.advance();
                if self.peek() == Some(b'<') {
                    self.advance();
                    Ok(Token::DictStart)
                } else {
                    // Step back so the hex parser sees its opening '<'
                    match self.stream.seek(start) {
                        Ok(()) => self.parse_hex_string(start),
                        Err(e) => Err(e),
                    }
                }
            }
            b'>' => {
                self.advance();
                if self.peek() == Some(b'>') {
                    self.advance();
                    Ok(Token::DictEnd)
                } else {
                    Err(PdfError::TokenError {
                        pos: start,
                        msg: "unexpected '>'".into(),
                    })
                }
            }
            b'[' => {
                self.advance();
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.advance();
                Ok(Token::ArrayEnd)
            }
            c if is_delimiter(c) => {
                // ')', '{' and '}' have no meaning in content streams
                self.advance();
                Err(PdfError::TokenError {
                    pos: start,
                    msg: format!("unexpected delimiter {:?}", char::from(c)),
                })
            }
            b'+' | b'-' | b'.' | b'0'..=b'9' => match self.starts_number() {
                Ok(true) => self.parse_number(start),
                Ok(false) => Ok(self.parse_keyword()),
                Err(e) => Err(e),
            },
            _ => Ok(self.parse_keyword()),
        };

        Some(result.map(|token| (start, token)))
    }

    /// Look ahead (without consuming) to decide whether a sign or dot
    /// introduces a number.
    fn starts_number(&mut self) -> Result<bool> {
        let start = self.stream.position();
        let mut b = self.stream.read_byte();
        if matches!(b, Some(b'+' | b'-')) {
            b = self.stream.read_byte();
        }
        if b == Some(b'.') {
            b = self.stream.read_byte();
        }
        let number = matches!(b, Some(b'0'..=b'9'));
        self.stream.seek(start)?;
        Ok(number)
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

pub(crate) fn name_from_bytes(bytes: &[u8]) -> String {
    let mut name = String::with_capacity(bytes.len());
    for &b in bytes {
        name.push(char::from(b));
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Buffer;

    fn tokens(data: &'static [u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(Buffer::new(data));
        let mut out = Vec::new();
        while let Some(result) = lexer.next_token() {
            out.push(result.expect("tokenize").1);
        }
        out
    }

    #[test]
    fn test_token_types() {
        assert_eq!(Token::Int(1).token_type(), TokenType::Literal);
        assert_eq!(Token::HexString(vec![]).token_type(), TokenType::Hex);
        assert_eq!(Token::Keyword("BT".into()).token_type(), TokenType::Keyword);
        assert_eq!(Token::DictEnd.token_type(), TokenType::Delimiter);
    }

    #[test]
    fn test_sign_and_dot_disambiguation() {
        assert_eq!(
            tokens(b"-.5 +3 - . .x"),
            vec![
                Token::Real(-0.5),
                Token::Int(3),
                Token::Keyword("-".into()),
                Token::Keyword(".".into()),
                Token::Keyword(".x".into()),
            ]
        );
    }

    #[test]
    fn test_starts_number_leaves_position() {
        let mut lexer = Lexer::new(Buffer::new(&b"-7-x"[..]));
        assert!(lexer.starts_number().unwrap());
        assert_eq!(lexer.position(), 0);
        lexer.seek(2).unwrap();
        assert!(!lexer.starts_number().unwrap());
        assert_eq!(lexer.position(), 2);
    }
}
