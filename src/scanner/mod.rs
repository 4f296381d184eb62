//! # Scanner
//!
//! Turns Flint source text into tokens, one at a time: the compiler pulls
//! tokens on demand with [`Scanner::scan_token`], so no token vector is
//! ever materialised. A scanner is consumed by one compile; construct a
//! fresh one per source string.
//!
//! ## Lexical grammar
//!
//! - Punctuation: `( ) { } , . - + ; / *`
//! - Operators: `! != = == < <= > >=` (two-character forms via one byte of
//!   lookahead)
//! - String literals: `"..."`, which may span lines
//! - Numbers: digits with an optional fractional part; a trailing `.`
//!   without digits is left for the next token
//! - Identifiers: `[A-Za-z_][A-Za-z_0-9]*`, classified against the
//!   reserved words
//! - `//` starts a comment running to end of line
//!
//! The grammar is ASCII; the scanner walks bytes, and any stray byte
//! outside a string literal yields an error token.

pub mod token;

#[cfg(test)]
mod tests;

use token::{Token, TokenKind};

pub struct Scanner<'a> {
    source: &'a str,
    /// Byte offset of the start of the lexeme being scanned.
    start: usize,
    /// Byte offset of the next unconsumed byte.
    current: usize,
    /// 1-based line of the current position.
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scan exactly one token. Once the source is exhausted, every further
    /// call yields the EOF sentinel.
    pub fn scan_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.start = self.current;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b';' => self.make_token(TokenKind::Semicolon),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.make_token(kind)
            }
            b'=' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.make_token(kind)
            }
            b'<' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.make_token(kind)
            }
            b'>' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.make_token(kind)
            }
            b'"' => self.string(),
            b'0'..=b'9' => self.number(),
            c if is_alpha(c) => self.identifier(),
            _ => self.error_token("Unexpected character."),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current).copied()
    }

    fn peek_next(&self) -> Option<u8> {
        self.source.as_bytes().get(self.current + 1).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.current += 1;
        Some(byte)
    }

    /// Consume the next byte only if it matches.
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\r' | b'\t') => {
                    self.current += 1;
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.current += 1;
                }
                Some(b'/') if self.peek_next() == Some(b'/') => {
                    // The newline ending the comment is handled by the
                    // next loop iteration so it still counts a line.
                    while !matches!(self.peek(), Some(b'\n') | None) {
                        self.current += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Token<'a> {
        while let Some(byte) = self.peek() {
            if byte == b'"' {
                break;
            }
            if byte == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }

        if self.peek().is_none() {
            return self.error_token("Unterminated string.");
        }

        // The closing quote.
        self.current += 1;
        self.make_token(TokenKind::String)
    }

    fn number(&mut self) -> Token<'a> {
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.current += 1;
        }

        // A fractional part needs a digit after the dot, otherwise the dot
        // belongs to the next token.
        if self.peek() == Some(b'.') && matches!(self.peek_next(), Some(b) if b.is_ascii_digit()) {
            self.current += 1;
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.current += 1;
            }
        }

        self.make_token(TokenKind::Number)
    }

    fn identifier(&mut self) -> Token<'a> {
        while matches!(self.peek(), Some(b) if is_alpha(b) || b.is_ascii_digit()) {
            self.current += 1;
        }
        self.make_token(identifier_kind(&self.source[self.start..self.current]))
    }

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token {
            kind,
            lexeme: &self.source[self.start..self.current],
            line: self.line,
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'a> {
        Token {
            kind: TokenKind::Error,
            lexeme: message,
            line: self.line,
        }
    }
}

fn is_alpha(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

/// Classify an identifier lexeme against the reserved words.
fn identifier_kind(lexeme: &str) -> TokenKind {
    match lexeme {
        "and" => TokenKind::And,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => TokenKind::Identifier,
    }
}
