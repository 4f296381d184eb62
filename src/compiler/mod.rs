//! # Compiler
//!
//! Single-pass Pratt compiler: it pulls tokens straight from the scanner
//! and emits bytecode into a [`Chunk`] as it parses. There is no AST.
//!
//! ## Precedence climbing
//!
//! Every token kind maps to a rule of `{prefix handler, infix handler,
//! infix precedence}`. [`Compiler::parse_precedence`] drives the
//! algorithm: run the prefix handler of the token just consumed, then fold
//! infix handlers while their precedence is at least the requested level.
//! Binary operators parse their right operand one level higher than their
//! own, which is what makes them left-associative.
//!
//! ## Error recovery
//!
//! The first error puts the parser into panic mode, which suppresses
//! further reports until a synchronisation point. The expression-only
//! grammar has no statement boundaries yet, so panic mode persists to the
//! end of input and a failed compile reports exactly one error.


use crate::chunk::{Chunk, OpCode};
use crate::error::{CompileError, ErrorLocation};
use crate::heap::{intern, Heap};
use crate::scanner::token::{Token, TokenKind};
use crate::scanner::Scanner;
use crate::table::Table;
use crate::value::Value;

pub struct CompileResult {
    pub chunk: Chunk,
    /// Empty exactly when compilation succeeded; a chunk accompanied by
    /// errors must not be executed.
    pub errors: Vec<CompileError>,
}

/// Compile one source string into a chunk. String literals are interned
/// through `heap`/`strings`, so constants share storage with everything
/// the VM allocates later.
#[must_use]
pub fn compile(source: &str, heap: &mut Heap, strings: &mut Table) -> CompileResult {
    let mut compiler = Compiler::new(source, heap, strings);
    compiler.advance();
    compiler.expression();
    compiler.consume(TokenKind::Eof, "Expect end of expression.");
    compiler.end();

    CompileResult {
        chunk: compiler.chunk,
        errors: compiler.errors,
    }
}

/// Precedence levels, lowest binding to tightest binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    /// One level tighter. Binary operators parse their right operand here.
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => unreachable!("no precedence above Primary"),
        }
    }
}

type ParseFn = fn(&mut Compiler<'_, '_>);

#[derive(Clone, Copy)]
struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

macro_rules! rule {
    ($prefix:expr, $infix:expr, $precedence:ident) => {
        ParseRule {
            prefix: $prefix,
            infix: $infix,
            precedence: Precedence::$precedence,
        }
    };
}

#[rustfmt::skip]
fn rule_for(kind: TokenKind) -> ParseRule {
    use TokenKind::*;
    match kind {
        //                  Prefix           Infix          Precedence
        LeftParen  => rule!(Some(grouping),  None,          None),
        Minus      => rule!(Some(unary),     Some(binary),  Term),
        Plus       => rule!(None,            Some(binary),  Term),
        Slash      => rule!(None,            Some(binary),  Factor),
        Star       => rule!(None,            Some(binary),  Factor),
        Bang       => rule!(Some(unary),     None,          None),
        BangEqual  => rule!(None,            Some(binary),  Equality),
        EqualEqual => rule!(None,            Some(binary),  Equality),
        Greater    => rule!(None,            Some(binary),  Comparison),
        GreaterEqual => rule!(None,          Some(binary),  Comparison),
        Less       => rule!(None,            Some(binary),  Comparison),
        LessEqual  => rule!(None,            Some(binary),  Comparison),
        Number     => rule!(Some(number),    None,          None),
        String     => rule!(Some(string),    None,          None),
        False      => rule!(Some(literal),   None,          None),
        Nil        => rule!(Some(literal),   None,          None),
        True       => rule!(Some(literal),   None,          None),
        _          => rule!(None,            None,          None),
    }
}

struct Compiler<'src, 'ctx> {
    scanner: Scanner<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    panic_mode: bool,
    errors: Vec<CompileError>,
    chunk: Chunk,
    heap: &'ctx mut Heap,
    strings: &'ctx mut Table,
}

impl<'src, 'ctx> Compiler<'src, 'ctx> {
    fn new(source: &'src str, heap: &'ctx mut Heap, strings: &'ctx mut Table) -> Self {
        // Placeholder until the first advance primes the lookahead.
        let before_first = Token {
            kind: TokenKind::Eof,
            lexeme: "",
            line: 1,
        };
        Self {
            scanner: Scanner::new(source),
            current: before_first,
            previous: before_first,
            panic_mode: false,
            errors: Vec::new(),
            chunk: Chunk::new(),
            heap,
            strings,
        }
    }

    /// Step to the next real token, reporting any error tokens the scanner
    /// hands back along the way.
    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    /// Consume a token of the expected kind or report `message`.
    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    /// The core of the Pratt algorithm.
    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rule_for(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        prefix(self);

        while precedence <= rule_for(self.current.kind).precedence {
            self.advance();
            let infix = rule_for(self.previous.kind)
                .infix
                .expect("token kinds with an infix precedence always carry an infix handler");
            infix(self);
        }
    }

    fn end(&mut self) {
        self.emit_op(OpCode::Return);

        #[cfg(feature = "debug_print_code")]
        if self.errors.is_empty() {
            crate::debug::disassemble_chunk(&self.chunk, self.heap, "code");
        }
    }

    // === Bytecode emission ===

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line;
        self.chunk.write(byte, line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op as u8);
    }

    fn emit_ops(&mut self, first: OpCode, second: OpCode) {
        self.emit_op(first);
        self.emit_op(second);
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_op(OpCode::Constant);
        self.emit_byte(index);
    }

    /// Add a constant to the pool, enforcing the 8-bit operand limit.
    fn make_constant(&mut self, value: Value) -> u8 {
        let index = self.chunk.add_constant(value);
        match u8::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    // === Error reporting ===

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'_>, message: &str) {
        // Suppress the cascade that usually follows a first error.
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;

        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::End,
            TokenKind::Error => ErrorLocation::Unplaced,
            _ => ErrorLocation::At(token.lexeme.to_string()),
        };
        self.errors.push(CompileError {
            line: token.line,
            location,
            message: message.to_string(),
        });
    }
}

// === Parse handlers ===
//
// Each handler runs with its driving token already consumed, sitting in
// `previous`.

fn grouping(c: &mut Compiler<'_, '_>) {
    c.expression();
    c.consume(TokenKind::RightParen, "Expect ')' after expression.");
}

fn number(c: &mut Compiler<'_, '_>) {
    let value: f64 = c
        .previous
        .lexeme
        .parse()
        .expect("number tokens always parse as f64");
    c.emit_constant(Value::Number(value));
}

fn string(c: &mut Compiler<'_, '_>) {
    let lexeme = c.previous.lexeme;
    // Strip the surrounding quotes.
    let contents = &lexeme[1..lexeme.len() - 1];
    let handle = intern(c.heap, c.strings, contents);
    c.emit_constant(Value::Obj(handle));
}

fn unary(c: &mut Compiler<'_, '_>) {
    let operator = c.previous.kind;

    // Compile the operand first so it lands on the stack.
    c.parse_precedence(Precedence::Unary);

    match operator {
        TokenKind::Bang => c.emit_op(OpCode::Not),
        TokenKind::Minus => c.emit_op(OpCode::Negate),
        _ => unreachable!(),
    }
}

fn binary(c: &mut Compiler<'_, '_>) {
    let operator = c.previous.kind;
    let rule = rule_for(operator);
    c.parse_precedence(rule.precedence.next());

    match operator {
        TokenKind::BangEqual => c.emit_ops(OpCode::Equal, OpCode::Not),
        TokenKind::EqualEqual => c.emit_op(OpCode::Equal),
        TokenKind::Greater => c.emit_op(OpCode::Greater),
        TokenKind::GreaterEqual => c.emit_ops(OpCode::Less, OpCode::Not),
        TokenKind::Less => c.emit_op(OpCode::Less),
        TokenKind::LessEqual => c.emit_ops(OpCode::Greater, OpCode::Not),
        TokenKind::Plus => c.emit_op(OpCode::Add),
        TokenKind::Minus => c.emit_op(OpCode::Subtract),
        TokenKind::Star => c.emit_op(OpCode::Multiply),
        TokenKind::Slash => c.emit_op(OpCode::Divide),
        _ => unreachable!(),
    }
}

fn literal(c: &mut Compiler<'_, '_>) {
    match c.previous.kind {
        TokenKind::False => c.emit_op(OpCode::False),
        TokenKind::Nil => c.emit_op(OpCode::Nil),
        TokenKind::True => c.emit_op(OpCode::True),
        _ => unreachable!(),
    }
}
