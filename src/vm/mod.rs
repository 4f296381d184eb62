//! # Virtual machine
//!
//! Stack-based evaluator for compiled chunks. The VM owns the value
//! stack, the heap, and the string intern set; dropping the VM releases
//! every object allocated during its lifetime in one pass.
//!
//! ## Dispatch
//!
//! `run` fetches one opcode per iteration and dispatches on it. The
//! instruction pointer is a byte offset into the chunk, which is passed by
//! reference for the duration of a run rather than stored in the VM.
//!
//! ## Runtime errors
//!
//! Errors are values, not unwinding: each one carries a message and the
//! source line recovered from the chunk's line map, and aborts the current
//! `interpret` call after resetting the stack.


use num_traits::FromPrimitive;

use crate::chunk::{Chunk, OpCode};
use crate::compiler::compile;
use crate::error::{InterpretError, RuntimeError};
use crate::heap::{intern, Heap};
use crate::table::Table;
use crate::value::{format_value, values_equal, Value};

/// Hard ceiling on the value stack. Exceeding it is a runtime error.
pub const STACK_MAX: usize = 256;

pub struct Vm {
    stack: Vec<Value>,
    /// Byte offset of the next instruction in the running chunk.
    ip: usize,
    heap: Heap,
    /// Intern set: every string in the system has exactly one entry here.
    strings: Table,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(STACK_MAX),
            ip: 0,
            heap: Heap::new(),
            strings: Table::new(),
        }
    }

    /// Compile and run one source string.
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpretError> {
        self.stack.clear();
        self.ip = 0;

        let result = compile(source, &mut self.heap, &mut self.strings);
        if !result.errors.is_empty() {
            return Err(InterpretError::Compile(result.errors));
        }

        self.run(&result.chunk).map_err(|err| {
            self.stack.clear();
            InterpretError::Runtime(err)
        })
    }

    /// The value an expression chunk leaves behind at `OP_RETURN`.
    pub fn stack_top(&self) -> Option<Value> {
        self.stack.last().copied()
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        loop {
            #[cfg(feature = "debug_trace_execution")]
            self.trace(chunk);

            let op = self.read_op(chunk)?;
            match op {
                OpCode::Constant => {
                    let index = self.read_byte(chunk) as usize;
                    let value = chunk.constants[index];
                    self.push(chunk, value)?;
                }
                OpCode::Nil => self.push(chunk, Value::Nil)?,
                OpCode::True => self.push(chunk, Value::Bool(true))?,
                OpCode::False => self.push(chunk, Value::Bool(false))?,
                OpCode::Pop => {
                    self.pop(chunk)?;
                }
                OpCode::Equal => {
                    let b = self.pop(chunk)?;
                    let a = self.pop(chunk)?;
                    let equal = values_equal(a, b, &self.heap);
                    self.push(chunk, Value::Bool(equal))?;
                }
                OpCode::Greater => self.binary_compare(chunk, |a, b| a > b)?,
                OpCode::Less => self.binary_compare(chunk, |a, b| a < b)?,
                OpCode::Add => self.add(chunk)?,
                OpCode::Subtract => self.binary_arithmetic(chunk, |a, b| a - b)?,
                OpCode::Multiply => self.binary_arithmetic(chunk, |a, b| a * b)?,
                OpCode::Divide => self.binary_arithmetic(chunk, |a, b| a / b)?,
                OpCode::Not => {
                    let value = self.pop(chunk)?;
                    self.push(chunk, Value::Bool(value.is_falsey()))?;
                }
                OpCode::Negate => match self.stack.last_mut() {
                    Some(Value::Number(n)) => *n = -*n,
                    Some(_) => return Err(self.runtime_error(chunk, "Operand must be a number.")),
                    None => return Err(self.runtime_error(chunk, "Stack underflow.")),
                },
                OpCode::Print => {
                    let value = self.pop(chunk)?;
                    println!("{}", format_value(value, &self.heap));
                }
                OpCode::Return => return Ok(()),
            }
        }
    }

    fn read_byte(&mut self, chunk: &Chunk) -> u8 {
        let byte = chunk.code[self.ip];
        self.ip += 1;
        byte
    }

    fn read_op(&mut self, chunk: &Chunk) -> Result<OpCode, RuntimeError> {
        let byte = self.read_byte(chunk);
        OpCode::from_u8(byte)
            .ok_or_else(|| self.runtime_error(chunk, &format!("Unknown opcode {byte}.")))
    }

    fn push(&mut self, chunk: &Chunk, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= STACK_MAX {
            return Err(self.runtime_error(chunk, "Stack overflow."));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .ok_or_else(|| self.runtime_error(chunk, "Stack underflow."))
    }

    fn binary_arithmetic(
        &mut self,
        chunk: &Chunk,
        op: fn(f64, f64) -> f64,
    ) -> Result<(), RuntimeError> {
        let b = self.pop(chunk)?;
        let a = self.pop(chunk)?;
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => self.push(chunk, Value::Number(op(a, b))),
            _ => Err(self.runtime_error(chunk, "Operands must be numbers.")),
        }
    }

    fn binary_compare(
        &mut self,
        chunk: &Chunk,
        op: fn(f64, f64) -> bool,
    ) -> Result<(), RuntimeError> {
        let b = self.pop(chunk)?;
        let a = self.pop(chunk)?;
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => self.push(chunk, Value::Bool(op(a, b))),
            _ => Err(self.runtime_error(chunk, "Operands must be numbers.")),
        }
    }

    /// `+` is overloaded: numeric addition or string concatenation. A
    /// concatenation result is interned like every other string.
    fn add(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        let b = self.pop(chunk)?;
        let a = self.pop(chunk)?;
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => self.push(chunk, Value::Number(a + b)),
            (Value::Obj(a), Value::Obj(b)) => {
                let concatenated = format!("{}{}", self.heap.string(a), self.heap.string(b));
                let handle = intern(&mut self.heap, &mut self.strings, &concatenated);
                self.push(chunk, Value::Obj(handle))
            }
            _ => Err(self.runtime_error(chunk, "Operands must be two numbers or two strings.")),
        }
    }

    /// Build a runtime error pointing at the instruction just read.
    fn runtime_error(&self, chunk: &Chunk, message: &str) -> RuntimeError {
        RuntimeError {
            message: message.to_string(),
            line: chunk.get_line(self.ip.saturating_sub(1)),
        }
    }

    #[cfg(feature = "debug_trace_execution")]
    fn trace(&self, chunk: &Chunk) {
        let mut slots = String::from("          ");
        for value in &self.stack {
            slots.push_str(&format!("[ {} ]", format_value(*value, &self.heap)));
        }
        eprintln!("{slots}");
        crate::debug::disassemble_instruction(chunk, &self.heap, self.ip);
    }
}
