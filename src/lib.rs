//! # Flint
//!
//! A bytecode compiler and stack-based virtual machine for the Flint
//! scripting language.
//!
//! ## Pipeline
//!
//! Source text flows through three stages:
//!
//! 1. **Scanner** - produces tokens on demand from the source string
//! 2. **Compiler** - single-pass Pratt parser emitting bytecode directly
//! 3. **VM** - stack machine executing the compiled chunk
//!
//! There is no AST: the compiler pulls tokens from the scanner and writes
//! opcodes and constants straight into a [`chunk::Chunk`]. Strings are
//! interned in a VM-owned heap, so equal string contents always share one
//! object.
//!
//! ## Example
//!
//! ```rust
//! use flint::value::Value;
//! use flint::vm::Vm;
//!
//! let mut vm = Vm::new();
//! vm.interpret("(-1 + 2) * 3 - -4").unwrap();
//! assert_eq!(vm.stack_top(), Some(Value::Number(7.0)));
//! ```

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod error;
pub mod heap;
pub mod scanner;
pub mod table;
pub mod value;
pub mod vm;
