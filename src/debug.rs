//! Bytecode disassembler, used by the `debug_trace_execution` and
//! `debug_print_code` features and handy when poking at chunks in tests.

use num_traits::FromPrimitive;

use crate::chunk::{Chunk, OpCode};
use crate::heap::Heap;
use crate::value::format_value;

/// Print a listing of every instruction in `chunk` to stderr.
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) {
    eprintln!("== {name} ==");

    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(chunk, heap, offset);
    }
}

/// Print one instruction and return the offset of the next one.
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> usize {
    eprint!("{offset:04} ");
    if offset > 0 && chunk.get_line(offset) == chunk.get_line(offset - 1) {
        eprint!("   | ");
    } else {
        eprint!("{:4} ", chunk.get_line(offset));
    }

    let byte = chunk.code[offset];
    let Some(op) = OpCode::from_u8(byte) else {
        eprintln!("Unknown opcode {byte}");
        return offset + 1;
    };

    match op {
        OpCode::Constant => constant_instruction("OP_CONSTANT", chunk, heap, offset),
        OpCode::Nil => simple_instruction("OP_NIL", offset),
        OpCode::True => simple_instruction("OP_TRUE", offset),
        OpCode::False => simple_instruction("OP_FALSE", offset),
        OpCode::Pop => simple_instruction("OP_POP", offset),
        OpCode::Equal => simple_instruction("OP_EQUAL", offset),
        OpCode::Greater => simple_instruction("OP_GREATER", offset),
        OpCode::Less => simple_instruction("OP_LESS", offset),
        OpCode::Add => simple_instruction("OP_ADD", offset),
        OpCode::Subtract => simple_instruction("OP_SUBTRACT", offset),
        OpCode::Multiply => simple_instruction("OP_MULTIPLY", offset),
        OpCode::Divide => simple_instruction("OP_DIVIDE", offset),
        OpCode::Not => simple_instruction("OP_NOT", offset),
        OpCode::Negate => simple_instruction("OP_NEGATE", offset),
        OpCode::Print => simple_instruction("OP_PRINT", offset),
        OpCode::Return => simple_instruction("OP_RETURN", offset),
    }
}

fn simple_instruction(name: &str, offset: usize) -> usize {
    eprintln!("{name}");
    offset + 1
}

fn constant_instruction(name: &str, chunk: &Chunk, heap: &Heap, offset: usize) -> usize {
    let index = chunk.code[offset + 1] as usize;
    eprintln!(
        "{name:<16} {index:4} '{}'",
        format_value(chunk.constants[index], heap)
    );
    offset + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn instruction_widths() {
        let mut chunk = Chunk::new();
        let index = chunk.add_constant(Value::Number(1.0)) as u8;
        chunk.write_op(OpCode::Constant, 1);
        chunk.write(index, 1);
        chunk.write_op(OpCode::Negate, 1);
        chunk.write_op(OpCode::Return, 1);

        let heap = Heap::new();
        // OP_CONSTANT carries an operand byte; the rest are one byte wide.
        assert_eq!(disassemble_instruction(&chunk, &heap, 0), 2);
        assert_eq!(disassemble_instruction(&chunk, &heap, 2), 3);
        assert_eq!(disassemble_instruction(&chunk, &heap, 3), 4);
    }
}
