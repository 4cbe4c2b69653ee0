//! Human-readable chunk listings.
//!
//! Each instruction renders as its offset, its source line (or `|` when the
//! line matches the previous instruction), the mnemonic and any operands:
//!
//! ```text
//! == fib ==
//! 0000    2 OP_GET_LOCAL        1
//! 0002    | OP_CONSTANT         0 '2'
//! 0004    | OP_LESS
//! 0005    | OP_JUMP_IF_FALSE    5 -> 15
//! ```

use std::fmt::Write;

use core_types::Value;

use crate::chunk::Chunk;
use crate::opcode::OpCode;

/// Renders constant-pool values for listings.
///
/// The heap implements this so that string and function constants show
/// their contents rather than a handle.
pub trait ConstantFormatter {
    /// Display form of `value`.
    fn format_constant(&self, value: Value) -> String;
}

/// Formatter that shows heap references as bare handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainConstants;

impl ConstantFormatter for PlainConstants {
    fn format_constant(&self, value: Value) -> String {
        value.to_string()
    }
}

/// Disassemble a whole chunk under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str, constants: &dyn ConstantFormatter) -> String {
    let mut out = format!("== {} ==\n", name);
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, constants, &mut out);
        out.push('\n');
    }
    out
}

/// Append the listing line for the instruction at `offset` to `out`.
///
/// Returns the offset of the next instruction.
pub fn disassemble_instruction(
    chunk: &Chunk,
    offset: usize,
    constants: &dyn ConstantFormatter,
    out: &mut String,
) -> usize {
    let _ = write!(out, "{:04} ", offset);
    let line = chunk.line(offset).unwrap_or(0);
    if offset > 0 && chunk.line(offset - 1) == Some(line) {
        out.push_str("   | ");
    } else {
        let _ = write!(out, "{:4} ", line);
    }

    let byte = chunk.read_u8(offset).unwrap_or(u8::MAX);
    let Some(op) = OpCode::from_byte(byte) else {
        let _ = write!(out, "Unknown opcode {}", byte);
        return offset + 1;
    };

    match op {
        OpCode::Constant
        | OpCode::GetGlobal
        | OpCode::DefineGlobal
        | OpCode::SetGlobal
        | OpCode::GetProperty
        | OpCode::SetProperty
        | OpCode::Class => constant_instruction(op, chunk, offset, constants, out),
        OpCode::PopN | OpCode::GetLocal | OpCode::SetLocal | OpCode::Call => {
            byte_instruction(op, chunk, offset, out)
        }
        OpCode::Jump | OpCode::JumpIfFalse => jump_instruction(op, true, chunk, offset, out),
        OpCode::Loop => jump_instruction(op, false, chunk, offset, out),
        _ => {
            out.push_str(op.mnemonic());
            offset + 1
        }
    }
}

fn constant_instruction(
    op: OpCode,
    chunk: &Chunk,
    offset: usize,
    constants: &dyn ConstantFormatter,
    out: &mut String,
) -> usize {
    let index = chunk.read_u8(offset + 1).unwrap_or(0);
    let rendered = chunk
        .constant(index)
        .map(|value| constants.format_constant(value))
        .unwrap_or_else(|| "<missing>".to_string());
    let _ = write!(out, "{:<16} {:4} '{}'", op.mnemonic(), index, rendered);
    offset + 2
}

fn byte_instruction(op: OpCode, chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let operand = chunk.read_u8(offset + 1).unwrap_or(0);
    let _ = write!(out, "{:<16} {:4}", op.mnemonic(), operand);
    offset + 2
}

fn jump_instruction(
    op: OpCode,
    forward: bool,
    chunk: &Chunk,
    offset: usize,
    out: &mut String,
) -> usize {
    let distance = chunk.read_u16(offset + 1).unwrap_or(0) as usize;
    let next = offset + 3;
    let target = if forward {
        next + distance
    } else {
        next.saturating_sub(distance)
    };
    let _ = write!(out, "{:<16} {:4} -> {}", op.mnemonic(), offset, target);
    next
}
