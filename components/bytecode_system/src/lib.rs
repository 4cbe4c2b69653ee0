//! Bytecode system for the Lox runtime
//!
//! This crate provides the one-byte opcode set, the [`Chunk`] container the
//! compiler emits into and the VM executes, and a human-readable
//! disassembler.
//!
//! # Features
//!
//! - Stack-based instruction set with inline one- and two-byte operands
//! - Per-byte line table for O(1) error line lookup
//! - Bounds-checked jump backpatching
//!
//! # Example
//!
//! ```
//! use bytecode_system::{disassemble_chunk, Chunk, OpCode, PlainConstants};
//! use core_types::Value;
//!
//! let mut chunk = Chunk::new();
//! let idx = chunk.add_constant(Value::Number(1.2)).unwrap();
//! chunk.write_op(OpCode::Constant, 123);
//! chunk.write(idx, 123);
//! chunk.write_op(OpCode::Return, 123);
//!
//! let listing = disassemble_chunk(&chunk, "test chunk", &PlainConstants);
//! assert!(listing.contains("OP_CONSTANT"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod disassembler;
pub mod opcode;

// Re-export main types at crate root
pub use chunk::{Chunk, ChunkError, MAX_CONSTANTS};
pub use disassembler::{
    disassemble_chunk, disassemble_instruction, ConstantFormatter, PlainConstants,
};
pub use opcode::OpCode;
