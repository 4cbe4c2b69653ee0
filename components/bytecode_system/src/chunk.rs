//! Bytecode chunk - compiled bytecode container
//!
//! A chunk holds the instruction bytes of one function, a parallel line table
//! with one entry per byte, and the function's constant pool.

use core_types::Value;
use thiserror::Error;

use crate::opcode::OpCode;

/// Constant pool capacity; indices are encoded in a single byte.
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

/// Errors raised while building or reading a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The constant pool already holds [`MAX_CONSTANTS`] entries
    #[error("Too many constants in one chunk.")]
    TooManyConstants,
    /// A jump distance does not fit in two bytes
    #[error("jump distance {0} does not fit in 16 bits")]
    JumpTooLarge(usize),
    /// An offset points outside the code buffer
    #[error("offset {offset} is outside code of length {len}")]
    OutOfBounds {
        /// Offending offset
        offset: usize,
        /// Code length at the time
        len: usize,
    },
    /// A byte that does not decode to an opcode
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
}

/// A compiled bytecode chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: Vec<u32>,
    constants: Vec<Value>,
}

impl Chunk {
    /// Create a new empty chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte, recording the source line it came from
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode byte
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write(op.into(), line);
    }

    /// Add a constant to the pool and return its one-byte index
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::TooManyConstants`] once the pool is full.
    pub fn add_constant(&mut self, value: Value) -> Result<u8, ChunkError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(ChunkError::TooManyConstants);
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u8)
    }

    /// Overwrite two bytes at `offset` with a big-endian `u16`
    pub fn patch_u16(&mut self, offset: usize, value: u16) -> Result<(), ChunkError> {
        let len = self.code.len();
        match self.code.get_mut(offset..offset + 2) {
            Some(slot) => {
                slot.copy_from_slice(&value.to_be_bytes());
                Ok(())
            }
            None => Err(ChunkError::OutOfBounds { offset, len }),
        }
    }

    /// Backpatch the forward jump whose operand starts at `operand_offset`
    /// so that it lands on the current end of the code
    ///
    /// # Errors
    ///
    /// [`ChunkError::JumpTooLarge`] if the body is longer than a `u16`
    /// distance, [`ChunkError::OutOfBounds`] if the operand does not exist.
    pub fn patch_jump(&mut self, operand_offset: usize) -> Result<(), ChunkError> {
        let len = self.code.len();
        let distance = len
            .checked_sub(operand_offset + 2)
            .ok_or(ChunkError::OutOfBounds {
                offset: operand_offset,
                len,
            })?;
        let distance = u16::try_from(distance).map_err(|_| ChunkError::JumpTooLarge(distance))?;
        self.patch_u16(operand_offset, distance)
    }

    /// Distance for a backward `Loop` emitted now that returns to `loop_start`
    ///
    /// Accounts for the loop operand that has not been written yet.
    pub fn loop_distance(&self, loop_start: usize) -> Result<u16, ChunkError> {
        let distance = (self.code.len() + 2)
            .checked_sub(loop_start)
            .ok_or(ChunkError::OutOfBounds {
                offset: loop_start,
                len: self.code.len(),
            })?;
        u16::try_from(distance).map_err(|_| ChunkError::JumpTooLarge(distance))
    }

    /// Byte at `offset`
    pub fn read_u8(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Big-endian `u16` operand starting at `offset`
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let hi = self.read_u8(offset)?;
        let lo = self.read_u8(offset + 1)?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    /// Constant at `index`
    pub fn constant(&self, index: u8) -> Option<Value> {
        self.constants.get(index as usize).copied()
    }

    /// Source line of the byte at `offset`
    pub fn line(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    /// Instruction bytes
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Line table, parallel to [`Chunk::code`]
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    /// Constant pool
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Number of code bytes
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether no code has been written
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}
