//! Bytecode opcodes for the Lox VM
//!
//! Every instruction is one opcode byte followed by zero, one or two operand
//! bytes. Jump operands are big-endian `u16` distances measured from the byte
//! after the operand.

use crate::chunk::ChunkError;

/// Bytecode opcodes for Lox execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // Literals
    /// Push constant from the pool (operand: constant index)
    Constant,
    /// Push nil
    Nil,
    /// Push true
    True,
    /// Push false
    False,

    // Stack
    /// Discard the top value
    Pop,
    /// Discard the top N values (operand: count)
    PopN,

    // Variables
    /// Push a local from the frame window (operand: slot)
    GetLocal,
    /// Store top into a local slot without popping (operand: slot)
    SetLocal,
    /// Push a global by name (operand: name constant)
    GetGlobal,
    /// Bind a global to the popped value (operand: name constant)
    DefineGlobal,
    /// Assign an existing global without popping (operand: name constant)
    SetGlobal,

    // Fields
    /// Replace an instance with one of its fields (operand: name constant)
    GetProperty,
    /// Assign a field; leaves the assigned value (operand: name constant)
    SetProperty,

    // Comparison
    /// Pop two values and push whether they are equal
    Equal,
    /// Pop two numbers and push `a > b`
    Greater,
    /// Pop two numbers and push `a < b`
    Less,

    // Arithmetic
    /// Add two numbers or concatenate two strings
    Add,
    /// Subtract two numbers
    Subtract,
    /// Multiply two numbers
    Multiply,
    /// Divide two numbers
    Divide,
    /// Logical negation by falsiness
    Not,
    /// Arithmetic negation
    Negate,

    // Statements
    /// Pop and print a value
    Print,

    // Control flow
    /// Unconditional forward jump (operand: u16 distance)
    Jump,
    /// Forward jump if top is falsey; does not pop (operand: u16 distance)
    JumpIfFalse,
    /// Backward jump (operand: u16 distance)
    Loop,

    // Calls
    /// Call the value below N arguments (operand: argument count)
    Call,
    /// Create a class (operand: name constant)
    Class,
    /// Return from the current function
    Return,
}

impl OpCode {
    const ALL: [OpCode; 29] = [
        OpCode::Constant,
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::PopN,
        OpCode::GetLocal,
        OpCode::SetLocal,
        OpCode::GetGlobal,
        OpCode::DefineGlobal,
        OpCode::SetGlobal,
        OpCode::GetProperty,
        OpCode::SetProperty,
        OpCode::Equal,
        OpCode::Greater,
        OpCode::Less,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Not,
        OpCode::Negate,
        OpCode::Print,
        OpCode::Jump,
        OpCode::JumpIfFalse,
        OpCode::Loop,
        OpCode::Call,
        OpCode::Class,
        OpCode::Return,
    ];

    /// Decode an opcode byte.
    pub fn from_byte(byte: u8) -> Option<OpCode> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Mnemonic used in disassembly listings.
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Pop => "OP_POP",
            OpCode::PopN => "OP_POPN",
            OpCode::GetLocal => "OP_GET_LOCAL",
            OpCode::SetLocal => "OP_SET_LOCAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::GetProperty => "OP_GET_PROPERTY",
            OpCode::SetProperty => "OP_SET_PROPERTY",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Print => "OP_PRINT",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::Loop => "OP_LOOP",
            OpCode::Call => "OP_CALL",
            OpCode::Class => "OP_CLASS",
            OpCode::Return => "OP_RETURN",
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = ChunkError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::from_byte(byte).ok_or(ChunkError::UnknownOpcode(byte))
    }
}
