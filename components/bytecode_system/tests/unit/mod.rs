//! Unit tests for the bytecode_system public API

mod test_chunk;
mod test_disassembler;
