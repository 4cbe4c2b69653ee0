//! Unit tests for parser public API

mod test_compiler;
mod test_scanner;
