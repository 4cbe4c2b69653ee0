//! Lox Compiler Component
//!
//! Turns Lox source text into bytecode in a single pass.
//!
//! # Overview
//!
//! - [`Scanner`] - Produces tokens on demand, one at a time
//! - [`Token`] - Token type, lexeme and line
//! - [`compile`] - Pratt parser that emits a [`Chunk`](bytecode_system::Chunk)
//!   per function and stores the functions in the heap
//! - [`FunctionState`] - Locals and scope depth of a function being compiled
//!
//! # Example
//!
//! ```
//! use memory_manager::{Heap, NoRoots};
//!
//! let mut heap = Heap::new();
//! let script = parser::compile("var x = 42; print x;", &mut heap, &NoRoots).unwrap();
//! let chunk = &heap.function(script).unwrap().chunk;
//! assert!(!chunk.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
pub mod rules;
pub mod scanner;
pub mod scope;

pub use compiler::{compile, Compiler, MAX_ARITY};
pub use error::error_at_token;
pub use rules::Precedence;
pub use scanner::{Scanner, Token, TokenKind};
pub use scope::{FunctionKind, FunctionState, Local, MAX_LOCALS};
