//! Bytecode interpreter for the Lox runtime
//!
//! This crate provides a stack-based virtual machine with:
//! - Call frames over a shared value stack, bounded call depth
//! - Globals in an interned-string hash table
//! - Classes with dynamic instance fields
//! - Host functions callable from Lox (`clock` is predefined)
//! - Allocation-triggered garbage collection rooted in the stack, frames
//!   and globals
//!
//! # Example
//!
//! ```
//! use interpreter::Vm;
//! use core_types::InterpretResult;
//!
//! let mut vm = Vm::new().with_output(std::io::sink());
//! assert_eq!(vm.interpret("fun f(n) { return n * 2; } print f(21);"), InterpretResult::Ok);
//! assert_eq!(vm.interpret("print undefined;"), InterpretResult::RuntimeError);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod config;
pub mod dispatch;
pub mod gc_integration;
pub mod natives;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use config::{VmConfig, FRAMES_MAX, STACK_MAX};
pub use gc_integration::VmRoots;
pub use vm::Vm;
