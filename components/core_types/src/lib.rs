//! Core value types and error handling for the Lox runtime.
//!
//! This crate provides the foundational types every other component builds on:
//! the tagged [`Value`], the generational heap handle [`ObjRef`], and the
//! compile/runtime error types surfaced by the public entry points.
//!
//! # Overview
//!
//! - [`Value`] - Number, boolean, nil or heap reference
//! - [`ObjRef`] - Generational index into the object heap
//! - [`CompileError`] / [`CompileErrors`] - Diagnostics from a compile pass
//! - [`RuntimeError`] - A fatal runtime error with its backtrace
//! - [`InterpretResult`] - The three-valued outcome of `interpret`
//!
//! # Examples
//!
//! ```
//! use core_types::{format_number, Value};
//!
//! let n = Value::Number(7.0);
//! assert!(n.is_truthy());
//! assert_eq!(n.type_name(), "number");
//! assert_eq!(format_number(0.1 + 0.2), "0.3");
//!
//! assert!(Value::Nil.is_falsey());
//! assert!(Value::Bool(false).is_falsey());
//! assert!(!Value::Number(0.0).is_falsey());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod number;
mod source;
mod value;

pub use error::{
    CompileError, CompileErrors, ErrorKind, ErrorSite, InterpretError, InterpretResult,
    RuntimeError,
};
pub use number::format_number;
pub use source::StackFrame;
pub use value::{ObjRef, Value};
