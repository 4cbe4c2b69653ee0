//! Compile and runtime error types.
//!
//! Compilation reports every error found in one pass as [`CompileErrors`].
//! Execution stops at the first [`RuntimeError`], which carries a backtrace
//! of the frames active when it was raised.

use std::fmt;

use thiserror::Error;

use crate::StackFrame;

/// Where in the source a compile error points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSite {
    /// At a specific token's lexeme
    Lexeme(String),
    /// At the end of input
    End,
    /// No lexeme to show (lexical errors)
    None,
}

impl fmt::Display for ErrorSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSite::Lexeme(lexeme) => write!(f, " at '{}'", lexeme),
            ErrorSite::End => f.write_str(" at end"),
            ErrorSite::None => Ok(()),
        }
    }
}

/// A single compile-time diagnostic.
///
/// # Examples
///
/// ```
/// use core_types::{CompileError, ErrorSite};
///
/// let err = CompileError {
///     line: 2,
///     site: ErrorSite::Lexeme("=".to_string()),
///     message: "Invalid assignment target.".to_string(),
/// };
/// assert_eq!(err.to_string(), "[line 2] Error at '=': Invalid assignment target.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Error{site}: {message}")]
pub struct CompileError {
    /// Source line of the offending token
    pub line: u32,
    /// Token the error points at
    pub site: ErrorSite,
    /// Human-readable message
    pub message: String,
}

/// All errors reported by one compile pass, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render_lines(.0))]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    /// Number of errors reported.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no errors were reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the errors in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.0.iter()
    }
}

fn render_lines(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Category of a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operand or receiver of the wrong type
    TypeError,
    /// Read or assignment of an undefined global
    UndefinedVariable,
    /// Read of a field the instance does not have
    UndefinedProperty,
    /// Wrong number of call arguments
    Arity,
    /// Call depth exceeded the frame limit
    StackOverflow,
    /// Corrupt bytecode or a dangling heap handle
    Internal,
}

/// A runtime error raised by the VM.
///
/// `stack` lists the active frames innermost first.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, RuntimeError, StackFrame};
///
/// let mut err = RuntimeError::new(ErrorKind::TypeError, "Operands must be numbers.");
/// err.stack.push(StackFrame { function_name: None, line: 1 });
///
/// assert_eq!(err.to_string(), "Operands must be numbers.");
/// assert_eq!(err.report(), "Operands must be numbers.\n[line 1] in script");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Backtrace, innermost frame first
    pub stack: Vec<StackFrame>,
}

impl RuntimeError {
    /// Create an error with an empty backtrace.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Message followed by one backtrace line per frame.
    pub fn report(&self) -> String {
        let mut out = self.message.clone();
        for frame in &self.stack {
            out.push('\n');
            out.push_str(&frame.to_string());
        }
        out
    }
}

/// Failure of a compile-and-run call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// Source did not compile
    #[error(transparent)]
    Compile(#[from] CompileErrors),
    /// Execution raised a runtime error
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Three-valued outcome of `interpret`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    /// Program ran to completion
    Ok,
    /// Compilation failed; nothing was executed
    CompileError,
    /// Execution stopped at a runtime error
    RuntimeError,
}

impl InterpretResult {
    /// Process exit code for running a whole file.
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileError => 72,
            InterpretResult::RuntimeError => 73,
        }
    }
}

impl<T> From<&Result<T, InterpretError>> for InterpretResult {
    fn from(result: &Result<T, InterpretError>) -> Self {
        match result {
            Ok(_) => InterpretResult::Ok,
            Err(InterpretError::Compile(_)) => InterpretResult::CompileError,
            Err(InterpretError::Runtime(_)) => InterpretResult::RuntimeError,
        }
    }
}
