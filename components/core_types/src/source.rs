//! Call stack frames for runtime error backtraces.

use std::fmt;

/// One line of a runtime backtrace.
///
/// # Examples
///
/// ```
/// use core_types::StackFrame;
///
/// let frame = StackFrame {
///     function_name: Some("fib".to_string()),
///     line: 3,
/// };
/// assert_eq!(frame.to_string(), "[line 3] in fib()");
///
/// let script = StackFrame { function_name: None, line: 9 };
/// assert_eq!(script.to_string(), "[line 9] in script");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function, or `None` for the top-level script
    pub function_name: Option<String>,
    /// Source line of the instruction executing in this frame
    pub line: u32,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function_name {
            Some(name) => write!(f, "[line {}] in {}()", self.line, name),
            None => write!(f, "[line {}] in script", self.line),
        }
    }
}
