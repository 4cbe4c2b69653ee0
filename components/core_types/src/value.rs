//! Tagged value representation.
//!
//! A [`Value`] is a small `Copy` enum: numbers, booleans and nil are stored
//! inline, everything else lives in the object heap and is referenced through
//! an [`ObjRef`] handle.

use std::fmt;

use crate::number::format_number;

/// Handle to an object in the heap arena.
///
/// The `generation` distinguishes successive occupants of the same arena
/// slot, so a handle kept past its object's collection never resolves to an
/// unrelated object.
///
/// # Examples
///
/// ```
/// use core_types::ObjRef;
///
/// let a = ObjRef::new(3, 0);
/// let b = ObjRef::new(3, 1);
/// assert_eq!(a.index(), b.index());
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

impl ObjRef {
    /// Create a handle for the given arena slot and generation.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot this handle points at.
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when the handle was issued.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Represents any Lox value.
///
/// Heap references compare by identity. Strings are interned, so identity
/// equality doubles as content equality for them.
///
/// # Examples
///
/// ```
/// use core_types::{ObjRef, Value};
///
/// let nil = Value::Nil;
/// let obj = Value::Obj(ObjRef::new(0, 0));
///
/// assert!(nil.is_falsey());
/// assert!(obj.is_truthy());
/// assert_eq!(obj.as_obj(), Some(ObjRef::new(0, 0)));
/// assert_eq!(obj.as_number(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// The absent value
    #[default]
    Nil,
    /// `true` or `false`
    Bool(bool),
    /// IEEE-754 double
    Number(f64),
    /// Reference to a heap object
    Obj(ObjRef),
}

impl Value {
    /// Returns `true` for nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns `true` for booleans.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` for numbers.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` for heap references.
    pub fn is_obj(&self) -> bool {
        matches!(self, Value::Obj(_))
    }

    /// The number payload, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The heap handle, if this is a reference.
    pub fn as_obj(&self) -> Option<ObjRef> {
        match self {
            Value::Obj(r) => Some(*r),
            _ => None,
        }
    }

    /// Falsiness is exactly nil or `false`.
    ///
    /// Zero, the empty string and every heap object are truthy.
    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Negation of [`Value::is_falsey`].
    pub fn is_truthy(&self) -> bool {
        !self.is_falsey()
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Obj(_) => "object",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Obj(r)
    }
}

/// Renders inline values the way `print` does. Heap references render as
/// their handle; use the heap's formatter to see object contents.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Obj(r) => write!(f, "<object {}>", r),
        }
    }
}
