//! Memory Manager - object heap and garbage collection
//!
//! This component provides:
//! - An arena heap addressed by generational [`ObjRef`](core_types::ObjRef) handles
//! - The heap object variants (strings, functions, natives, classes, instances, bound methods)
//! - String interning through a weak intern table
//! - The open-addressing [`Table`] used for globals, fields and methods
//! - A tri-color mark-and-sweep collector driven by an allocation threshold

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gc;
pub mod heap;
pub mod object;
pub mod table;

// Re-export main types
pub use gc::{GcConfig, GcStats, NoRoots, Roots, Tracer, MIN_GROWTH_FACTOR};
pub use heap::Heap;
pub use object::{
    hash_string, HeapObject, NativeFn, ObjBoundMethod, ObjClass, ObjFunction, ObjInstance,
    ObjNative, ObjString, Render, Trace,
};
pub use table::{StringKey, Table, TABLE_MAX_LOAD};
