//! Heap object variants.
//!
//! Every variant implements [`Trace`] so the collector can find the handles
//! it holds and account for its size, and [`Render`] so `print` can show it.
//! [`HeapObject`] forwards both to the variant it wraps.

use std::mem::size_of;
use std::rc::Rc;

use bytecode_system::Chunk;
use core_types::{ObjRef, Value};

use crate::gc::Tracer;
use crate::heap::Heap;
use crate::table::Table;

/// Host callback installed as a native function.
///
/// The argument count is `args.len()`.
pub type NativeFn = fn(args: &[Value]) -> Value;

/// Collector capability every heap variant provides.
pub trait Trace {
    /// Mark every handle this object holds.
    fn trace(&self, tracer: &mut Tracer<'_>);

    /// Bytes charged against the collection threshold.
    fn heap_size(&self) -> usize;
}

/// Display capability used by `print` and the disassembler.
pub trait Render {
    /// Append the display form of this object to `out`.
    fn render(&self, heap: &Heap, out: &mut String);
}

/// Immutable interned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjString {
    /// String contents
    pub chars: Box<str>,
    /// FNV-1a hash of `chars`
    pub hash: u32,
}

impl ObjString {
    /// Wrap `chars`, computing its hash.
    pub fn new(chars: impl Into<Box<str>>) -> Self {
        let chars = chars.into();
        let hash = hash_string(&chars);
        Self { chars, hash }
    }
}

/// 32-bit FNV-1a over the string's bytes.
///
/// # Examples
///
/// ```
/// use memory_manager::hash_string;
///
/// assert_eq!(hash_string(""), 2166136261);
/// assert_ne!(hash_string("a"), hash_string("b"));
/// ```
pub fn hash_string(chars: &str) -> u32 {
    let mut hash: u32 = 2166136261;
    for byte in chars.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// A compiled function.
#[derive(Debug, Clone)]
pub struct ObjFunction {
    /// Function name, `None` for the top-level script
    pub name: Option<ObjRef>,
    /// Declared parameter count
    pub arity: u8,
    /// Compiled body, shared with the call frames executing it
    pub chunk: Rc<Chunk>,
}

/// A host function callable from Lox.
#[derive(Clone, Copy)]
pub struct ObjNative {
    /// The callback
    pub function: NativeFn,
}

impl std::fmt::Debug for ObjNative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ObjNative(..)")
    }
}

/// A class. Methods are stored but not dispatched.
#[derive(Debug, Clone)]
pub struct ObjClass {
    /// Class name
    pub name: ObjRef,
    /// Method table
    pub methods: Table,
}

impl ObjClass {
    /// Class with no methods.
    pub fn new(name: ObjRef) -> Self {
        Self {
            name,
            methods: Table::new(),
        }
    }
}

/// An instance with dynamically added fields.
#[derive(Debug, Clone)]
pub struct ObjInstance {
    /// The instance's class
    pub class: ObjRef,
    /// Field values by name
    pub fields: Table,
}

impl ObjInstance {
    /// Instance with no fields.
    pub fn new(class: ObjRef) -> Self {
        Self {
            class,
            fields: Table::new(),
        }
    }
}

/// A function paired with the receiver it is called on.
#[derive(Debug, Clone, Copy)]
pub struct ObjBoundMethod {
    /// Value placed in slot 0 of the callee's frame
    pub receiver: Value,
    /// The function to call
    pub method: ObjRef,
}

/// Any object stored in the heap.
#[derive(Debug, Clone)]
pub enum HeapObject {
    /// Interned string
    String(ObjString),
    /// Compiled function
    Function(ObjFunction),
    /// Host function
    Native(ObjNative),
    /// Class
    Class(ObjClass),
    /// Class instance
    Instance(ObjInstance),
    /// Receiver-bound function
    BoundMethod(ObjBoundMethod),
}

impl HeapObject {
    /// Variant name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            HeapObject::String(_) => "string",
            HeapObject::Function(_) => "function",
            HeapObject::Native(_) => "native",
            HeapObject::Class(_) => "class",
            HeapObject::Instance(_) => "instance",
            HeapObject::BoundMethod(_) => "bound method",
        }
    }

    fn as_dyn(&self) -> (&dyn Trace, &dyn Render) {
        match self {
            HeapObject::String(o) => (o, o),
            HeapObject::Function(o) => (o, o),
            HeapObject::Native(o) => (o, o),
            HeapObject::Class(o) => (o, o),
            HeapObject::Instance(o) => (o, o),
            HeapObject::BoundMethod(o) => (o, o),
        }
    }
}

impl Trace for HeapObject {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        self.as_dyn().0.trace(tracer)
    }

    fn heap_size(&self) -> usize {
        size_of::<HeapObject>() + self.as_dyn().0.heap_size()
    }
}

impl Render for HeapObject {
    fn render(&self, heap: &Heap, out: &mut String) {
        self.as_dyn().1.render(heap, out)
    }
}

impl Trace for ObjString {
    fn trace(&self, _tracer: &mut Tracer<'_>) {}

    fn heap_size(&self) -> usize {
        self.chars.len()
    }
}

impl Render for ObjString {
    fn render(&self, _heap: &Heap, out: &mut String) {
        out.push_str(&self.chars);
    }
}

impl Trace for ObjFunction {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        if let Some(name) = self.name {
            tracer.mark_object(name);
        }
        for constant in self.chunk.constants() {
            tracer.mark_value(*constant);
        }
    }

    fn heap_size(&self) -> usize {
        let chunk = &self.chunk;
        chunk.len() * (1 + size_of::<u32>()) + chunk.constants().len() * size_of::<Value>()
    }
}

impl Render for ObjFunction {
    fn render(&self, heap: &Heap, out: &mut String) {
        match self.name.and_then(|name| heap.string(name)) {
            Some(name) => {
                out.push_str("<fn ");
                out.push_str(&name.chars);
                out.push('>');
            }
            None => out.push_str("<script>"),
        }
    }
}

impl Trace for ObjNative {
    fn trace(&self, _tracer: &mut Tracer<'_>) {}

    fn heap_size(&self) -> usize {
        0
    }
}

impl Render for ObjNative {
    fn render(&self, _heap: &Heap, out: &mut String) {
        out.push_str("<native fn>");
    }
}

impl Trace for ObjClass {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark_object(self.name);
        tracer.mark_table(&self.methods);
    }

    fn heap_size(&self) -> usize {
        self.methods.allocated_bytes()
    }
}

impl Render for ObjClass {
    fn render(&self, heap: &Heap, out: &mut String) {
        if let Some(name) = heap.string(self.name) {
            out.push_str(&name.chars);
        }
    }
}

impl Trace for ObjInstance {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark_object(self.class);
        tracer.mark_table(&self.fields);
    }

    fn heap_size(&self) -> usize {
        self.fields.allocated_bytes()
    }
}

impl Render for ObjInstance {
    fn render(&self, heap: &Heap, out: &mut String) {
        if let Some(class) = heap.get(self.class) {
            class.render(heap, out);
        }
        out.push_str(" instance");
    }
}

impl Trace for ObjBoundMethod {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark_value(self.receiver);
        tracer.mark_object(self.method);
    }

    fn heap_size(&self) -> usize {
        0
    }
}

impl Render for ObjBoundMethod {
    fn render(&self, heap: &Heap, out: &mut String) {
        if let Some(method) = heap.get(self.method) {
            method.render(heap, out);
        }
    }
}
