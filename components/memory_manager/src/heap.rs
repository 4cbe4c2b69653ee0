//! Object heap.
//!
//! Objects live in an arena of slots addressed by [`ObjRef`]. Freed slots go
//! on a free list and have their generation bumped, so a handle that outlived
//! its object resolves to nothing instead of to the slot's next occupant.
//!
//! Every allocation goes through [`Heap::alloc`], which may run a collection
//! first. Callers pass the roots they hold; anything not reachable from them
//! may be freed before the call returns.

use bytecode_system::ConstantFormatter;
use core_types::{ObjRef, Value};

use crate::gc::{GcConfig, GcStats, Roots};
use crate::object::{
    HeapObject, ObjClass, ObjFunction, ObjInstance, ObjNative, ObjString, Render, Trace,
};
use crate::table::{StringKey, Table};

#[derive(Debug)]
struct Allocation {
    object: HeapObject,
    size: usize,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Allocation>,
}

/// Garbage-collected object heap.
///
/// # Examples
///
/// ```
/// use memory_manager::{Heap, NoRoots};
///
/// let mut heap = Heap::new();
/// let a = heap.intern("hello", &NoRoots);
/// let b = heap.intern("hello", &NoRoots);
/// assert_eq!(a, b);
///
/// heap.collect_garbage(&NoRoots);
/// assert!(!heap.contains(a));
/// ```
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Weak intern set; values are unused.
    pub(crate) strings: Table,
    pub(crate) bytes_allocated: usize,
    pub(crate) next_gc: usize,
    pub(crate) config: GcConfig,
    pub(crate) stats: GcStats,
}

impl Heap {
    /// Create a heap with the default collector configuration.
    pub fn new() -> Self {
        Self::with_config(GcConfig::default())
    }

    /// Create a heap with a custom collector configuration.
    pub fn with_config(config: GcConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            strings: Table::new(),
            bytes_allocated: 0,
            next_gc: config.initial_threshold,
            config,
            stats: GcStats::default(),
        }
    }

    /// Collector configuration.
    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    /// Cumulative statistics.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Bytes currently charged to live objects.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    /// Threshold that triggers the next collection.
    pub fn next_gc(&self) -> usize {
        self.next_gc
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of interned strings.
    pub fn interned_count(&self) -> usize {
        self.strings.len()
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Move `object` into the heap, collecting first if the threshold is
    /// reached or stress mode is on.
    ///
    /// `object` itself is treated as a root during that collection, so the
    /// handles it holds stay valid.
    ///
    /// # Panics
    ///
    /// Panics if the arena exceeds `u32::MAX` slots, which is treated like
    /// host memory exhaustion.
    pub fn alloc(&mut self, object: HeapObject, roots: &dyn Roots) -> ObjRef {
        let size = object.heap_size();
        if self.config.stress || self.bytes_allocated + size > self.next_gc {
            self.collect_with(roots, Some(&object));
        }
        self.insert(object, size)
    }

    fn insert(&mut self, object: HeapObject, size: usize) -> ObjRef {
        self.bytes_allocated += size;
        self.stats.objects_allocated += 1;
        self.stats.peak_bytes = self.stats.peak_bytes.max(self.bytes_allocated);

        let entry = Some(Allocation { object, size });
        let r = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = entry;
                ObjRef::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("object heap exhausted"));
                self.slots.push(Slot {
                    generation: 0,
                    entry,
                });
                ObjRef::new(index, 0)
            }
        };
        log::trace!("{} allocate {} bytes for {}", r, size, self.describe(r));
        r
    }

    /// Free every slot whose index `is_marked` rejects. Returns
    /// `(objects, bytes)` freed.
    pub(crate) fn sweep(&mut self, is_marked: impl Fn(usize) -> bool) -> (usize, usize) {
        let mut objects = 0;
        let mut bytes = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.is_none() || is_marked(index) {
                continue;
            }
            if let Some(allocation) = slot.entry.take() {
                log::trace!("#{}.{} free {}", index, slot.generation, allocation.object.kind());
                bytes += allocation.size;
                objects += 1;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.bytes_allocated -= bytes;
        (objects, bytes)
    }

    /// Whether `r` refers to a live object.
    pub fn contains(&self, r: ObjRef) -> bool {
        self.get(r).is_some()
    }

    /// The object behind `r`, if it is still live.
    pub fn get(&self, r: ObjRef) -> Option<&HeapObject> {
        self.slots
            .get(r.index())
            .filter(|slot| slot.generation == r.generation())
            .and_then(|slot| slot.entry.as_ref())
            .map(|allocation| &allocation.object)
    }

    /// Mutable access to the object behind `r`.
    ///
    /// Changes that grow the object should go through methods that keep
    /// the byte count current, such as [`Heap::set_field`].
    pub fn get_mut(&mut self, r: ObjRef) -> Option<&mut HeapObject> {
        self.slots
            .get_mut(r.index())
            .filter(|slot| slot.generation == r.generation())
            .and_then(|slot| slot.entry.as_mut())
            .map(|allocation| &mut allocation.object)
    }

    /// `r` as a string.
    pub fn string(&self, r: ObjRef) -> Option<&ObjString> {
        match self.get(r)? {
            HeapObject::String(s) => Some(s),
            _ => None,
        }
    }

    /// `r` as a function.
    pub fn function(&self, r: ObjRef) -> Option<&ObjFunction> {
        match self.get(r)? {
            HeapObject::Function(f) => Some(f),
            _ => None,
        }
    }

    /// `r` as a native function.
    pub fn native(&self, r: ObjRef) -> Option<&ObjNative> {
        match self.get(r)? {
            HeapObject::Native(n) => Some(n),
            _ => None,
        }
    }

    /// `r` as a class.
    pub fn class(&self, r: ObjRef) -> Option<&ObjClass> {
        match self.get(r)? {
            HeapObject::Class(c) => Some(c),
            _ => None,
        }
    }

    /// `r` as an instance.
    pub fn instance(&self, r: ObjRef) -> Option<&ObjInstance> {
        match self.get(r)? {
            HeapObject::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Table key for the string `r`.
    pub fn string_key(&self, r: ObjRef) -> Option<StringKey> {
        self.string(r).map(|s| StringKey { obj: r, hash: s.hash })
    }

    /// Look up an already interned string by content.
    pub fn find_interned(&self, chars: &str) -> Option<ObjRef> {
        let hash = crate::object::hash_string(chars);
        self.strings
            .find_string(hash, |candidate| self.string(candidate).is_some_and(|s| &*s.chars == chars))
    }

    /// Return the interned string for `chars`, allocating it if needed.
    pub fn intern(&mut self, chars: &str, roots: &dyn Roots) -> ObjRef {
        match self.find_interned(chars) {
            Some(existing) => existing,
            None => self.insert_interned(ObjString::new(chars), roots),
        }
    }

    /// Like [`Heap::intern`] but takes ownership of the buffer.
    pub fn take_string(&mut self, chars: String, roots: &dyn Roots) -> ObjRef {
        match self.find_interned(&chars) {
            Some(existing) => existing,
            None => self.insert_interned(ObjString::new(chars), roots),
        }
    }

    fn insert_interned(&mut self, string: ObjString, roots: &dyn Roots) -> ObjRef {
        let hash = string.hash;
        let r = self.alloc(HeapObject::String(string), roots);
        self.strings.set(StringKey { obj: r, hash }, Value::Nil);
        r
    }

    /// Intern the concatenation of two strings.
    ///
    /// Returns `None` unless both handles are live strings. The operands
    /// must be reachable from `roots` for the duration of the call.
    pub fn concatenate(&mut self, a: ObjRef, b: ObjRef, roots: &dyn Roots) -> Option<ObjRef> {
        let left = self.string(a)?;
        let right = self.string(b)?;
        let mut chars = String::with_capacity(left.chars.len() + right.chars.len());
        chars.push_str(&left.chars);
        chars.push_str(&right.chars);
        Some(self.take_string(chars, roots))
    }

    /// Read a field of an instance.
    pub fn get_field(&self, instance: ObjRef, name: StringKey) -> Option<Value> {
        self.instance(instance)?.fields.get(name)
    }

    /// Write a field of an instance, keeping the byte count current as the
    /// field table grows. Returns `false` if `instance` is not an instance.
    pub fn set_field(&mut self, instance: ObjRef, name: StringKey, value: Value) -> bool {
        let Some(slot) = self
            .slots
            .get_mut(instance.index())
            .filter(|slot| slot.generation == instance.generation())
        else {
            return false;
        };
        let Some(Allocation {
            object: HeapObject::Instance(obj),
            size,
        }) = slot.entry.as_mut()
        else {
            return false;
        };

        obj.fields.set(name, value);
        let new_size = HeapObject::Instance(ObjInstance::new(obj.class)).heap_size()
            + obj.fields.allocated_bytes();
        self.bytes_allocated = self.bytes_allocated - *size + new_size;
        *size = new_size;
        self.stats.peak_bytes = self.stats.peak_bytes.max(self.bytes_allocated);
        true
    }

    /// Display form of `value`, as `print` shows it.
    pub fn format_value(&self, value: Value) -> String {
        match value {
            Value::Obj(r) => self.describe(r),
            other => other.to_string(),
        }
    }

    /// Display form of the object behind `r`.
    pub fn describe(&self, r: ObjRef) -> String {
        let mut out = String::new();
        match self.get(r) {
            Some(object) => object.render(self, &mut out),
            None => out.push_str("<freed object>"),
        }
        out
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantFormatter for Heap {
    fn format_constant(&self, value: Value) -> String {
        self.format_value(value)
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        log::debug!(
            "heap teardown: releasing {} objects ({} bytes) after {} collections",
            self.object_count(),
            self.bytes_allocated,
            self.stats.collections
        );
    }
}
