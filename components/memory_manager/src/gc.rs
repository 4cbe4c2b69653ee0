//! Mark-and-sweep collector.
//!
//! A cycle runs in four steps:
//!
//! 1. Roots mark the handles they hold. Marking sets the object's bit in a
//!    per-cycle bitmap and pushes it on the gray worklist (white -> gray).
//! 2. The worklist is drained; each popped object marks its own references
//!    (gray -> black).
//! 3. Intern-table entries whose string stayed white are tombstoned, since
//!    interning alone does not keep a string alive.
//! 4. The arena is swept: every occupied slot whose bit is clear is freed
//!    and its generation bumped.
//!
//! The next threshold is `bytes_after * growth_factor`.

use core_types::{ObjRef, Value};

use crate::heap::Heap;
use crate::object::{HeapObject, Trace};
use crate::table::Table;

/// Something that holds handles the collector must treat as live.
pub trait Roots {
    /// Mark every handle held.
    fn trace_roots(&self, tracer: &mut Tracer<'_>);
}

/// Root set with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoots;

impl Roots for NoRoots {
    fn trace_roots(&self, _tracer: &mut Tracer<'_>) {}
}

impl Roots for [Value] {
    fn trace_roots(&self, tracer: &mut Tracer<'_>) {
        for value in self {
            tracer.mark_value(*value);
        }
    }
}

impl Roots for Vec<Value> {
    fn trace_roots(&self, tracer: &mut Tracer<'_>) {
        self.as_slice().trace_roots(tracer)
    }
}

impl Roots for Table {
    fn trace_roots(&self, tracer: &mut Tracer<'_>) {
        tracer.mark_table(self);
    }
}

impl<T: Roots + ?Sized> Roots for &T {
    fn trace_roots(&self, tracer: &mut Tracer<'_>) {
        (**self).trace_roots(tracer)
    }
}

impl<A: Roots, B: Roots> Roots for (A, B) {
    fn trace_roots(&self, tracer: &mut Tracer<'_>) {
        self.0.trace_roots(tracer);
        self.1.trace_roots(tracer);
    }
}

/// Smallest growth factor; the next threshold never drops below the live
/// heap.
pub const MIN_GROWTH_FACTOR: f64 = 1.0;

/// Collector tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct GcConfig {
    /// Bytes allocated before the first collection
    pub initial_threshold: usize,
    /// Multiplier applied to live bytes to get the next threshold
    pub growth_factor: f64,
    /// Collect before every allocation
    pub stress: bool,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 1024 * 1024,
            growth_factor: 2.0,
            stress: false,
        }
    }
}

impl GcConfig {
    /// Set the first-collection threshold.
    pub fn with_initial_threshold(mut self, bytes: usize) -> Self {
        self.initial_threshold = bytes;
        self
    }

    /// Set the threshold multiplier.
    ///
    /// Factors below [`MIN_GROWTH_FACTOR`], and NaN, are raised to it.
    pub fn with_growth_factor(mut self, factor: f64) -> Self {
        self.growth_factor = factor.max(MIN_GROWTH_FACTOR);
        self
    }

    /// Threshold for the next cycle given the bytes still live.
    pub fn next_threshold(&self, live_bytes: usize) -> usize {
        let factor = self.growth_factor.max(MIN_GROWTH_FACTOR);
        (live_bytes as f64 * factor) as usize
    }

    /// Enable or disable stress mode.
    pub fn with_stress(mut self, stress: bool) -> Self {
        self.stress = stress;
        self
    }
}

/// Cumulative collector statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Completed cycles
    pub collections: u64,
    /// Objects ever allocated
    pub objects_allocated: u64,
    /// Objects freed by sweeps
    pub objects_freed: u64,
    /// Bytes freed by sweeps
    pub bytes_freed: u64,
    /// Highest `bytes_allocated` seen
    pub peak_bytes: usize,
}

#[derive(Debug, Default)]
struct MarkBits {
    words: Vec<u64>,
}

impl MarkBits {
    fn with_len(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
        }
    }

    /// Set bit `index`; returns `false` if it was already set.
    fn insert(&mut self, index: usize) -> bool {
        let (word, bit) = (index / 64, 1u64 << (index % 64));
        match self.words.get_mut(word) {
            Some(w) if *w & bit == 0 => {
                *w |= bit;
                true
            }
            _ => false,
        }
    }

    fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / 64)
            .is_some_and(|w| w & (1u64 << (index % 64)) != 0)
    }
}

/// Marking state for one collection cycle.
pub struct Tracer<'h> {
    heap: &'h Heap,
    marks: MarkBits,
    gray: Vec<ObjRef>,
}

impl<'h> Tracer<'h> {
    fn new(heap: &'h Heap) -> Self {
        Self {
            heap,
            marks: MarkBits::with_len(heap.slot_count()),
            gray: Vec::new(),
        }
    }

    /// Mark the object behind `value`, if it is a reference.
    pub fn mark_value(&mut self, value: Value) {
        if let Value::Obj(r) = value {
            self.mark_object(r);
        }
    }

    /// Mark `r` and queue it for scanning. Stale handles are ignored.
    pub fn mark_object(&mut self, r: ObjRef) {
        if !self.heap.contains(r) || !self.marks.insert(r.index()) {
            return;
        }
        log::trace!("{} mark {}", r, self.heap.describe(r));
        self.gray.push(r);
    }

    /// Mark every key and value of `table`.
    pub fn mark_table(&mut self, table: &Table) {
        for (key, value) in table.iter() {
            self.mark_object(key.obj);
            self.mark_value(value);
        }
    }

    fn trace_references(&mut self) {
        let heap = self.heap;
        while let Some(r) = self.gray.pop() {
            log::trace!("{} blacken {}", r, heap.describe(r));
            if let Some(object) = heap.get(r) {
                object.trace(self);
            }
        }
    }
}

impl Heap {
    /// Run a full collection cycle now.
    ///
    /// Returns the number of bytes freed.
    pub fn collect_garbage(&mut self, roots: &dyn Roots) -> usize {
        self.collect_with(roots, None)
    }

    /// Collect, additionally treating `pending` (an object about to be
    /// inserted) as a root so its references survive.
    pub(crate) fn collect_with(&mut self, roots: &dyn Roots, pending: Option<&HeapObject>) -> usize {
        let before = self.bytes_allocated;
        log::debug!("-- gc begin");

        let marks = {
            let mut tracer = Tracer::new(self);
            roots.trace_roots(&mut tracer);
            if let Some(object) = pending {
                object.trace(&mut tracer);
            }
            tracer.trace_references();
            tracer.marks
        };

        let pruned = self.strings.remove_white(|r| marks.contains(r.index()));
        let (objects, bytes) = self.sweep(|index| marks.contains(index));

        self.next_gc = self.config.next_threshold(self.bytes_allocated);
        self.stats.collections += 1;
        self.stats.objects_freed += objects as u64;
        self.stats.bytes_freed += bytes as u64;

        log::debug!("-- gc end");
        log::debug!(
            "collected {} bytes (from {} to {}) next at {}; {} objects freed, {} interned strings pruned",
            before - self.bytes_allocated,
            before,
            self.bytes_allocated,
            self.next_gc,
            objects,
            pruned
        );
        bytes
    }
}
