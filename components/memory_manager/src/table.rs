//! Open-addressing hash table keyed by interned strings.
//!
//! Used for globals, the string intern set, instance fields and class
//! methods. Capacity is always zero or a power of two so the home bucket is
//! `hash & (capacity - 1)`; collisions probe linearly. Deleted entries
//! become tombstones, which keep probe chains intact and still count
//! towards the load factor until the next grow.

use core_types::{ObjRef, Value};

/// Maximum ratio of occupied buckets (live plus tombstones) to capacity.
pub const TABLE_MAX_LOAD: f64 = 0.75;

const MIN_CAPACITY: usize = 8;

/// An interned string handle together with its precomputed hash.
///
/// Keys compare by handle. That is sound because the intern set
/// guarantees one string object per distinct content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringKey {
    /// The interned string
    pub obj: ObjRef,
    /// FNV-1a hash of its bytes
    pub hash: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Bucket {
    #[default]
    Empty,
    Tombstone,
    Full { key: StringKey, value: Value },
}

/// Hash map from [`StringKey`] to [`Value`].
///
/// # Examples
///
/// ```
/// use core_types::{ObjRef, Value};
/// use memory_manager::{StringKey, Table};
///
/// let key = StringKey { obj: ObjRef::new(0, 0), hash: 42 };
/// let mut table = Table::new();
///
/// assert!(table.set(key, Value::Number(1.0)));
/// assert!(!table.set(key, Value::Number(2.0)));
/// assert_eq!(table.get(key), Some(Value::Number(2.0)));
///
/// assert!(table.delete(key));
/// assert_eq!(table.get(key), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Table {
    buckets: Vec<Bucket>,
    /// Full buckets plus tombstones
    occupied: usize,
    live: usize,
}

impl Table {
    /// Create an empty table. No buckets are allocated until the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the table has no live entries.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets in use, counting tombstones.
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: StringKey) -> Option<Value> {
        if self.buckets.is_empty() {
            return None;
        }
        match self.buckets[find_bucket(&self.buckets, key)] {
            Bucket::Full { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Whether `key` has a live entry.
    pub fn contains(&self, key: StringKey) -> bool {
        self.get(key).is_some()
    }

    /// Insert or overwrite. Returns `true` when `key` was not present.
    pub fn set(&mut self, key: StringKey, value: Value) -> bool {
        if (self.occupied + 1) as f64 > self.capacity() as f64 * TABLE_MAX_LOAD {
            let capacity = (self.capacity() * 2).max(MIN_CAPACITY);
            self.resize(capacity);
        }

        let index = find_bucket(&self.buckets, key);
        let bucket = &mut self.buckets[index];
        let is_new = !matches!(bucket, Bucket::Full { .. });
        if matches!(bucket, Bucket::Empty) {
            // Reusing a tombstone does not change occupancy.
            self.occupied += 1;
        }
        if is_new {
            self.live += 1;
        }
        *bucket = Bucket::Full { key, value };
        is_new
    }

    /// Remove `key`, leaving a tombstone. Returns `true` if it was present.
    pub fn delete(&mut self, key: StringKey) -> bool {
        if self.live == 0 {
            return false;
        }
        let index = find_bucket(&self.buckets, key);
        if !matches!(self.buckets[index], Bucket::Full { .. }) {
            return false;
        }
        self.buckets[index] = Bucket::Tombstone;
        self.live -= 1;
        true
    }

    /// Copy every live entry into `to`, overwriting existing keys there.
    pub fn add_all(&self, to: &mut Table) {
        for (key, value) in self.iter() {
            to.set(key, value);
        }
    }

    /// Find an interned string by content.
    ///
    /// `matches` is consulted only for keys whose hash equals `hash`; it
    /// compares the candidate's bytes against the string being interned.
    pub fn find_string(&self, hash: u32, mut matches: impl FnMut(ObjRef) -> bool) -> Option<ObjRef> {
        if self.buckets.is_empty() {
            return None;
        }
        let mask = self.capacity() - 1;
        let mut index = hash as usize & mask;
        loop {
            match self.buckets[index] {
                Bucket::Empty => return None,
                Bucket::Full { key, .. } if key.hash == hash && matches(key.obj) => {
                    return Some(key.obj)
                }
                _ => {}
            }
            index = (index + 1) & mask;
        }
    }

    /// Tombstone every entry whose key was not marked by the collector.
    pub fn remove_white(&mut self, is_marked: impl Fn(ObjRef) -> bool) -> usize {
        let mut removed = 0;
        for bucket in &mut self.buckets {
            if let Bucket::Full { key, .. } = bucket {
                if !is_marked(key.obj) {
                    *bucket = Bucket::Tombstone;
                    removed += 1;
                }
            }
        }
        self.live -= removed;
        removed
    }

    /// Iterate over live entries in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (StringKey, Value)> + '_ {
        self.buckets.iter().filter_map(|bucket| match bucket {
            Bucket::Full { key, value } => Some((*key, *value)),
            _ => None,
        })
    }

    /// Approximate bytes owned by the bucket array.
    pub fn allocated_bytes(&self) -> usize {
        self.buckets.capacity() * std::mem::size_of::<Bucket>()
    }

    fn resize(&mut self, capacity: usize) {
        let old = std::mem::replace(&mut self.buckets, vec![Bucket::Empty; capacity]);
        self.occupied = 0;
        for bucket in old {
            if let Bucket::Full { key, value } = bucket {
                let index = find_bucket(&self.buckets, key);
                self.buckets[index] = Bucket::Full { key, value };
                self.occupied += 1;
            }
        }
        self.live = self.occupied;
    }
}

/// Index of the bucket holding `key`, or of the bucket an insert of `key`
/// should use: the first tombstone passed, else the empty bucket that ended
/// the probe. `buckets` must be non-empty with at least one empty bucket.
fn find_bucket(buckets: &[Bucket], key: StringKey) -> usize {
    let mask = buckets.len() - 1;
    let mut index = key.hash as usize & mask;
    let mut tombstone = None;
    loop {
        match &buckets[index] {
            Bucket::Empty => return tombstone.unwrap_or(index),
            Bucket::Tombstone => {
                tombstone.get_or_insert(index);
            }
            Bucket::Full { key: existing, .. } if existing.obj == key.obj => return index,
            Bucket::Full { .. } => {}
        }
        index = (index + 1) & mask;
    }
}
