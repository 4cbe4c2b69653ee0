use std::collections::HashMap;

use core_types::{ObjRef, Value};
use memory_manager::{StringKey, Table, TABLE_MAX_LOAD};

fn key(index: u32, hash: u32) -> StringKey {
    StringKey {
        obj: ObjRef::new(index, 0),
        hash,
    }
}

/// Random insert/lookup/delete sequences agree with a HashMap model.
#[test]
fn test_matches_model_under_random_operations() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _round in 0..20 {
        let mut table = Table::new();
        let mut model: HashMap<u32, f64> = HashMap::new();

        for step in 0..2_000 {
            // Few distinct hashes so probe chains collide heavily.
            let index = rng.u32(0..64);
            let k = key(index, index % 7);
            match rng.u8(0..3) {
                0 => {
                    let value = step as f64;
                    let was_new = table.set(k, Value::Number(value));
                    assert_eq!(was_new, model.insert(index, value).is_none());
                    let load = table.occupied() as f64 / table.capacity() as f64;
                    assert!(load <= TABLE_MAX_LOAD, "load {} after insert", load);
                }
                1 => {
                    assert_eq!(table.delete(k), model.remove(&index).is_some());
                }
                _ => {
                    assert_eq!(table.get(k), model.get(&index).map(|v| Value::Number(*v)));
                }
            }
            assert_eq!(table.len(), model.len());
        }

        for (index, value) in &model {
            assert_eq!(table.get(key(*index, index % 7)), Some(Value::Number(*value)));
        }
    }
}

#[test]
fn test_capacity_is_power_of_two() {
    let mut table = Table::new();
    for i in 0..100 {
        table.set(key(i, i.wrapping_mul(2654435761)), Value::Nil);
        assert!(table.capacity().is_power_of_two());
    }
    assert_eq!(table.len(), 100);
}

#[test]
fn test_delete_missing_key() {
    let mut table = Table::new();
    assert!(!table.delete(key(1, 1)));
    table.set(key(1, 1), Value::Nil);
    assert!(!table.delete(key(2, 1)));
    assert!(table.delete(key(1, 1)));
    assert!(!table.delete(key(1, 1)));
}

#[test]
fn test_iter_yields_live_entries_only() {
    let mut table = Table::new();
    table.set(key(1, 1), Value::Number(1.0));
    table.set(key(2, 2), Value::Number(2.0));
    table.delete(key(1, 1));
    let entries: Vec<_> = table.iter().collect();
    assert_eq!(entries, vec![(key(2, 2), Value::Number(2.0))]);
}
