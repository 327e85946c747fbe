#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use pagekit::ds::OpenIndex;

// Fuzz arbitrary insert/remove/get sequences on OpenIndex against a HashMap.
//
// Keys come from a small range so probe paths collide and tombstones pile up.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = usize::from(data[0] % 32) + 1;
    let mut index: OpenIndex<u32> = OpenIndex::try_with_capacity(capacity).unwrap();
    let mut model: HashMap<u64, u32> = HashMap::new();

    for pair in data[1..].chunks_exact(2) {
        let op = pair[0] % 4;
        let key = u64::from(pair[1] % 64);
        let value = u32::from(pair[0]);

        match op {
            0 | 1 => {
                // insert
                match index.insert(key, value) {
                    Ok(previous) => {
                        assert_eq!(previous, model.insert(key, value));
                    }
                    Err(_) => {
                        // only a table with every record live may refuse
                        assert!(!model.contains_key(&key));
                        assert_eq!(index.len(), index.record_count());
                    }
                }
            }
            2 => {
                // remove
                assert_eq!(index.remove(key), model.remove(&key));
                assert!(!index.contains(key));
            }
            _ => {
                // get
                assert_eq!(index.get(key), model.get(&key).copied());
            }
        }

        assert_eq!(index.len(), model.len());
    }

    index.check_invariants().unwrap();
    for (key, value) in &model {
        assert_eq!(index.get(*key), Some(*value));
    }

    index.clear();
    assert!(index.is_empty());
    assert_eq!(index.tombstones(), 0);
});
