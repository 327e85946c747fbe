#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;
use pagekit::ds::RecencyIndex;

// Fuzz arbitrary operation sequences on RecencyIndex against a VecDeque
// ordered newest (front) to oldest (back).
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let capacity = usize::from(data[0] % 16) + 1;
    let mut index: RecencyIndex<u32> = RecencyIndex::try_with_capacity(capacity).unwrap();
    let mut model: VecDeque<(u64, u32)> = VecDeque::new();

    for pair in data[1..].chunks_exact(2) {
        let op = pair[0] % 8;
        let key = u64::from(pair[1] % 32);
        let value = u32::from(pair[0]);
        let pos = model.iter().position(|&(k, _)| k == key);

        match op {
            0 | 1 => {
                // insert: new keys become newest, existing keys keep their place
                let result = index.insert(key, value);
                match pos {
                    Some(i) => {
                        assert_eq!(result, Ok(Some(model[i].1)));
                        model[i].1 = value;
                    }
                    None if model.len() == capacity => assert!(result.is_err()),
                    None => {
                        assert_eq!(result, Ok(None));
                        model.push_front((key, value));
                    }
                }
            }
            2 => {
                assert_eq!(index.remove(key), pos.map(|i| model[i].1));
                if let Some(i) = pos {
                    model.remove(i);
                }
            }
            3 => {
                assert_eq!(index.pop_oldest(), model.pop_back());
            }
            4 => {
                assert_eq!(index.pop_newest(), model.pop_front());
            }
            5 => {
                assert_eq!(index.make_newest(key), pos.is_some());
                if let Some(entry) = pos.and_then(|i| model.remove(i)) {
                    model.push_front(entry);
                }
            }
            6 => {
                assert_eq!(index.make_oldest(key), pos.is_some());
                if let Some(entry) = pos.and_then(|i| model.remove(i)) {
                    model.push_back(entry);
                }
            }
            _ => {
                assert_eq!(index.get(key), pos.map(|i| model[i].1));
            }
        }

        assert_eq!(index.len(), model.len());
        assert_eq!(index.peek_newest(), model.front().copied());
        assert_eq!(index.peek_oldest(), model.back().copied());
    }

    index.check_invariants().unwrap();
    assert!(index.iter().eq(model.iter().copied()));
});
