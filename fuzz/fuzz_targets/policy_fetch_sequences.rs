#![no_main]

use libfuzzer_sys::fuzz_target;
use pagekit::builder::{CacheBuilder, CachePolicy};
use pagekit::trace::{check_pattern, fill_pattern};
use pagekit::traits::PageCache;

// Fuzz fetch sequences through every policy.
//
// The first byte picks the capacity, every following byte is a key. Each miss
// writes the key's pattern and each hit must still see it.
fuzz_target!(|data: &[u8]| {
    let Some((&first, keys)) = data.split_first() else {
        return;
    };
    let capacity = usize::from(first % 24) + 2;

    for policy in CachePolicy::ALL {
        let mut cache = CacheBuilder::new(capacity)
            .slot_size(13)
            .build(policy)
            .unwrap();

        for &byte in keys {
            let key = u64::from(byte % 48);
            let mut page = cache.fetch(key);
            if page.is_hit() {
                assert!(check_pattern(page.data(), key), "{policy}: key {key} lost its data");
            } else {
                fill_pattern(page.data_mut(), key);
            }
            assert!(cache.contains(key));
            assert!(cache.len() <= capacity);
        }

        cache.check_invariants().unwrap();
    }
});
