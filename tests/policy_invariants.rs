// ==============================================
// CROSS-POLICY INVARIANT TESTS (integration)
// ==============================================
//
// Behaviour every page cache shares, checked through the public API only.
// Policy-specific eviction orders live in each policy's own unit tests.

use pagekit::builder::{Cache, CacheBuilder, CachePolicy};
use pagekit::trace::{check_pattern, fill_pattern};
use pagekit::traits::PageCache;

fn build(policy: CachePolicy, capacity: usize) -> Cache {
    CacheBuilder::new(capacity)
        .slot_size(24)
        .build(policy)
        .unwrap()
}

/// Fetches `key`, filling on a miss and verifying on a hit. Returns
/// `(hit, slot index)`.
#[track_caller]
fn touch(cache: &mut Cache, key: u64) -> (bool, usize) {
    let mut page = cache.fetch(key);
    let hit = page.is_hit();
    if hit {
        assert!(check_pattern(page.data(), key), "key {key} lost its data");
    } else {
        fill_pattern(page.data_mut(), key);
    }
    (hit, page.slot_id().index())
}

// ==============================================
// Construction
// ==============================================

mod construction {
    use super::*;

    #[test]
    fn below_minimum_capacity_is_rejected() {
        for policy in CachePolicy::ALL {
            let min = policy.min_capacity();
            assert!(CacheBuilder::new(min - 1).build(policy).is_err(), "{policy}");
            assert!(CacheBuilder::new(min).build(policy).is_ok(), "{policy}");
        }
    }

    #[test]
    fn new_cache_is_empty() {
        for policy in CachePolicy::ALL {
            let cache = build(policy, 16);
            assert!(cache.is_empty());
            assert_eq!(cache.capacity(), 16);
            assert_eq!(cache.slot_size(), 24);
            cache.check_invariants().unwrap();
        }
    }

    #[test]
    fn zero_sized_slots_still_track_keys() {
        for policy in CachePolicy::ALL {
            let mut cache = CacheBuilder::new(4).slot_size(0).build(policy).unwrap();
            assert!(cache.fetch(1).data().is_empty());
            assert!(cache.fetch(1).is_hit(), "{policy}");
        }
    }
}

// ==============================================
// Hits
// ==============================================

mod hits {
    use super::*;

    #[test]
    fn second_fetch_hits_the_same_slot() {
        for policy in CachePolicy::ALL {
            let mut cache = build(policy, 8);
            for key in [5, 1 << 40, u64::MAX, 0] {
                let (first_hit, first_slot) = touch(&mut cache, key);
                let (second_hit, second_slot) = touch(&mut cache, key);
                assert!(!first_hit, "{policy}");
                assert!(second_hit, "{policy}");
                assert_eq!(first_slot, second_slot, "{policy}");
            }
        }
    }

    #[test]
    fn no_eviction_below_capacity() {
        for policy in CachePolicy::ALL {
            let mut cache = build(policy, 32);
            for key in 0..32 {
                assert!(!touch(&mut cache, key * 1009).0);
            }
            for round in 0..3 {
                for key in 0..32 {
                    assert!(touch(&mut cache, key * 1009).0, "{policy} round {round}");
                }
            }
            assert_eq!(cache.len(), 32);
        }
    }

    #[test]
    fn contains_does_not_change_eviction() {
        for policy in [
            CachePolicy::Fifo,
            CachePolicy::Clock,
            CachePolicy::Lru,
            CachePolicy::Slru,
        ] {
            let mut probed = build(policy, 4);
            let mut plain = build(policy, 4);
            for key in 0..12u64 {
                for k in 0..12 {
                    let _ = probed.contains(k);
                }
                assert_eq!(touch(&mut probed, key % 6), touch(&mut plain, key % 6), "{policy}");
            }
        }
    }
}

// ==============================================
// Capacity
// ==============================================

mod capacity {
    use super::*;

    #[test]
    fn resident_keys_never_exceed_capacity() {
        for policy in CachePolicy::ALL {
            let mut cache = build(policy, 8);
            for i in 0..500u64 {
                touch(&mut cache, (i * 37) % 61);
                assert!(cache.len() <= 8);
            }
            let resident = (0..61).filter(|&k| cache.contains(k)).count();
            assert_eq!(resident, 8, "{policy}");
            cache.check_invariants().unwrap();
        }
    }

    #[test]
    fn slots_are_never_shared() {
        for policy in CachePolicy::ALL {
            let mut cache = build(policy, 6);
            for i in 0..300u64 {
                touch(&mut cache, (i * 13) % 17);
            }
            let resident: Vec<u64> = (0..17).filter(|&k| cache.contains(k)).collect();
            let mut slots: Vec<usize> = resident.iter().map(|&k| touch(&mut cache, k).1).collect();
            slots.sort_unstable();
            slots.dedup();
            assert_eq!(slots.len(), 6, "{policy}");
        }
    }
}

// ==============================================
// Documented eviction examples
// ==============================================

mod examples {
    use super::*;

    #[test]
    fn fifo_evicts_first_inserted() {
        let mut cache = build(CachePolicy::Fifo, 8);
        for key in 0..8 {
            touch(&mut cache, key);
        }
        touch(&mut cache, 8);
        assert!(!cache.contains(0));
        assert!((1..9).all(|k| cache.contains(k)));
    }

    #[test]
    fn clock_gives_referenced_slot_a_second_chance() {
        for policy in [CachePolicy::Clock, CachePolicy::GClock { max_references: 1 }] {
            let mut cache = build(policy, 8);
            for key in 0..8 {
                touch(&mut cache, key);
            }
            assert!(touch(&mut cache, 1).0);
            touch(&mut cache, 8);
            assert!(!cache.contains(0), "{policy}");
            touch(&mut cache, 0);
            assert!(!cache.contains(2), "{policy}");
            assert!(cache.contains(1), "{policy}");
        }
    }

    #[test]
    fn lru_repeated_hits_leave_next_victim_alone() {
        let mut cache = build(CachePolicy::Lru, 8);
        for key in 0..9 {
            touch(&mut cache, key);
        }
        assert!(!cache.contains(0));
        for _ in 0..10 {
            assert!(touch(&mut cache, 5).0);
        }
        touch(&mut cache, 9);
        assert!(!cache.contains(1));
    }

    #[test]
    fn slru_twice_accessed_keys_survive_a_scan() {
        let mut cache = build(CachePolicy::Slru, 8);
        for key in 0..4 {
            touch(&mut cache, key);
            touch(&mut cache, key);
        }
        for key in 100..200 {
            touch(&mut cache, key);
        }
        assert!((0..4).all(|k| cache.contains(k)));
    }
}

// ==============================================
// Property tests
// ==============================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn policy() -> impl Strategy<Value = CachePolicy> {
        prop_oneof![
            Just(CachePolicy::Fifo),
            any::<u64>().prop_map(|seed| CachePolicy::Random { seed: Some(seed) }),
            Just(CachePolicy::Clock),
            (1u8..6).prop_map(|max_references| CachePolicy::GClock { max_references }),
            Just(CachePolicy::Lru),
            Just(CachePolicy::Slru),
        ]
    }

    proptest! {
        /// Property: whatever the policy and trace, hits keep their data, a hit
        /// means the key was fetched before, and bookkeeping stays consistent
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_any_trace_keeps_data_intact(
            policy in policy(),
            capacity in 2usize..12,
            keys in prop::collection::vec(0u64..40, 0..400)
        ) {
            let mut cache = build(policy, capacity);
            let mut seen = std::collections::HashSet::new();
            for key in keys {
                let (hit, _) = touch(&mut cache, key);
                prop_assert!(!hit || seen.contains(&key));
                seen.insert(key);
                prop_assert!(cache.contains(key));
                prop_assert!(cache.len() <= capacity);
            }
            prop_assert!(cache.check_invariants().is_ok());
        }
    }
}
