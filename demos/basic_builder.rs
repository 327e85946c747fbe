//! Example demonstrating the unified CacheBuilder API.
//!
//! Run with: cargo run --example basic_builder

use pagekit::builder::{CacheBuilder, CachePolicy};
use pagekit::traits::PageCache;

fn main() {
    println!("=== CacheBuilder Examples ===\n");

    // Example 1: LRU Cache
    println!("1. LRU Cache");
    let mut lru = CacheBuilder::new(3)
        .slot_size(16)
        .build(CachePolicy::Lru)
        .unwrap();

    for key in [1, 2, 3] {
        lru.fetch(key);
    }

    // Fetch key 1 again to make it the newest
    lru.fetch(1);

    // Fetch key 4, evicts the least recently used (key 2)
    lru.fetch(4);

    println!("   contains 1? {} (was refetched)", lru.contains(1));
    println!("   contains 2? {} (evicted as LRU)", lru.contains(2));
    println!("   contains 4? {} (just fetched)", lru.contains(4));
    println!();

    // Example 2: FIFO Cache
    println!("2. FIFO Cache");
    let mut fifo = CacheBuilder::new(3)
        .slot_size(16)
        .build(CachePolicy::Fifo)
        .unwrap();

    for key in [1, 2, 3] {
        fifo.fetch(key);
    }

    // Hits don't affect FIFO order
    fifo.fetch(1);

    // Fetch key 4, evicts the oldest (key 1)
    fifo.fetch(4);

    println!("   contains 1? {} (evicted as oldest)", fifo.contains(1));
    println!("   contains 2? {} (still present)", fifo.contains(2));
    println!();

    // Example 3: Clock Cache (second chance)
    println!("3. Clock Cache");
    let mut clock = CacheBuilder::new(3)
        .slot_size(16)
        .build(CachePolicy::Clock)
        .unwrap();

    for key in [1, 2, 3] {
        clock.fetch(key);
    }

    // The hit sets key 1's reference bit
    clock.fetch(1);

    // The hand clears key 1's bit and reclaims key 2's slot
    clock.fetch(4);

    println!("   contains 1? {} (second chance)", clock.contains(1));
    println!("   contains 2? {} (unreferenced)", clock.contains(2));
    println!();

    // Example 4: GClock Cache
    println!("4. GClock Cache (cap 3)");
    let mut gclock = CacheBuilder::new(3)
        .slot_size(16)
        .build(CachePolicy::GClock { max_references: 3 })
        .unwrap();

    for key in [1, 2, 3] {
        gclock.fetch(key);
    }

    // Three hits give key 1 three passes of the hand
    for _ in 0..3 {
        gclock.fetch(1);
    }
    for key in [4, 5, 6] {
        gclock.fetch(key);
    }

    println!("   contains 1? {} (frequently hit)", gclock.contains(1));
    println!("   len: {}", gclock.len());
    println!();

    // Example 5: Random Cache
    println!("5. Random Cache (seed 7)");
    let mut random = CacheBuilder::new(3)
        .slot_size(16)
        .build(CachePolicy::Random { seed: Some(7) })
        .unwrap();

    for key in 0..10 {
        random.fetch(key);
    }

    println!("   contains 9? {} (just fetched)", random.contains(9));
    println!("   len: {}", random.len());
    println!();

    // Example 6: SLRU Cache (scan-resistant)
    println!("6. SLRU Cache");
    let mut slru = CacheBuilder::new(4)
        .slot_size(16)
        .build(CachePolicy::Slru)
        .unwrap();

    for key in [1, 2, 3, 4] {
        slru.fetch(key);
    }

    // Second fetches promote keys 1 and 2 to the protected segment
    slru.fetch(1);
    slru.fetch(2);

    // A scan churns through the probationary segment only
    for key in 10..20 {
        slru.fetch(key);
    }

    println!("   contains 1? {} (protected)", slru.contains(1));
    println!("   contains 2? {} (protected)", slru.contains(2));
    println!("   contains 3? {} (scanned out)", slru.contains(3));
    println!();

    // Example 7: Common operations
    println!("7. Common Operations");
    let policy: CachePolicy = "gclock:2".parse().unwrap();
    let mut cache = CacheBuilder::new(10).slot_size(8).build(policy).unwrap();
    println!("   policy: {}", cache.policy());

    // A miss hands out a slot the caller fills
    let mut page = cache.fetch(1);
    println!("   first fetch is_miss: {}", page.is_miss());
    page.data_mut().copy_from_slice(b"page one");

    // A hit returns the same bytes
    let page = cache.fetch(1);
    println!(
        "   second fetch is_hit: {}, data: {:?}",
        page.is_hit(),
        String::from_utf8_lossy(page.data())
    );

    // Contains has no effect on the policy
    println!("   contains(1): {}", cache.contains(1));
    println!("   contains(99): {}", cache.contains(99));

    // Size
    println!(
        "   len: {}, capacity: {}, is_empty: {}",
        cache.len(),
        cache.capacity(),
        cache.is_empty()
    );

    // Configuration errors surface from build()
    if let Err(err) = CacheBuilder::new(1).build(CachePolicy::Lru) {
        println!("   lru with capacity 1: {err}");
    }
}

// Expected output:
// === CacheBuilder Examples ===
//
// 1. LRU Cache
//    contains 1? true (was refetched)
//    contains 2? false (evicted as LRU)
//    contains 4? true (just fetched)
//
// 2. FIFO Cache
//    contains 1? false (evicted as oldest)
//    contains 2? true (still present)
//
// 3. Clock Cache
//    contains 1? true (second chance)
//    contains 2? false (unreferenced)
//
// 4. GClock Cache (cap 3)
//    contains 1? true (frequently hit)
//    len: 3
//
// 5. Random Cache (seed 7)
//    contains 9? true (just fetched)
//    len: 3
//
// 6. SLRU Cache
//    contains 1? true (protected)
//    contains 2? true (protected)
//    contains 3? false (scanned out)
//
// 7. Common Operations
//    policy: gclock:2
//    first fetch is_miss: true
//    second fetch is_hit: true, data: "page one"
//    contains(1): true
//    contains(99): false
//    len: 1, capacity: 10, is_empty: false
//    lru with capacity 1: invalid cache configuration: LRU capacity must be at least 2, got 1
