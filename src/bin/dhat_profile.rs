//! DHAT heap profiler for pagekit.
//!
//! Builds every policy, then runs the workloads and checks that not a single
//! heap block is allocated once construction is done.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::process::ExitCode;

use pagekit::builder::{CacheBuilder, CachePolicy};
use pagekit::trace::{check_pattern, fill_pattern};
use pagekit::traits::PageCache;

const CAPACITY: usize = 4096;
const SLOT_SIZE: usize = 512;
const OPERATIONS: usize = 100_000;
const UNIVERSE: u64 = 16_384;

/// Simple XorShift64 RNG for deterministic workloads.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}

fn touch<C: PageCache>(cache: &mut C, key: u64) -> bool {
    let mut page = cache.fetch(key);
    if page.is_hit() {
        check_pattern(page.data(), key)
    } else {
        fill_pattern(page.data_mut(), key);
        true
    }
}

/// Hotset workload: 90% of accesses hit 10% of keys.
fn hotset_workload<C: PageCache>(cache: &mut C, seed: u64) -> usize {
    let mut rng = XorShift64::new(seed);
    let hot_size = UNIVERSE / 10;
    let mut failures = 0;

    for _ in 0..OPERATIONS {
        let key = if rng.next_f64() < 0.9 {
            rng.next_u64() % hot_size
        } else {
            hot_size + (rng.next_u64() % (UNIVERSE - hot_size))
        };
        if !touch(cache, key) {
            failures += 1;
        }
    }
    failures
}

/// Sequential scan over the whole universe.
fn scan_workload<C: PageCache>(cache: &mut C) -> usize {
    (0..OPERATIONS as u64)
        .filter(|i| !touch(cache, i % UNIVERSE))
        .count()
}

/// Only never-seen keys: every fetch evicts.
fn eviction_churn<C: PageCache>(cache: &mut C) -> usize {
    (0..OPERATIONS as u64 / 4)
        .filter(|i| !touch(cache, UNIVERSE + i))
        .count()
}

fn profile(policy: CachePolicy) -> Result<bool, pagekit::error::CacheError> {
    println!("=== Profiling {policy} ===");
    let mut cache = CacheBuilder::new(CAPACITY).slot_size(SLOT_SIZE).build(policy)?;

    let before = dhat::HeapStats::get();
    let failures =
        hotset_workload(&mut cache, 42) + scan_workload(&mut cache) + eviction_churn(&mut cache);
    let after = dhat::HeapStats::get();

    let allocations = after.total_blocks - before.total_blocks;
    println!("  Final size: {}", cache.len());
    println!("  Allocations during fetch: {allocations}");
    if failures > 0 {
        println!("  !!! {failures} slots lost their data");
    }
    Ok(allocations == 0 && failures == 0)
}

fn main() -> ExitCode {
    let _profiler = dhat::Profiler::new_heap();

    println!("pagekit DHAT Heap Profiling");
    println!("===========================\n");

    let mut clean = true;
    for policy in CachePolicy::ALL {
        match profile(policy) {
            Ok(ok) => clean &= ok,
            Err(err) => {
                eprintln!("{policy}: {err}");
                clean = false;
            },
        }
    }

    println!("\n===========================");
    println!(
        "View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>"
    );
    if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
