//! Key stream generators shared by the benchmarks.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Zipf};

#[derive(Debug, Clone, Copy)]
pub enum Workload {
    /// Uniform random keys in `[0, universe)`.
    Uniform,
    /// 90% of accesses go to the first 10% of keys.
    Hotset,
    /// Sequential scan in `[0, universe)`, wrapping.
    Scan,
    /// Zipfian distribution; `exponent` 1.0 is the classic skew.
    Zipfian { exponent: f64 },
}

impl Workload {
    pub const ALL: [(&'static str, Workload); 4] = [
        ("uniform", Workload::Uniform),
        ("hotset_90_10", Workload::Hotset),
        ("scan", Workload::Scan),
        ("zipfian_1.0", Workload::Zipfian { exponent: 1.0 }),
    ];
}

/// Materializes `len` keys so generation stays out of the timed loop.
pub fn keys(workload: Workload, universe: u64, len: usize, seed: u64) -> Vec<u64> {
    let universe = universe.max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    match workload {
        Workload::Uniform => (0..len).map(|_| rng.random_range(0..universe)).collect(),
        Workload::Hotset => {
            let hot = (universe / 10).max(1);
            (0..len)
                .map(|_| {
                    if rng.random_bool(0.9) || hot == universe {
                        rng.random_range(0..hot)
                    } else {
                        rng.random_range(hot..universe)
                    }
                })
                .collect()
        },
        Workload::Scan => (0..len as u64).map(|i| i % universe).collect(),
        Workload::Zipfian { exponent } => {
            let zipf = Zipf::new(universe as f64, exponent).unwrap();
            (0..len)
                .map(|_| {
                    let sample: f64 = zipf.sample(&mut rng);
                    (sample as u64).saturating_sub(1).min(universe - 1)
                })
                .collect()
        },
    }
}
