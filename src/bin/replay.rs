//! Replays a page trace against each replacement policy and prints one
//! hit-ratio line per policy.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use pagekit::builder::{CacheBuilder, CachePolicy, DEFAULT_CAPACITY, DEFAULT_SLOT_SIZE};
use pagekit::error::TraceError;
use pagekit::trace::{read_trace, replay};

#[derive(Parser)]
#[command(name = "pagekit-replay")]
#[command(about = "Replay a page trace against fixed-capacity page caches")]
struct Args {
    /// File of whitespace-separated hexadecimal page keys
    trace: PathBuf,

    /// Number of slots in each cache
    #[arg(short = 'n', long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Size of each slot in bytes
    #[arg(short = 's', long, default_value_t = DEFAULT_SLOT_SIZE)]
    slot_size: usize,

    /// Policy to run (fifo, random[:seed], clock, gclock[:max], lru, slru);
    /// repeat for several. Runs all of them when omitted.
    #[arg(short, long = "policy")]
    policies: Vec<CachePolicy>,

    /// Print each cache's counters in Prometheus text format after its line
    #[cfg(feature = "metrics")]
    #[arg(long)]
    prometheus: bool,
}

fn load(path: &Path) -> Result<Vec<u64>, TraceError> {
    let file = File::open(path)?;
    read_trace(BufReader::new(file))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let keys = match load(&args.trace) {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("FAIL: {}: {e}", args.trace.display());
            return ExitCode::FAILURE;
        },
    };

    let policies = if args.policies.is_empty() {
        CachePolicy::ALL.to_vec()
    } else {
        args.policies.clone()
    };

    let builder = CacheBuilder::new(args.capacity).slot_size(args.slot_size);
    let mut failed = false;
    for policy in policies {
        let mut cache = match builder.build(policy) {
            Ok(cache) => cache,
            Err(e) => {
                println!("{policy}\t new() failed: {e}");
                failed = true;
                continue;
            },
        };

        let report = replay(policy.to_string(), &mut cache, &keys);
        println!("{report}");
        failed |= report.failures > 0;

        #[cfg(feature = "metrics")]
        if args.prometheus {
            use pagekit::metrics::exporter::PrometheusTextExporter;
            use pagekit::metrics::traits::MetricsExporter;

            let exporter = PrometheusTextExporter::new(
                format!("pagekit_{}", policy.name()),
                std::io::stdout(),
            );
            exporter.export(&cache.metrics_snapshot());
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
