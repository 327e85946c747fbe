//! Trace replay: run a sequence of page keys through a cache and report the
//! hit ratio.
//!
//! A trace is whitespace-separated hexadecimal 64-bit keys, with or without
//! a `0x` prefix. On every miss the replay writes a pattern derived from the
//! key into the slot, and on every hit it checks the pattern is still there,
//! so a policy that hands out the wrong slot shows up as failures rather than
//! just a different hit ratio.
//!
//! ## Pattern
//!
//! ```text
//!   slot of 20 bytes, key k:
//!
//!   [ k as u64 LE ][ k+1 as u64 LE ][ k+2 as u8 ][ k+3 as u8 ][ k+4 as u8 ][ k+5 as u8 ]
//!     8-byte words first               then one byte per remaining position
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::builder::{CacheBuilder, CachePolicy};
//! use pagekit::trace::{parse_trace, replay};
//!
//! let keys = parse_trace("1 2 0x1\n2 3\n").unwrap();
//! let mut cache = CacheBuilder::new(2).slot_size(64).build(CachePolicy::Lru).unwrap();
//! let report = replay("lru", &mut cache, &keys);
//!
//! assert_eq!(report.hits, 2);
//! assert_eq!(report.misses, 3);
//! assert_eq!(report.failures, 0);
//! ```

use std::fmt;
use std::io::BufRead;
use std::time::{Duration, Instant};

use crate::error::TraceError;
use crate::traits::PageCache;

const WORD: usize = std::mem::size_of::<u64>();

fn parse_key(token: &str, line: usize) -> Result<u64, TraceError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).map_err(|_| TraceError::InvalidKey {
        line,
        token: token.to_owned(),
    })
}

fn parse_line(line: &str, line_no: usize, keys: &mut Vec<u64>) -> Result<(), TraceError> {
    for token in line.split_whitespace() {
        keys.push(parse_key(token, line_no)?);
    }
    Ok(())
}

/// Parses an in-memory trace.
///
/// # Errors
///
/// [`TraceError::InvalidKey`] for the first token that is not a hexadecimal
/// `u64`.
pub fn parse_trace(input: &str) -> Result<Vec<u64>, TraceError> {
    let mut keys = Vec::new();
    for (i, line) in input.lines().enumerate() {
        parse_line(line, i + 1, &mut keys)?;
    }
    Ok(keys)
}

/// Reads and parses a trace line by line.
pub fn read_trace<R: BufRead>(reader: R) -> Result<Vec<u64>, TraceError> {
    let mut keys = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        parse_line(&line?, i + 1, &mut keys)?;
    }
    Ok(keys)
}

/// Fills `data` with the pattern for `key`.
pub fn fill_pattern(data: &mut [u8], key: u64) {
    let mut next = key;
    let mut words = data.chunks_exact_mut(WORD);
    for word in &mut words {
        word.copy_from_slice(&next.to_le_bytes());
        next = next.wrapping_add(1);
    }
    for byte in words.into_remainder() {
        *byte = next as u8;
        next = next.wrapping_add(1);
    }
}

/// Returns `true` if `data` holds exactly the pattern [`fill_pattern`] writes
/// for `key`.
pub fn check_pattern(data: &[u8], key: u64) -> bool {
    let mut next = key;
    let mut words = data.chunks_exact(WORD);
    for word in &mut words {
        if word != next.to_le_bytes() {
            return false;
        }
        next = next.wrapping_add(1);
    }
    for &byte in words.remainder() {
        if byte != next as u8 {
            return false;
        }
        next = next.wrapping_add(1);
    }
    true
}

/// Outcome of one [`replay`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// Label printed at the start of the report line.
    pub label: String,
    pub hits: u64,
    pub misses: u64,
    /// Hits whose slot no longer held the key's pattern.
    pub failures: u64,
    pub elapsed: Duration,
}

impl ReplayReport {
    /// Total fetches.
    pub fn fetches(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of fetches that hit, 0.0 for an empty trace.
    pub fn hit_ratio(&self) -> f64 {
        match self.fetches() {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

/// `label<TAB>NN.NN% hit ratio (hits / fetches)  time S.SS`, with
/// `  !!! N fails` appended when any hit lost its data.
impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{:.2}% hit ratio ({} / {})  time {:.2}",
            self.label,
            self.hit_ratio() * 100.0,
            self.hits,
            self.fetches(),
            self.elapsed.as_secs_f64()
        )?;
        if self.failures > 0 {
            write!(f, "  !!! {} fails", self.failures)?;
        }
        Ok(())
    }
}

/// Fetches every key in order, filling missed slots and verifying hit slots.
pub fn replay<C>(label: impl Into<String>, cache: &mut C, keys: &[u64]) -> ReplayReport
where
    C: PageCache + ?Sized,
{
    let mut hits = 0;
    let mut misses = 0;
    let mut failures = 0;

    let start = Instant::now();
    for &key in keys {
        let mut page = cache.fetch(key);
        if page.is_hit() {
            hits += 1;
            if !check_pattern(page.data(), key) {
                failures += 1;
            }
        } else {
            misses += 1;
            fill_pattern(page.data_mut(), key);
        }
    }
    let elapsed = start.elapsed();

    ReplayReport {
        label: label.into(),
        hits,
        misses,
        failures,
        elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parsing {
        use super::*;

        #[test]
        fn test_parses_hex_with_and_without_prefix() {
            let keys = parse_trace("ff 0x10\n\n  0XdeadBEEF\tffffffffffffffff\n").unwrap();
            assert_eq!(keys, vec![0xff, 0x10, 0xdead_beef, u64::MAX]);
        }

        #[test]
        fn test_empty_trace() {
            assert!(parse_trace("").unwrap().is_empty());
            assert!(parse_trace(" \n\t\n").unwrap().is_empty());
        }

        #[test]
        fn test_invalid_key_reports_line() {
            let err = parse_trace("1 2\n3\nabc xyz\n").unwrap_err();
            match err {
                TraceError::InvalidKey { line, token } => {
                    assert_eq!(line, 3);
                    assert_eq!(token, "xyz");
                },
                other => panic!("unexpected error {other:?}"),
            }
        }

        #[test]
        fn test_overflowing_key_is_rejected() {
            assert!(parse_trace("1ffffffffffffffff").is_err());
            assert!(parse_trace("0x").is_err());
        }

        #[test]
        fn test_read_trace_matches_parse_trace() {
            let input = "a b\nc\n0x0d\n";
            let read = read_trace(std::io::Cursor::new(input)).unwrap();
            assert_eq!(read, parse_trace(input).unwrap());
        }
    }

    mod pattern {
        use super::*;

        #[test]
        fn test_words_then_trailing_bytes() {
            let mut data = [0u8; 19];
            fill_pattern(&mut data, 0x0102);
            assert_eq!(&data[..8], &0x0102u64.to_le_bytes());
            assert_eq!(&data[8..16], &0x0103u64.to_le_bytes());
            assert_eq!(&data[16..], &[0x04, 0x05, 0x06]);
            assert!(check_pattern(&data, 0x0102));
        }

        #[test]
        fn test_check_detects_wrong_key_and_corruption() {
            let mut data = vec![0u8; 4096];
            fill_pattern(&mut data, 77);
            assert!(check_pattern(&data, 77));
            assert!(!check_pattern(&data, 78));

            data[4095] ^= 1;
            assert!(!check_pattern(&data, 77));
        }

        #[test]
        fn test_counter_wraps() {
            let mut data = [0u8; 17];
            fill_pattern(&mut data, u64::MAX);
            assert_eq!(&data[8..16], &0u64.to_le_bytes());
            assert_eq!(data[16], 1);
            assert!(check_pattern(&data, u64::MAX));
        }

        #[test]
        fn test_short_slot_is_bytes_only() {
            let mut data = [0u8; 3];
            fill_pattern(&mut data, 0x1ff);
            assert_eq!(data, [0xff, 0x00, 0x01]);
        }
    }

    mod replaying {
        use super::*;
        use crate::builder::{CacheBuilder, CachePolicy};

        #[test]
        fn test_counts_hits_and_misses() {
            let keys = [1, 2, 1, 3, 1, 2];
            let mut cache = CacheBuilder::new(2).slot_size(13).build(CachePolicy::Lru).unwrap();
            let report = replay("lru", &mut cache, &keys);
            // 1m 2m 1h 3m(evicts 2) 1h 2m
            assert_eq!(report.hits, 2);
            assert_eq!(report.misses, 4);
            assert_eq!(report.failures, 0);
            assert_eq!(report.fetches(), 6);
        }

        #[test]
        fn test_refetch_after_eviction_is_a_miss() {
            let mut cache = CacheBuilder::new(2).slot_size(64).build(CachePolicy::Lru).unwrap();
            // 1m 2m 1h 3m(evicts 2) 2m(evicts 1)
            let keys = parse_trace("1 2 0x1\n3 2\n").unwrap();
            let report = replay("lru", &mut cache, &keys);
            assert_eq!((report.hits, report.misses), (1, 4));
            assert!(!cache.contains(1));

            // 1m 2m 1h 2h 3m(evicts 1)
            let mut cache = CacheBuilder::new(2).slot_size(64).build(CachePolicy::Lru).unwrap();
            let keys = parse_trace("1 2 0x1\n2 3\n").unwrap();
            let report = replay("lru", &mut cache, &keys);
            assert_eq!((report.hits, report.misses), (2, 3));
            assert_eq!(report.failures, 0);
        }

        #[test]
        fn test_no_failures_for_any_policy() {
            let keys: Vec<u64> = (0..2000u64).map(|i| (i * 7919) % 97).collect();
            for policy in CachePolicy::ALL {
                let mut cache = CacheBuilder::new(16).slot_size(100).build(policy).unwrap();
                let report = replay(policy.name(), &mut cache, &keys);
                assert_eq!(report.failures, 0, "{policy}");
                assert_eq!(report.fetches(), 2000);
            }
        }

        #[test]
        fn test_report_line() {
            let report = ReplayReport {
                label: "fifo".into(),
                hits: 1,
                misses: 3,
                failures: 0,
                elapsed: Duration::from_millis(1250),
            };
            assert_eq!(report.hit_ratio(), 0.25);
            assert_eq!(report.to_string(), "fifo\t25.00% hit ratio (1 / 4)  time 1.25");

            let failed = ReplayReport {
                failures: 2,
                ..report
            };
            assert!(failed.to_string().ends_with("  !!! 2 fails"));
        }

        #[test]
        fn test_empty_trace_ratio_is_zero() {
            let mut cache = CacheBuilder::new(4).build(CachePolicy::Fifo).unwrap();
            let report = replay("fifo", &mut cache, &[]);
            assert_eq!(report.hit_ratio(), 0.0);
        }
    }
}
