//! Integer mixing shared by every index.
//!
//! Both [`OpenIndex`](crate::ds::OpenIndex) and
//! [`RecencyIndex`](crate::ds::RecencyIndex) place keys with the same
//! function so that table sizing and eviction order are reproducible for
//! fixed key sequences.

/// Thomas Wang's 64-bit `hash64shift` mixer.
#[inline]
pub fn hash64shift(key: u64) -> u64 {
    let mut k = (!key).wrapping_add(key << 21);
    k ^= k >> 24;
    k = k.wrapping_add(k << 3).wrapping_add(k << 8);
    k ^= k >> 14;
    k = k.wrapping_add(k << 2).wrapping_add(k << 4);
    k ^= k >> 28;
    k.wrapping_add(k << 31)
}

/// Reduces [`hash64shift`] of `key` into `0..modulus`.
///
/// `modulus` must be non-zero.
#[inline]
pub fn bucket_of(key: u64, modulus: usize) -> usize {
    debug_assert!(modulus > 0);
    (hash64shift(key) % modulus as u64) as usize
}
