//! Page replacement policies.
//!
//! | Policy | Index | Hit bookkeeping | Victim |
//! |--------|-------|-----------------|--------|
//! | [`fifo`] | [`OpenIndex`](crate::ds::OpenIndex) | none | oldest insertion |
//! | [`random`] | [`OpenIndex`](crate::ds::OpenIndex) | none | uniform random slot |
//! | [`clock`] | [`OpenIndex`](crate::ds::OpenIndex) | set reference bit | first clear bit after the hand |
//! | [`gclock`] | [`OpenIndex`](crate::ds::OpenIndex) | bump counter up to a cap | first zero counter after the hand |
//! | [`lru`] | [`RecencyIndex`](crate::ds::RecencyIndex) | move to newest | oldest |
//! | [`slru`] | two [`RecencyIndex`](crate::ds::RecencyIndex) | promote / move to newest | probationary oldest |
//!
//! Every policy claims fresh arena slots until all are in use and only then
//! starts evicting.

pub mod clock;
pub mod fifo;
pub mod gclock;
pub mod lru;
pub mod random;
pub mod slru;

use crate::error::ConfigError;

pub(crate) fn check_capacity(policy: &str, capacity: usize, min: usize) -> Result<(), ConfigError> {
    if capacity < min {
        return Err(ConfigError::new(format!(
            "{policy} capacity must be at least {min}, got {capacity}"
        )));
    }
    Ok(())
}

pub(crate) const INDEX_SIZED_FOR_CAPACITY: &str = "index is sized for the cache capacity";
