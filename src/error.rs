//! Error types for the pagekit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. an LRU with fewer than two slots, a zero GClock reference cap).
//! - [`AllocError`]: Returned when a backing allocation cannot be reserved at
//!   construction time. Construction is atomic: nothing partial survives.
//! - [`CacheError`]: What every cache constructor returns; one of the two above.
//! - [`TableFullError`]: Returned by the index primitives when no record is
//!   free. The policies size their indices so this never happens.
//! - [`InvariantError`]: Returned by `check_invariants` methods when internal
//!   bookkeeping is inconsistent.
//! - [`TraceError`]: Returned by [`trace`](crate::trace) when a key trace
//!   cannot be read or contains a malformed key.
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::error::CacheError;
//! use pagekit::policy::lru::LruCache;
//!
//! let cache: Result<LruCache, CacheError> = LruCache::try_new(64, 16);
//! assert!(cache.is_ok());
//!
//! // LRU needs at least two slots to track recency
//! let bad = LruCache::try_new(64, 1);
//! assert!(matches!(bad, Err(CacheError::Config(_))));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` methods on the indices and policies
/// (e.g. [`RecencyIndex::check_invariants`](crate::ds::RecencyIndex::check_invariants)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// # Example
///
/// ```
/// use pagekit::error::CacheError;
/// use pagekit::policy::slru::SlruCache;
///
/// let err = SlruCache::try_new(16, 0).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// AllocError
// ---------------------------------------------------------------------------

/// Error returned when a backing allocation could not be reserved.
///
/// Carries the number of bytes that were requested (saturated at
/// `usize::MAX` when the size computation itself overflowed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    bytes: usize,
}

impl AllocError {
    /// Creates a new `AllocError` for a request of `bytes` bytes.
    #[inline]
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Returns the number of bytes that were requested.
    #[inline]
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate {} bytes", self.bytes)
    }
}

impl std::error::Error for AllocError {}

// ---------------------------------------------------------------------------
// TableFullError
// ---------------------------------------------------------------------------

/// Error returned by an index insert when no record can take the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFullError {
    capacity: usize,
}

impl TableFullError {
    /// Creates a new `TableFullError` for a table of `capacity` records.
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Returns the record capacity of the table that rejected the insert.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Display for TableFullError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index table full ({} records)", self.capacity)
    }
}

impl std::error::Error for TableFullError {}

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by every cache and index constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Parameters were rejected before anything was allocated.
    Config(ConfigError),
    /// A backing allocation failed; everything reserved so far was released.
    Alloc(AllocError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Config(err) => write!(f, "invalid cache configuration: {err}"),
            CacheError::Alloc(err) => write!(f, "cache allocation failed: {err}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Config(err) => Some(err),
            CacheError::Alloc(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CacheError {
    fn from(err: ConfigError) -> Self {
        CacheError::Config(err)
    }
}

impl From<AllocError> for CacheError {
    fn from(err: AllocError) -> Self {
        CacheError::Alloc(err)
    }
}

// ---------------------------------------------------------------------------
// TraceError
// ---------------------------------------------------------------------------

/// Error returned when a key trace cannot be read or parsed.
#[derive(Debug)]
pub enum TraceError {
    /// Reading the trace failed.
    Io(std::io::Error),
    /// A token is not a hexadecimal 64-bit key.
    InvalidKey {
        /// 1-based line number of the token.
        line: usize,
        /// The offending token.
        token: String,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Io(err) => write!(f, "failed to read trace: {err}"),
            TraceError::InvalidKey { line, token } => {
                write!(f, "line {line}: {token:?} is not a hexadecimal 64-bit key")
            },
        }
    }
}

impl std::error::Error for TraceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TraceError::Io(err) => Some(err),
            TraceError::InvalidKey { .. } => None,
        }
    }
}

impl From<std::io::Error> for TraceError {
    fn from(err: std::io::Error) -> Self {
        TraceError::Io(err)
    }
}

/// Reserves exactly `len` elements in a fresh `Vec`, mapping failure to
/// [`AllocError`].
pub(crate) fn try_vec<T>(len: usize) -> Result<Vec<T>, AllocError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|_| {
        AllocError::new(len.saturating_mul(std::mem::size_of::<T>()))
    })?;
    Ok(vec)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("recency list length mismatch");
        assert_eq!(err.to_string(), "recency list length mismatch");
    }

    #[test]
    fn invariant_message_accessor() {
        let err = InvariantError::new("test");
        assert_eq!(err.message(), "test");
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be >= 2");
        assert_eq!(err.to_string(), "capacity must be >= 2");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
    }

    // -- AllocError / TableFullError ----------------------------------------

    #[test]
    fn alloc_display_includes_size() {
        let err = AllocError::new(4096);
        assert_eq!(err.bytes(), 4096);
        assert_eq!(err.to_string(), "failed to allocate 4096 bytes");
    }

    #[test]
    fn table_full_display_includes_capacity() {
        let err = TableFullError::new(12);
        assert_eq!(err.capacity(), 12);
        assert!(err.to_string().contains("12 records"));
    }

    // -- CacheError -------------------------------------------------------

    #[test]
    fn cache_error_wraps_config_and_alloc() {
        let config: CacheError = ConfigError::new("bad").into();
        assert!(matches!(config, CacheError::Config(_)));
        assert!(config.to_string().contains("bad"));

        let alloc: CacheError = AllocError::new(8).into();
        assert!(matches!(alloc, CacheError::Alloc(_)));
        assert!(std::error::Error::source(&alloc).is_some());
    }

    #[test]
    fn all_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
        assert_error::<ConfigError>();
        assert_error::<AllocError>();
        assert_error::<TableFullError>();
        assert_error::<CacheError>();
        assert_error::<TraceError>();
    }

    #[test]
    fn trace_error_reports_line() {
        let err = TraceError::InvalidKey {
            line: 3,
            token: "zz".into(),
        };
        assert_eq!(err.to_string(), "line 3: \"zz\" is not a hexadecimal 64-bit key");

        let io: TraceError = std::io::Error::other("gone").into();
        assert!(matches!(io, TraceError::Io(_)));
        assert!(std::error::Error::source(&io).is_some());
    }

    #[test]
    fn try_vec_reserves_exactly() {
        let vec: Vec<u64> = try_vec(32).unwrap();
        assert!(vec.capacity() >= 32);
        assert!(vec.is_empty());
    }

    #[test]
    fn try_vec_reports_impossible_request() {
        let err = try_vec::<u64>(usize::MAX).unwrap_err();
        assert_eq!(err.bytes(), usize::MAX);
    }
}
