//! Key/value cache contract with TTL semantics plus the built-in in-memory backend.
//!
//! The broker never assumes a particular backing store: callers hand it an
//! `Arc<dyn Cache>` (Redis, memcached, or [`MemoryCache`]) and the backend is the
//! sole authority on expiry. `get` must report absent for keys that were never
//! set and for keys whose TTL elapsed.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Boxed future returned by [`Cache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage backend contract for short-lived credentials.
pub trait Cache
where
	Self: Send + Sync,
{
	/// Returns the live value stored under `key`, or `None` when absent or expired.
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>>;

	/// Stores `value` under `key` for `ttl`; the write must be atomic from a reader's view.
	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> CacheFuture<'a, ()>;
}

/// Error type produced by [`Cache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
