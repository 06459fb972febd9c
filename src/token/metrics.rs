// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential leases.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	lookups: AtomicU64,
	hits: AtomicU64,
	refreshes: AtomicU64,
	failures: AtomicU64,
	persist_failures: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the number of cache lookups performed under a guard.
	pub fn lookups(&self) -> u64 {
		self.lookups.load(Ordering::Relaxed)
	}

	/// Returns the number of lookups answered by the cache.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns the number of outbound refresh calls.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of leases that ended in an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of refreshed values the cache refused to store.
	pub fn persist_failures(&self) -> u64 {
		self.persist_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_lookup(&self) {
		self.lookups.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_persist_failure(&self) {
		self.persist_failures.fetch_add(1, Ordering::Relaxed);
	}
}
