//! Thread-safe in-memory [`Cache`] implementation for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	cache::{Cache, CacheError, CacheFuture},
};

type EntryMap = Arc<RwLock<HashMap<String, Entry>>>;

#[derive(Clone)]
struct Entry {
	value: String,
	expires_at: OffsetDateTime,
}

/// Process-local cache that expires entries against the wall clock.
#[derive(Clone, Default)]
pub struct MemoryCache(EntryMap);
impl MemoryCache {
	/// Returns the value for `key` as observed at `instant`.
	///
	/// Expired entries are evicted on the way out.
	pub fn lookup_at(&self, key: &str, instant: OffsetDateTime) -> Option<String> {
		{
			let guard = self.0.read();

			match guard.get(key) {
				Some(entry) if instant < entry.expires_at => return Some(entry.value.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = self.0.write();

		if guard.get(key).is_some_and(|entry| instant >= entry.expires_at) {
			guard.remove(key);
		}

		None
	}

	/// Stores `value` so that it expires `ttl` after `instant`.
	///
	/// A zero or negative TTL produces an entry that is already expired.
	pub fn insert_at(&self, key: &str, value: String, ttl: Duration, instant: OffsetDateTime) {
		let expires_at = instant.saturating_add(ttl.max(Duration::ZERO));

		self.0.write().insert(key.to_owned(), Entry { value, expires_at });
	}

	/// Number of entries currently held, expired or not.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no entry is held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl Debug for MemoryCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryCache").field("entries", &self.len()).finish()
	}
}
impl Cache for MemoryCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.lookup_at(key, OffsetDateTime::now_utc())) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			self.insert_at(key, value, ttl, OffsetDateTime::now_utc());

			Ok::<(), CacheError>(())
		})
	}
}
