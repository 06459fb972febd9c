//! Single-flight cache manager for app-level credentials.
//!
//! [`TokenManager::lease`] returns a live credential of the requested
//! [`CredentialKind`], refreshing it through the [`CredentialStore`] when the cache
//! has nothing usable. Each kind owns one async guard, so concurrent callers of the
//! same kind queue behind a single outbound refresh and read its result from the
//! cache once the guard is released. Refreshing a JS-API ticket first leases an
//! access token under the access token guard; guards are always taken in that
//! order, so the two kinds never deadlock.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, Secret},
	cache::{Cache, CacheError},
	config::{Config, CredentialPolicy},
	credential::{CredentialStore, IssuedCredential},
	obs,
};

/// Where a leased credential came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaseOrigin {
	/// Read back from the cache.
	Cached,
	/// Issued by the platform during this call.
	Refreshed,
}

/// Credential handed out by [`TokenManager::lease`].
#[derive(Clone, Debug)]
pub struct CredentialLease {
	/// Kind of the leased credential.
	pub kind: CredentialKind,
	/// Credential value; redacted in debug output.
	pub value: Secret,
	/// Whether the value was cached or freshly issued.
	pub origin: LeaseOrigin,
	/// Cache write failure after a refresh; the value is still valid for this call.
	pub persist_error: Option<CacheError>,
}
impl CredentialLease {
	/// Returns `true` when the value came from the cache.
	pub fn is_cached(&self) -> bool {
		self.origin == LeaseOrigin::Cached
	}
}

/// Caches access tokens and JS-API tickets with one refresh in flight per kind.
pub struct TokenManager {
	store: CredentialStore,
	cache: Arc<dyn Cache>,
	access_token_guard: AsyncMutex<()>,
	jsapi_ticket_guard: AsyncMutex<()>,
	access_token_policy: CredentialPolicy,
	jsapi_ticket_policy: CredentialPolicy,
	metrics: Arc<RefreshMetrics>,
}
impl TokenManager {
	/// Creates a manager with the default [`CredentialPolicy`] for every kind.
	pub fn new(store: CredentialStore, cache: Arc<dyn Cache>) -> Self {
		Self {
			store,
			cache,
			access_token_guard: AsyncMutex::new(()),
			jsapi_ticket_guard: AsyncMutex::new(()),
			access_token_policy: CredentialPolicy::default(),
			jsapi_ticket_policy: CredentialPolicy::default(),
			metrics: Default::default(),
		}
	}

	/// Creates a manager using the policies carried by `config`.
	pub fn from_config(config: &Config, store: CredentialStore, cache: Arc<dyn Cache>) -> Self {
		CredentialKind::ALL
			.into_iter()
			.fold(Self::new(store, cache), |manager, kind| manager.with_policy(kind, config.policy(kind)))
	}

	/// Overrides the cache policy for `kind`.
	pub fn with_policy(mut self, kind: CredentialKind, policy: CredentialPolicy) -> Self {
		match kind {
			CredentialKind::AccessToken => self.access_token_policy = policy,
			CredentialKind::JsapiTicket => self.jsapi_ticket_policy = policy,
		}

		self
	}

	/// Cache policy applied to `kind`.
	pub fn policy(&self, kind: CredentialKind) -> CredentialPolicy {
		match kind {
			CredentialKind::AccessToken => self.access_token_policy,
			CredentialKind::JsapiTicket => self.jsapi_ticket_policy,
		}
	}

	/// Shared lease counters.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		&self.metrics
	}

	/// Credential store used for refreshes.
	pub fn store(&self) -> &CredentialStore {
		&self.store
	}

	/// Returns a live credential of `kind`, refreshing it at most once across callers.
	pub async fn lease(&self, kind: CredentialKind) -> Result<CredentialLease> {
		obs::observe(kind.into(), "lease", async move {
			let lease = match kind {
				CredentialKind::AccessToken => self.lease_access_token().await,
				CredentialKind::JsapiTicket => self.lease_jsapi_ticket().await,
			};

			// A nested access token lease is counted by the ticket lease around it.
			lease.inspect_err(|_| self.metrics.record_failure())
		})
		.await
	}

	/// Returns the raw value of a live credential of `kind`.
	pub async fn get_valid(&self, kind: CredentialKind) -> Result<String> {
		let lease = self.lease(kind).await?;

		warn_unpersisted(&lease);

		Ok(lease.value.into_inner())
	}

	/// Shorthand for [`TokenManager::get_valid`] with [`CredentialKind::AccessToken`].
	pub async fn access_token(&self) -> Result<String> {
		self.get_valid(CredentialKind::AccessToken).await
	}

	/// Shorthand for [`TokenManager::get_valid`] with [`CredentialKind::JsapiTicket`].
	pub async fn jsapi_ticket(&self) -> Result<String> {
		self.get_valid(CredentialKind::JsapiTicket).await
	}

	async fn lease_access_token(&self) -> Result<CredentialLease> {
		self.single_flight(CredentialKind::AccessToken, || self.store.issue_access_token()).await
	}

	async fn lease_jsapi_ticket(&self) -> Result<CredentialLease> {
		self.single_flight(CredentialKind::JsapiTicket, || async {
			let token = self.lease_access_token().await?;

			warn_unpersisted(&token);

			self.store.issue_jsapi_ticket(token.value.expose()).await
		})
		.await
	}

	async fn single_flight<F, Fut>(&self, kind: CredentialKind, refresh: F) -> Result<CredentialLease>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<IssuedCredential>>,
	{
		let key = kind.cache_key(&self.store.identity().app_id);
		let _singleflight = self.guard(kind).lock().await;

		self.metrics.record_lookup();

		let cached = self.cache.get(&key).await?;

		if let Some(value) = cached.filter(|value| !value.is_empty()) {
			self.metrics.record_hit();

			return Ok(CredentialLease {
				kind,
				value: Secret::new(value),
				origin: LeaseOrigin::Cached,
				persist_error: None,
			});
		}

		self.metrics.record_refresh();

		let issued = refresh().await?;
		let ttl = self.policy(kind).cache_ttl(issued.lifetime);
		// A zero TTL means "never expires" to some backends.
		let persist_error = if ttl.is_positive() {
			self.cache.set(&key, issued.value.expose().to_owned(), ttl).await.err()
		} else {
			None
		};

		if persist_error.is_some() {
			self.metrics.record_persist_failure();
		}

		Ok(CredentialLease { kind, value: issued.value, origin: LeaseOrigin::Refreshed, persist_error })
	}

	fn guard(&self, kind: CredentialKind) -> &AsyncMutex<()> {
		match kind {
			CredentialKind::AccessToken => &self.access_token_guard,
			CredentialKind::JsapiTicket => &self.jsapi_ticket_guard,
		}
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("store", &self.store)
			.field("access_token_policy", &self.access_token_policy)
			.field("jsapi_ticket_policy", &self.jsapi_ticket_policy)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}

fn warn_unpersisted(lease: &CredentialLease) {
	#[cfg(feature = "tracing")]
	{
		if let Some(err) = &lease.persist_error {
			tracing::warn!(kind = lease.kind.as_str(), error = %err, "Refreshed credential was not cached.");
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = lease;
	}
}
