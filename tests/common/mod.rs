//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use httpmock::MockServer;
// self
use wechat_broker::{
	Wechat,
	cache::{Cache, CacheError, CacheFuture, MemoryCache},
	config::{Config, ConfigBuilder, Endpoints},
	error::TransportError,
	http::{HttpRequest, HttpResponse, HttpTransport, TransportFuture},
	url::Url,
};

pub const APP_ID: &str = "wxd930ea5d5a258f4f";
pub const APP_SECRET: &str = "app-secret";
pub const MCH_ID: &str = "10000100";
pub const PAY_KEY: &str = "192006250b4c09247ec02edce69f6a2d";
pub const NOTIFY_URL: &str = "https://example.com/pay/notify";

/// Config builder whose every host points at `server`.
pub fn config_for(server: &MockServer) -> ConfigBuilder {
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	Config::builder(APP_ID, APP_SECRET)
		.pay(MCH_ID, PAY_KEY, NOTIFY_URL)
		.endpoints(Endpoints::single_host(base))
}

/// Reqwest-backed facade talking to `server`, plus the cache it writes to.
pub fn wechat_for(server: &MockServer) -> (Wechat, MemoryCache) {
	let cache = MemoryCache::default();
	let config = config_for(server).build().expect("Test config should build.");
	let wechat = Wechat::new(config, Arc::new(cache.clone())).expect("Reqwest transport should build.");

	(wechat, cache)
}

/// In-process platform that counts issuance calls and answers after `delay`.
#[derive(Debug, Default)]
pub struct SlowPlatform {
	pub delay: Duration,
	pub token_calls: AtomicUsize,
	pub ticket_calls: AtomicUsize,
}
impl SlowPlatform {
	pub fn new(delay: Duration) -> Arc<Self> {
		Arc::new(Self { delay, ..Default::default() })
	}

	pub fn token_calls(&self) -> usize {
		self.token_calls.load(Ordering::SeqCst)
	}

	pub fn ticket_calls(&self) -> usize {
		self.ticket_calls.load(Ordering::SeqCst)
	}
}
impl HttpTransport for SlowPlatform {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			let body = if request.url.path().ends_with("/getticket") {
				let n = self.ticket_calls.fetch_add(1, Ordering::SeqCst) + 1;

				format!(r#"{{"errcode":0,"errmsg":"ok","ticket":"ticket-{n}","expires_in":7200}}"#)
			} else {
				let n = self.token_calls.fetch_add(1, Ordering::SeqCst) + 1;

				format!(r#"{{"access_token":"token-{n}","expires_in":7200}}"#)
			};

			Ok::<_, TransportError>(HttpResponse::ok(body))
		})
	}
}

/// Cache whose reads and/or writes always fail.
#[derive(Debug, Default)]
pub struct BrokenCache {
	pub fail_get: bool,
	pub fail_set: bool,
	pub inner: MemoryCache,
}
impl Cache for BrokenCache {
	fn get<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<String>> {
		if self.fail_get {
			return Box::pin(async { Err(CacheError::Backend { message: "get refused".into() }) });
		}

		self.inner.get(key)
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: String,
		ttl: time::Duration,
	) -> CacheFuture<'a, ()> {
		if self.fail_set {
			return Box::pin(async { Err(CacheError::Backend { message: "set refused".into() }) });
		}

		self.inner.set(key, value, ttl)
	}
}

/// Facade backed by an in-process transport.
pub fn wechat_with(transport: Arc<dyn HttpTransport>, cache: Arc<dyn Cache>) -> Wechat {
	let config = Config::builder(APP_ID, APP_SECRET)
		.pay(MCH_ID, PAY_KEY, NOTIFY_URL)
		.build()
		.expect("Test config should build.");

	Wechat::with_transport(config, cache, transport)
}
