mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use common::{BrokenCache, SlowPlatform};
use wechat_broker::{
	Error,
	auth::CredentialKind,
	cache::{CacheError, MemoryCache},
	token::LeaseOrigin,
};

const CALLERS: usize = 64;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_refresh() {
	let platform = SlowPlatform::new(Duration::from_millis(50));
	let wechat = common::wechat_with(platform.clone(), Arc::new(MemoryCache::default()));
	let handles = (0..CALLERS)
		.map(|_| {
			let wechat = wechat.clone();

			tokio::spawn(async move { wechat.access_token().await })
		})
		.collect::<Vec<_>>();
	let mut values = Vec::with_capacity(CALLERS);

	for handle in handles {
		values.push(
			handle
				.await
				.expect("Caller task should not panic.")
				.expect("Every caller should receive a token."),
		);
	}

	assert!(values.iter().all(|value| value == "token-1"));
	assert_eq!(platform.token_calls(), 1);
	assert_eq!(wechat.tokens().metrics().refreshes(), 1);
	assert_eq!(wechat.tokens().metrics().hits(), (CALLERS - 1) as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ticket_callers_refresh_each_kind_once() {
	let platform = SlowPlatform::new(Duration::from_millis(20));
	let wechat = common::wechat_with(platform.clone(), Arc::new(MemoryCache::default()));
	let handles = (0..CALLERS)
		.map(|i| {
			let wechat = wechat.clone();

			tokio::spawn(async move {
				if i % 2 == 0 {
					wechat.js_sdk().ticket().await
				} else {
					wechat.access_token().await
				}
			})
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.await.expect("Caller task should not panic.").expect("Every caller should succeed.");
	}

	assert_eq!(platform.token_calls(), 1);
	assert_eq!(platform.ticket_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_http_refresh() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/cgi-bin/token")
				.query_param("grant_type", "client_credential")
				.query_param("appid", common::APP_ID)
				.query_param("secret", common::APP_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.delay(Duration::from_millis(50))
				.body(r#"{"access_token":"http-token","expires_in":7200}"#);
		})
		.await;
	let (wechat, _) = common::wechat_for(&server);
	let handles = (0..50)
		.map(|_| {
			let wechat = wechat.clone();

			tokio::spawn(async move { wechat.access_token().await })
		})
		.collect::<Vec<_>>();

	for handle in handles {
		let token = handle
			.await
			.expect("Caller task should not panic.")
			.expect("Every caller should receive a token.");

		assert_eq!(token, "http-token");
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn cancelled_waiter_does_not_block_others() {
	let platform = SlowPlatform::new(Duration::from_millis(100));
	let wechat = common::wechat_with(platform.clone(), Arc::new(MemoryCache::default()));
	let leader = {
		let wechat = wechat.clone();

		tokio::spawn(async move { wechat.access_token().await })
	};

	tokio::time::sleep(Duration::from_millis(10)).await;

	let abandoned = tokio::time::timeout(Duration::from_millis(10), wechat.access_token()).await;

	assert!(abandoned.is_err(), "Waiter should still be queued behind the refresh.");
	assert_eq!(
		leader.await.expect("Leader task should not panic.").expect("Leader should refresh."),
		"token-1"
	);
	assert_eq!(wechat.access_token().await.expect("Follow-up should hit the cache."), "token-1");
	assert_eq!(platform.token_calls(), 1);
}

#[tokio::test]
async fn cache_read_failure_is_surfaced() {
	let platform = SlowPlatform::new(Duration::ZERO);
	let cache = BrokenCache { fail_get: true, ..Default::default() };
	let wechat = common::wechat_with(platform.clone(), Arc::new(cache));
	let err = wechat.access_token().await.expect_err("Broken cache reads should fail the lease.");

	assert!(matches!(err, Error::Cache(CacheError::Backend { .. })));
	assert_eq!(err.kind(), "cache");
	assert_eq!(platform.token_calls(), 0);
}

#[tokio::test]
async fn cache_write_failure_keeps_fresh_value() {
	let platform = SlowPlatform::new(Duration::ZERO);
	let cache = BrokenCache { fail_set: true, ..Default::default() };
	let wechat = common::wechat_with(platform.clone(), Arc::new(cache));
	let lease = wechat
		.tokens()
		.lease(CredentialKind::AccessToken)
		.await
		.expect("Lease should succeed despite the write failure.");

	assert_eq!(lease.value.expose(), "token-1");
	assert_eq!(lease.origin, LeaseOrigin::Refreshed);
	assert!(matches!(lease.persist_error, Some(CacheError::Backend { .. })));
	assert_eq!(
		wechat.access_token().await.expect("Second lease should refresh again."),
		"token-2"
	);
	assert_eq!(wechat.tokens().metrics().persist_failures(), 2);
}
