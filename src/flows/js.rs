//! JS-SDK `wx.config` parameters.

// self
use crate::{
	_prelude::*,
	flows::{Wechat, common},
	obs::{self, Operation},
	sign,
};

/// Parameters handed to the page for `wx.config`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsConfig {
	/// App id.
	pub app_id: String,
	/// Unix timestamp (seconds) included in the signature.
	pub timestamp: i64,
	/// 16-character nonce included in the signature.
	pub nonce_str: String,
	/// SHA-1 signature, lower-case hex.
	pub signature: String,
}

/// JS-SDK helpers bound to one app.
#[derive(Clone, Debug)]
pub struct JsSdk {
	wechat: Wechat,
}
impl JsSdk {
	pub(crate) fn new(wechat: Wechat) -> Self {
		Self { wechat }
	}

	/// Builds a signed `wx.config` for the page at `uri` (without the `#` fragment).
	pub async fn config(&self, uri: &str) -> Result<JsConfig> {
		obs::observe(Operation::JsConfig, "config", async {
			let ticket = self.ticket().await?;

			Ok(self.sign_config(
				&ticket,
				common::nonce_str(common::JS_NONCE_LEN),
				common::unix_timestamp(),
				uri,
			))
		})
		.await
	}

	/// Returns a live JS-API ticket.
	pub async fn ticket(&self) -> Result<String> {
		self.wechat.tokens().jsapi_ticket().await
	}

	/// Signs a `wx.config` from explicit inputs.
	pub fn sign_config(&self, ticket: &str, nonce_str: String, timestamp: i64, uri: &str) -> JsConfig {
		let signature = sign::jsapi_signature(ticket, &nonce_str, timestamp, uri);

		JsConfig {
			app_id: self.wechat.config().app_id().to_string(),
			timestamp,
			nonce_str,
			signature,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		cache::MemoryCache,
		config::Config,
		error::TransportError,
		http::{HttpRequest, HttpTransport, TransportFuture},
	};

	struct Offline;
	impl HttpTransport for Offline {
		fn execute(&self, _: HttpRequest) -> TransportFuture<'_> {
			Box::pin(async { Err(TransportError::Status { status: 503 }) })
		}
	}

	fn js_sdk() -> JsSdk {
		let config = Config::builder("wxf8b4f85f3a794e77", "secret").build().expect("Config should build.");

		Wechat::with_transport(config, Arc::new(MemoryCache::default()), Arc::new(Offline)).js_sdk()
	}

	#[test]
	fn sign_config_uses_fixed_order_sha1() {
		let config = js_sdk().sign_config(
			"sM4AOVdWfPE4DxkXGEs8VMCPGGVi4C3VM0P37wVUCFvkVAy_90u5h9nbSlYy3-Sl-HhTdfl2fzFy1AOcHKP7qg",
			"Wm3WZYTPz0wzccnW".into(),
			1414587457,
			"http://mp.weixin.qq.com?params=value",
		);

		assert_eq!(config.app_id, "wxf8b4f85f3a794e77");
		assert_eq!(config.signature, "0f9de62fce790f9a083d5c99e95740ceb90c27ed");
	}

	#[tokio::test]
	async fn transport_failures_abort_config() {
		let err = js_sdk().config("https://example.com/").await.expect_err("Offline transport should fail.");

		assert!(matches!(err, Error::Transport(TransportError::Status { status: 503 })));
	}
}
