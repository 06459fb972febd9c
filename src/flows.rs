//! Feature flows built on top of the token manager and the signature engine.

pub mod common;
pub mod js;
pub mod oauth;
pub mod pay;
pub mod template;

pub use js::*;
pub use oauth::*;
pub use pay::*;
pub use template::*;

// self
use crate::{
	_prelude::*,
	cache::Cache,
	config::Config,
	credential::CredentialStore,
	http::HttpTransport,
	token::TokenManager,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

/// Entry point tying one app's configuration, cache, and transport together.
///
/// The facade is cheap to clone; every clone shares the same [`TokenManager`], so
/// single-flight guarantees hold across all feature handles created from it.
#[derive(Clone)]
pub struct Wechat {
	config: Arc<Config>,
	transport: Arc<dyn HttpTransport>,
	tokens: Arc<TokenManager>,
}
impl Wechat {
	/// Creates a facade backed by a reqwest transport honoring [`Config::http_timeout`].
	#[cfg(feature = "reqwest")]
	pub fn new(config: Config, cache: Arc<dyn Cache>) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::new(config.http_timeout)?;

		Ok(Self::with_transport(config, cache, Arc::new(transport)))
	}

	/// Creates a facade that sends every call through `transport`.
	pub fn with_transport(
		config: Config,
		cache: Arc<dyn Cache>,
		transport: Arc<dyn HttpTransport>,
	) -> Self {
		let store =
			CredentialStore::new(config.identity.clone(), config.endpoints.clone(), transport.clone());
		let tokens = Arc::new(TokenManager::from_config(&config, store, cache));

		Self { config: Arc::new(config), transport, tokens }
	}

	/// Broker configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Shared token manager.
	pub fn tokens(&self) -> &Arc<TokenManager> {
		&self.tokens
	}

	/// Returns a live access token.
	pub async fn access_token(&self) -> Result<String> {
		self.tokens.access_token().await
	}

	/// Web OAuth helpers.
	pub fn oauth(&self) -> WebOAuth {
		WebOAuth::new(self.clone())
	}

	/// Payment helpers.
	pub fn pay(&self) -> Pay {
		Pay::new(self.clone())
	}

	/// JS-SDK helpers.
	pub fn js_sdk(&self) -> JsSdk {
		JsSdk::new(self.clone())
	}

	/// Template message helpers.
	pub fn template(&self) -> Templates {
		Templates::new(self.clone())
	}

	pub(crate) fn transport(&self) -> &dyn HttpTransport {
		self.transport.as_ref()
	}
}
impl Debug for Wechat {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Wechat")
			.field("config", &self.config)
			.field("tokens", &self.tokens)
			.finish_non_exhaustive()
	}
}
