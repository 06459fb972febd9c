//! Broker configuration: app identity, payment settings, endpoints, and cache policies.
//!
//! [`Config::builder`] seeds a [`ConfigBuilder`] with the app credentials; every other
//! setting has a default matching the public platform. [`ConfigBuilder::build`]
//! validates identifiers and endpoint schemes so misconfiguration fails before the
//! first outbound call.

// self
use crate::{
	_prelude::*,
	auth::{AppId, AppIdentity, CredentialKind, MchId, Secret},
	error::ConfigError,
};

/// Base URLs of the three hosts the broker talks to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// API host serving tokens, tickets, OAuth, and template calls.
	pub api: Url,
	/// Merchant (payment gateway) host.
	pub mch: Url,
	/// Open platform host serving the OAuth authorize page.
	pub open: Url,
}
impl Endpoints {
	/// Routes every host to `base` (handy for mock servers).
	pub fn single_host(base: Url) -> Self {
		Self { api: base.clone(), mch: base.clone(), open: base }
	}

	/// Joins `path` onto the API host.
	pub fn api_url(&self, path: &str) -> Result<Url, ConfigError> {
		Ok(self.api.join(path)?)
	}

	/// Joins `path` onto the merchant host.
	pub fn mch_url(&self, path: &str) -> Result<Url, ConfigError> {
		Ok(self.mch.join(path)?)
	}

	/// Joins `path` onto the open platform host.
	pub fn open_url(&self, path: &str) -> Result<Url, ConfigError> {
		Ok(self.open.join(path)?)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("api", &self.api)?;
		validate_endpoint("mch", &self.mch)?;
		validate_endpoint("open", &self.open)
	}
}
impl Default for Endpoints {
	fn default() -> Self {
		Self {
			api: Url::parse("https://api.weixin.qq.com/").expect("Static API URL must parse."),
			mch: Url::parse("https://api.mch.weixin.qq.com/").expect("Static merchant URL must parse."),
			open: Url::parse("https://open.weixin.qq.com/").expect("Static open URL must parse."),
		}
	}
}

/// How long a freshly issued credential may live in the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialPolicy {
	/// Subtracted from the advertised lifetime before caching.
	pub safety_margin: Duration,
	/// Optional cap applied to the advertised lifetime.
	pub max_lifetime: Option<Duration>,
}
impl CredentialPolicy {
	/// Margin used by the platform SDKs: 1500 seconds off a ~7200 second lifetime.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(1500);

	/// Overrides the safety margin; negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = margin.max(Duration::ZERO);

		self
	}

	/// Caps the lifetime honored from the remote reply.
	pub fn with_max_lifetime(mut self, lifetime: Duration) -> Self {
		self.max_lifetime = Some(lifetime);

		self
	}

	/// Cache TTL for a credential advertised to live `lifetime`.
	///
	/// Subtracts the margin from the (capped) lifetime and floors at zero.
	pub fn cache_ttl(&self, lifetime: Duration) -> Duration {
		let lifetime = match self.max_lifetime {
			Some(cap) => lifetime.min(cap),
			None => lifetime,
		};

		lifetime.checked_sub(self.safety_margin).unwrap_or(Duration::ZERO).max(Duration::ZERO)
	}
}
impl Default for CredentialPolicy {
	fn default() -> Self {
		Self { safety_margin: Self::DEFAULT_SAFETY_MARGIN, max_lifetime: None }
	}
}

/// Merchant settings required by payment flows.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaySettings {
	/// Merchant id.
	pub mch_id: MchId,
	/// Payment API key used by the signature engine; never logged.
	pub key: Secret,
	/// Asynchronous notification URL registered with each order.
	pub notify_url: String,
}
impl Debug for PaySettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PaySettings")
			.field("mch_id", &self.mch_id)
			.field("key", &"<redacted>")
			.field("notify_url", &self.notify_url)
			.finish()
	}
}

/// Immutable broker configuration consumed by [`crate::Wechat`].
#[derive(Clone, Debug)]
pub struct Config {
	/// App id + secret.
	pub identity: Arc<AppIdentity>,
	/// Merchant settings, when payments are enabled.
	pub pay: Option<PaySettings>,
	/// Host base URLs.
	pub endpoints: Endpoints,
	/// Cache policy for access tokens.
	pub access_token_policy: CredentialPolicy,
	/// Cache policy for JS-API tickets.
	pub jsapi_ticket_policy: CredentialPolicy,
	/// Per-request transport timeout.
	pub http_timeout: StdDuration,
}
impl Config {
	/// Default per-request transport timeout.
	pub const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Creates a builder seeded with the app credentials.
	pub fn builder(app_id: impl Into<String>, app_secret: impl Into<Secret>) -> ConfigBuilder {
		ConfigBuilder::new(app_id, app_secret)
	}

	/// Shortcut to the app id.
	pub fn app_id(&self) -> &AppId {
		&self.identity.app_id
	}

	/// Cache policy for `kind`.
	pub fn policy(&self, kind: CredentialKind) -> CredentialPolicy {
		match kind {
			CredentialKind::AccessToken => self.access_token_policy,
			CredentialKind::JsapiTicket => self.jsapi_ticket_policy,
		}
	}

	/// Merchant settings or a [`ConfigError::MissingPaySetting`].
	pub fn pay_settings(&self) -> Result<&PaySettings, ConfigError> {
		self.pay.as_ref().ok_or(ConfigError::MissingPaySetting { field: "merchant settings" })
	}
}

/// Builder for [`Config`] values.
#[derive(Debug)]
pub struct ConfigBuilder {
	app_id: String,
	app_secret: Secret,
	pay: Option<(String, Secret, String)>,
	endpoints: Endpoints,
	access_token_policy: CredentialPolicy,
	jsapi_ticket_policy: CredentialPolicy,
	http_timeout: StdDuration,
}
impl ConfigBuilder {
	/// Creates a new builder seeded with the app credentials.
	pub fn new(app_id: impl Into<String>, app_secret: impl Into<Secret>) -> Self {
		Self {
			app_id: app_id.into(),
			app_secret: app_secret.into(),
			pay: None,
			endpoints: Endpoints::default(),
			access_token_policy: CredentialPolicy::default(),
			jsapi_ticket_policy: CredentialPolicy::default(),
			http_timeout: Config::DEFAULT_HTTP_TIMEOUT,
		}
	}

	/// Enables payment flows with the given merchant id, API key, and notify URL.
	pub fn pay(
		mut self,
		mch_id: impl Into<String>,
		key: impl Into<Secret>,
		notify_url: impl Into<String>,
	) -> Self {
		self.pay = Some((mch_id.into(), key.into(), notify_url.into()));

		self
	}

	/// Overrides the host base URLs.
	pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
		self.endpoints = endpoints;

		self
	}

	/// Overrides the access token cache policy.
	pub fn access_token_policy(mut self, policy: CredentialPolicy) -> Self {
		self.access_token_policy = policy;

		self
	}

	/// Overrides the JS-API ticket cache policy.
	pub fn jsapi_ticket_policy(mut self, policy: CredentialPolicy) -> Self {
		self.jsapi_ticket_policy = policy;

		self
	}

	/// Overrides the per-request transport timeout.
	pub fn http_timeout(mut self, timeout: StdDuration) -> Self {
		self.http_timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<Config, ConfigError> {
		let app_id = AppId::new(&self.app_id)?;

		if self.app_secret.is_empty() {
			return Err(ConfigError::MissingAppSecret);
		}

		self.endpoints.validate()?;

		let pay = match self.pay {
			Some((mch_id, key, notify_url)) => {
				if key.is_empty() {
					return Err(ConfigError::MissingPaySetting { field: "payment key" });
				}
				if notify_url.is_empty() {
					return Err(ConfigError::MissingPaySetting { field: "notify URL" });
				}

				Some(PaySettings { mch_id: MchId::new(&mch_id)?, key, notify_url })
			},
			None => None,
		};

		Ok(Config {
			identity: Arc::new(AppIdentity::new(app_id, self.app_secret)),
			pay,
			endpoints: self.endpoints,
			access_token_policy: self.access_token_policy,
			jsapi_ticket_policy: self.jsapi_ticket_policy,
			http_timeout: self.http_timeout,
		})
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if matches!(url.scheme(), "http" | "https") && url.host().is_some() {
		Ok(())
	} else {
		Err(ConfigError::InvalidEndpoint { endpoint: name, url: url.to_string() })
	}
}
