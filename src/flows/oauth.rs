//! Web page authorization with per-user tokens.
//!
//! User tokens obtained here belong to individual visitors; they are returned to
//! the caller and never enter the app-level credential cache.

// crates.io
use serde::de::IgnoredAny;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	flows::{Wechat, common},
	http::HttpRequest,
	obs::{self, Operation},
	wire::{self, ApiReply},
};

/// Scope requested on the authorize page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OAuthScope {
	/// Silent authorization; yields the open id only.
	#[serde(rename = "snsapi_base")]
	Base,
	/// Prompted authorization; allows [`WebOAuth::user_info`].
	#[serde(rename = "snsapi_userinfo")]
	UserInfo,
}
impl OAuthScope {
	/// Wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			OAuthScope::Base => "snsapi_base",
			OAuthScope::UserInfo => "snsapi_userinfo",
		}
	}
}
impl Display for OAuthScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Per-user token returned by the code exchange and refresh calls.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserAccessToken {
	/// User access token; redacted in debug output.
	pub access_token: Secret,
	/// Lifetime in seconds.
	#[serde(default)]
	pub expires_in: i64,
	/// Refresh token; redacted in debug output.
	pub refresh_token: Secret,
	/// Visitor open id.
	#[serde(rename = "openid")]
	pub open_id: String,
	/// Granted scope.
	#[serde(default)]
	pub scope: String,
	/// Union id, when the app is bound to an open platform account.
	#[serde(default, rename = "unionid")]
	pub union_id: Option<String>,
}

/// Visitor profile (requires [`OAuthScope::UserInfo`]).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserInfo {
	/// Visitor open id.
	#[serde(rename = "openid")]
	pub open_id: String,
	/// Nickname.
	pub nickname: String,
	/// 1 male, 2 female, 0 unknown.
	pub sex: i32,
	/// Province.
	pub province: String,
	/// City.
	pub city: String,
	/// Country.
	pub country: String,
	/// Avatar URL.
	#[serde(rename = "headimgurl")]
	pub head_img_url: String,
	/// Privileges.
	pub privilege: Vec<String>,
	/// Union id.
	#[serde(rename = "unionid")]
	pub union_id: String,
}

/// Web OAuth helpers bound to one app.
#[derive(Clone, Debug)]
pub struct WebOAuth {
	wechat: Wechat,
}
impl WebOAuth {
	pub(crate) fn new(wechat: Wechat) -> Self {
		Self { wechat }
	}

	/// Builds the authorize page URL the visitor is redirected to.
	pub fn redirect_url(&self, redirect_uri: &str, scope: OAuthScope, state: &str) -> Result<Url> {
		let config = self.wechat.config();
		let mut url = config.endpoints.open_url("connect/oauth2/authorize")?;

		url.query_pairs_mut()
			.append_pair("appid", config.app_id())
			.append_pair("redirect_uri", redirect_uri)
			.append_pair("response_type", "code")
			.append_pair("scope", scope.as_str())
			.append_pair("state", state);
		url.set_fragment(Some("wechat_redirect"));

		Ok(url)
	}

	/// Exchanges the authorization `code` for a user token.
	pub async fn exchange_code(&self, code: &str) -> Result<UserAccessToken> {
		obs::observe(Operation::WebOAuth, "exchange_code", async {
			let identity = &self.wechat.config().identity;
			let mut url = self.wechat.config().endpoints.api_url("sns/oauth2/access_token")?;

			url.query_pairs_mut()
				.append_pair("appid", identity.app_id.as_str())
				.append_pair("secret", identity.app_secret.expose())
				.append_pair("code", code)
				.append_pair("grant_type", "authorization_code");

			common::get_api(self.wechat.transport(), url).await
		})
		.await
	}

	/// Renews a user token with its refresh token.
	pub async fn refresh_user_token(&self, refresh_token: &str) -> Result<UserAccessToken> {
		obs::observe(Operation::WebOAuth, "refresh_user_token", async {
			let mut url = self.wechat.config().endpoints.api_url("sns/oauth2/refresh_token")?;

			url.query_pairs_mut()
				.append_pair("appid", self.wechat.config().app_id())
				.append_pair("grant_type", "refresh_token")
				.append_pair("refresh_token", refresh_token);

			common::get_api(self.wechat.transport(), url).await
		})
		.await
	}

	/// Returns whether `access_token` is still valid for `open_id`.
	///
	/// A platform error code means "invalid" and yields `Ok(false)`; transport and
	/// decoding failures still surface as errors.
	pub async fn check_user_token(&self, access_token: &str, open_id: &str) -> Result<bool> {
		obs::observe(Operation::WebOAuth, "check_user_token", async {
			let mut url = self.wechat.config().endpoints.api_url("sns/auth")?;

			url.query_pairs_mut().append_pair("access_token", access_token).append_pair("openid", open_id);

			let response = self.wechat.transport().execute(HttpRequest::get(url)).await?;
			let reply: ApiReply<IgnoredAny> = wire::decode_api_reply(&response.body)?;

			Ok(matches!(reply, ApiReply::Success(_)))
		})
		.await
	}

	/// Fetches the visitor profile.
	pub async fn user_info(&self, access_token: &str, open_id: &str) -> Result<UserInfo> {
		obs::observe(Operation::WebOAuth, "user_info", async {
			let mut url = self.wechat.config().endpoints.api_url("sns/userinfo")?;

			url.query_pairs_mut()
				.append_pair("access_token", access_token)
				.append_pair("openid", open_id)
				.append_pair("lang", "zh_CN");

			common::get_api(self.wechat.transport(), url).await
		})
		.await
	}
}
