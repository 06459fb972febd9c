//! Credential kinds minted by the platform.

// self
use crate::{_prelude::*, auth::AppId};

/// Short-lived credentials the broker caches on behalf of an app.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
	/// Server-side `access_token` authorizing API calls.
	AccessToken,
	/// `jsapi_ticket` used to sign JS-SDK configurations.
	JsapiTicket,
}
impl CredentialKind {
	/// All kinds, in refresh-dependency order.
	pub const ALL: [CredentialKind; 2] = [CredentialKind::AccessToken, CredentialKind::JsapiTicket];

	/// Returns a stable label suitable for cache keys, spans, and metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::AccessToken => "access_token",
			CredentialKind::JsapiTicket => "jsapi_ticket",
		}
	}

	/// Cache key holding this kind's credential for `app_id`.
	pub fn cache_key(self, app_id: &AppId) -> String {
		format!("{}_{app_id}", self.as_str())
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn cache_keys_are_namespaced_per_kind() {
		let app = AppId::new("wx123").expect("App id fixture should be valid.");

		assert_eq!(CredentialKind::AccessToken.cache_key(&app), "access_token_wx123");
		assert_eq!(CredentialKind::JsapiTicket.cache_key(&app), "jsapi_ticket_wx123");
	}
}
