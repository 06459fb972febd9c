//! Long-lived app identity shared read-only by every feature flow.

// self
use crate::{
	_prelude::*,
	auth::{AppId, Secret},
};

/// App id + app secret pair used to mint credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
	/// Platform app id.
	pub app_id: AppId,
	/// App secret; never logged.
	pub app_secret: Secret,
}
impl AppIdentity {
	/// Pairs an app id with its secret.
	pub fn new(app_id: AppId, app_secret: impl Into<Secret>) -> Self {
		Self { app_id, app_secret: app_secret.into() }
	}
}
impl Debug for AppIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppIdentity")
			.field("app_id", &self.app_id)
			.field("app_secret", &"<redacted>")
			.finish()
	}
}
