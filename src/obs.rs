//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `wechat_broker.op` with the `op`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `wechat_broker_operation_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, auth::CredentialKind};

/// Operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Access token lease (cache lookup plus optional refresh).
	AccessToken,
	/// JS-API ticket lease (cache lookup plus optional refresh).
	JsapiTicket,
	/// `wx.config` parameter generation.
	JsConfig,
	/// Unified order placement.
	UnifiedOrder,
	/// Payment notification parsing.
	PayNotify,
	/// Web OAuth calls made with per-user tokens.
	WebOAuth,
	/// Template message calls.
	Template,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::AccessToken => "access_token",
			Operation::JsapiTicket => "jsapi_ticket",
			Operation::JsConfig => "js_config",
			Operation::UnifiedOrder => "unified_order",
			Operation::PayNotify => "pay_notify",
			Operation::WebOAuth => "web_oauth",
			Operation::Template => "template",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl From<CredentialKind> for Operation {
	fn from(kind: CredentialKind) -> Self {
		match kind {
			CredentialKind::AccessToken => Operation::AccessToken,
			CredentialKind::JsapiTicket => Operation::JsapiTicket,
		}
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a broker operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}

	/// Maps a result onto [`Outcome::Success`] or [`Outcome::Failure`].
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { Outcome::Success } else { Outcome::Failure }
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an [`OperationSpan`] and records attempt + outcome counters.
pub(crate) async fn observe<T, Fut>(op: Operation, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(op, stage);

	record_operation(op, Outcome::Attempt);

	let result = span.instrument(fut).await;

	record_operation(op, Outcome::of(&result));

	result
}
