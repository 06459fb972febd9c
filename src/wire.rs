//! Tagged decoding of platform replies.
//!
//! The API host answers with a flat JSON (occasionally XML) object that either
//! carries the requested fields or an `errcode`/`errmsg` pair. The payment gateway
//! answers with XML carrying two independent tiers: `return_code` for the gateway
//! call itself and `result_code` for the business outcome. Both shapes are read
//! envelope-first, so a payload is only decoded into its success type once the
//! envelope says it succeeded.

// self
use crate::{
	_prelude::*,
	error::{DecodeError, EncodeError, ErrorCode},
};

const SUCCESS: &str = "SUCCESS";

/// Structured platform error carried by a JSON/XML API reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiFailure {
	/// Non-zero `errcode`.
	pub errcode: i64,
	/// `errmsg` as sent by the platform.
	pub errmsg: String,
}

/// Reply from the API host: either the decoded payload or the platform error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiReply<T> {
	/// `errcode` was absent or zero.
	Success(T),
	/// `errcode` was non-zero.
	Failure(ApiFailure),
}
impl<T> ApiReply<T> {
	/// Converts the platform failure into [`Error::RemoteApi`].
	pub fn into_result(self) -> Result<T> {
		match self {
			Self::Success(value) => Ok(value),
			Self::Failure(ApiFailure { errcode, errmsg }) =>
				Err(Error::RemoteApi { code: ErrorCode::Platform(errcode), message: errmsg }),
		}
	}
}

/// Reply from the payment gateway, split along its two tiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayReply<T> {
	/// The gateway call itself failed (`return_code != SUCCESS`); business fields were not read.
	GatewayFailure {
		/// Raw `return_code`.
		return_code: String,
		/// Raw `return_msg`.
		return_msg: String,
	},
	/// The gateway accepted the call but the business result failed.
	BusinessFailure {
		/// Raw `result_code`.
		result_code: String,
		/// Business `err_code`.
		err_code: String,
		/// Business `err_code_des`.
		err_code_des: String,
	},
	/// Both tiers succeeded.
	Success(T),
}
impl<T> PayReply<T> {
	/// Maps gateway failures to [`Error::PayGateway`] and business failures to
	/// [`Error::RemoteApi`] carrying the business code.
	pub fn into_result(self) -> Result<T> {
		match self {
			Self::Success(value) => Ok(value),
			Self::GatewayFailure { return_code, return_msg } =>
				Err(Error::PayGateway { return_code, message: return_msg }),
			Self::BusinessFailure { result_code, err_code, err_code_des } => {
				let code = if err_code.is_empty() { result_code } else { err_code };

				Err(Error::RemoteApi { code: ErrorCode::Business(code), message: err_code_des })
			},
		}
	}
}

#[derive(Deserialize)]
struct ApiEnvelope {
	#[serde(default)]
	errcode: i64,
	#[serde(default)]
	errmsg: String,
}

#[derive(Deserialize)]
struct GatewayEnvelope {
	#[serde(default)]
	return_code: String,
	#[serde(default)]
	return_msg: String,
}

#[derive(Deserialize)]
struct BusinessEnvelope {
	#[serde(default)]
	result_code: String,
	#[serde(default)]
	err_code: String,
	#[serde(default)]
	err_code_des: String,
}

/// Decodes an API host reply, accepting JSON or XML bodies.
pub fn decode_api_reply<T>(body: &[u8]) -> Result<ApiReply<T>, DecodeError>
where
	T: DeserializeOwned,
{
	let xml = looks_like_xml(body);
	let envelope: ApiEnvelope = if xml { decode_xml(body)? } else { decode_json(body)? };

	if envelope.errcode != 0 {
		return Ok(ApiReply::Failure(ApiFailure {
			errcode: envelope.errcode,
			errmsg: envelope.errmsg,
		}));
	}

	let payload = if xml { decode_xml(body)? } else { decode_json(body)? };

	Ok(ApiReply::Success(payload))
}

/// Decodes a payment gateway reply tier by tier.
pub fn decode_pay_reply<T>(body: &[u8]) -> Result<PayReply<T>, DecodeError>
where
	T: DeserializeOwned,
{
	let gateway: GatewayEnvelope = decode_xml(body)?;

	if gateway.return_code.is_empty() {
		return Err(DecodeError::MissingField { field: "return_code" });
	}
	if gateway.return_code != SUCCESS {
		return Ok(PayReply::GatewayFailure {
			return_code: gateway.return_code,
			return_msg: gateway.return_msg,
		});
	}

	let business: BusinessEnvelope = decode_xml(body)?;

	if business.result_code != SUCCESS {
		return Ok(PayReply::BusinessFailure {
			result_code: business.result_code,
			err_code: business.err_code,
			err_code_des: business.err_code_des,
		});
	}

	Ok(PayReply::Success(decode_xml(body)?))
}

/// Decodes a JSON body, recording the failing path on error.
pub fn decode_json<T>(body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| DecodeError::Json { source })
}

/// Decodes an XML body whose root element wraps the fields (`<xml>...</xml>`).
pub fn decode_xml<T>(body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let text = std::str::from_utf8(body).map_err(DecodeError::xml)?;

	quick_xml::de::from_str(text.trim()).map_err(DecodeError::xml)
}

/// Serializes `value` as an XML document rooted at `<xml>`.
pub fn encode_xml<T>(value: &T) -> Result<String, EncodeError>
where
	T: Serialize,
{
	quick_xml::se::to_string_with_root("xml", value).map_err(EncodeError::xml)
}

fn looks_like_xml(body: &[u8]) -> bool {
	body.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'<')
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, Deserialize, PartialEq)]
	struct Ticket {
		ticket: String,
		expires_in: i64,
	}

	#[derive(Debug, Deserialize, PartialEq)]
	struct Prepay {
		prepay_id: String,
	}

	#[test]
	fn api_reply_success_ignores_zero_errcode() {
		let body = br#"{"errcode":0,"errmsg":"ok","ticket":"T-1","expires_in":7200}"#;
		let reply: ApiReply<Ticket> = decode_api_reply(body).expect("Reply should decode.");

		assert_eq!(reply, ApiReply::Success(Ticket { ticket: "T-1".into(), expires_in: 7200 }));
	}

	#[test]
	fn api_reply_failure_skips_payload_decoding() {
		let body = br#"{"errcode":40001,"errmsg":"invalid credential"}"#;
		let reply: ApiReply<Ticket> = decode_api_reply(body).expect("Failure reply should decode.");

		assert_eq!(
			reply,
			ApiReply::Failure(ApiFailure { errcode: 40001, errmsg: "invalid credential".into() })
		);

		let err = reply.into_result().expect_err("Failure reply should map to an error.");

		assert!(matches!(err, Error::RemoteApi { code: ErrorCode::Platform(40001), .. }));
	}

	#[test]
	fn api_reply_accepts_xml_bodies() {
		let body = b"  <xml><ticket><![CDATA[T-2]]></ticket><expires_in>7200</expires_in></xml>";
		let reply: ApiReply<Ticket> = decode_api_reply(body).expect("XML reply should decode.");

		assert_eq!(reply, ApiReply::Success(Ticket { ticket: "T-2".into(), expires_in: 7200 }));
	}

	#[test]
	fn malformed_json_reports_path() {
		let body = br#"{"ticket":"T-3","expires_in":"soon"}"#;
		let err = decode_api_reply::<Ticket>(body).expect_err("Bad field type should fail.");

		match err {
			DecodeError::Json { source } => assert_eq!(source.path().to_string(), "expires_in"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn gateway_failure_never_reads_business_tier() {
		let body = b"<xml><return_code><![CDATA[FAIL]]></return_code>\
			<return_msg><![CDATA[signature error]]></return_msg>\
			<result_code><![CDATA[FAIL]]></result_code><err_code>ORDERPAID</err_code></xml>";
		let reply: PayReply<Prepay> = decode_pay_reply(body).expect("Gateway failure should decode.");

		assert_eq!(
			reply,
			PayReply::GatewayFailure {
				return_code: "FAIL".into(),
				return_msg: "signature error".into()
			}
		);
		assert!(matches!(reply.into_result(), Err(Error::PayGateway { .. })));
	}

	#[test]
	fn business_failure_yields_remote_error_with_business_code() {
		let body = b"<xml><return_code>SUCCESS</return_code><return_msg>OK</return_msg>\
			<result_code>FAIL</result_code><err_code>ORDERPAID</err_code>\
			<err_code_des>order already paid</err_code_des></xml>";
		let err = decode_pay_reply::<Prepay>(body)
			.expect("Business failure should decode.")
			.into_result()
			.expect_err("Business failure should map to an error.");

		match err {
			Error::RemoteApi { code, message } => {
				assert_eq!(code, ErrorCode::Business("ORDERPAID".into()));
				assert_eq!(message, "order already paid");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn pay_success_decodes_payload() {
		let body = b"<xml><return_code>SUCCESS</return_code><result_code>SUCCESS</result_code>\
			<prepay_id>wx201410272009395522657a690389285100</prepay_id></xml>";
		let reply: PayReply<Prepay> = decode_pay_reply(body).expect("Success should decode.");

		assert_eq!(
			reply,
			PayReply::Success(Prepay { prepay_id: "wx201410272009395522657a690389285100".into() })
		);
	}

	#[test]
	fn pay_reply_without_return_code_is_malformed() {
		let body = b"<xml><result_code>SUCCESS</result_code></xml>";

		assert!(matches!(
			decode_pay_reply::<Prepay>(body),
			Err(DecodeError::MissingField { field: "return_code" })
		));
	}
}
