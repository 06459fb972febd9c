//! Shared helpers for feature flows (nonces, timestamps, API calls).

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	error::EncodeError,
	http::{CONTENT_TYPE_JSON, HttpRequest, HttpTransport},
	wire,
};

/// Nonce length used by JS-SDK configurations.
pub const JS_NONCE_LEN: usize = 16;
/// Nonce length used by payment requests.
pub const PAY_NONCE_LEN: usize = 32;

/// Random alphanumeric string of `len` characters.
pub fn nonce_str(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}

/// `GET`s `url` from the API host and unwraps the `errcode` envelope.
pub(crate) async fn get_api<T>(transport: &dyn HttpTransport, url: Url) -> Result<T>
where
	T: DeserializeOwned,
{
	let response = transport.execute(HttpRequest::get(url)).await?;

	wire::decode_api_reply(&response.body)?.into_result()
}

/// `POST`s `body` as JSON to the API host and unwraps the `errcode` envelope.
pub(crate) async fn post_api<B, T>(transport: &dyn HttpTransport, url: Url, body: &B) -> Result<T>
where
	B: Serialize,
	T: DeserializeOwned,
{
	let payload = serde_json::to_vec(body).map_err(EncodeError::from)?;
	let response = transport.execute(HttpRequest::post(url, CONTENT_TYPE_JSON, payload)).await?;

	wire::decode_api_reply(&response.body)?.into_result()
}

/// Appends `access_token` to an API host URL.
pub(crate) fn with_access_token(mut url: Url, access_token: &str) -> Url {
	url.query_pairs_mut().append_pair("access_token", access_token);

	url
}
