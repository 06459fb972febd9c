//! Deterministic request signatures for payment and JS-bridge calls.
//!
//! Two conventions coexist on the platform:
//!
//! - The payment gateway signs a parameter map: drop `sign`, sort keys byte-wise,
//!   skip empty values, join `k=v&` pairs, append `key=<secret>`, hash, and upper-case
//!   the hex digest ([`sign`], [`sign_with`], [`sign_as`]).
//! - The JS bridge signs a fixed-order string (`jsapi_ticket`, `noncestr`, `timestamp`,
//!   `url`) with SHA-1 and keeps the hex digest lower-case ([`jsapi_signature`]).
//!
//! Everything here is pure: no I/O, no shared state.

// std
use std::fmt::Write as _;
// crates.io
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::SignatureConfigError};

/// Parameter name excluded from canonicalization.
pub const SIGN_FIELD: &str = "sign";

/// Parameters to sign, kept sorted by key regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignParams(BTreeMap<String, String>);
impl SignParams {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a parameter.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
		self.0.insert(key.into(), value.into());

		self
	}

	/// Chained variant of [`SignParams::insert`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(key, value);

		self
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Iterates the parameters in canonical (byte-wise) key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Number of parameters, including empty and `sign` entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameter is present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for SignParams
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl From<HashMap<String, String>> for SignParams {
	fn from(map: HashMap<String, String>) -> Self {
		Self(map.into_iter().collect())
	}
}
impl From<BTreeMap<String, String>> for SignParams {
	fn from(map: BTreeMap<String, String>) -> Self {
		Self(map)
	}
}

/// Digest applied to the canonical string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignType {
	/// MD5, the gateway's historical default.
	#[default]
	#[serde(rename = "MD5")]
	Md5,
	/// HMAC-SHA256 keyed with the payment key.
	#[serde(rename = "HMAC-SHA256")]
	HmacSha256,
}
impl SignType {
	/// Wire label (`signType` / `sign_type`).
	pub const fn as_str(self) -> &'static str {
		match self {
			SignType::Md5 => "MD5",
			SignType::HmacSha256 => "HMAC-SHA256",
		}
	}
}
impl Display for SignType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SignType {
	type Err = SignatureConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"" | "MD5" => Ok(SignType::Md5),
			"HMAC-SHA256" => Ok(SignType::HmacSha256),
			other => Err(SignatureConfigError::UnsupportedSignType(other.to_owned())),
		}
	}
}

/// Builds the canonical string hashed by [`sign`], including the trailing `key=`.
pub fn canonical_string(params: &SignParams, key: &str) -> String {
	let mut buf = String::with_capacity(256);

	for (k, v) in params.iter() {
		if k == SIGN_FIELD || v.is_empty() {
			continue;
		}

		let _ = write!(buf, "{k}={v}&");
	}

	buf.push_str("key=");
	buf.push_str(key);

	buf
}

/// Signs `params` with MD5 and returns the upper-case hex digest.
pub fn sign(params: &SignParams, key: &str) -> Result<String, SignatureConfigError> {
	sign_with::<Md5>(params, key)
}

/// Signs `params` with any [`Digest`] and returns the upper-case hex digest.
pub fn sign_with<D>(params: &SignParams, key: &str) -> Result<String, SignatureConfigError>
where
	D: Digest,
{
	let message = checked_canonical_string(params, key)?;

	Ok(hex::encode_upper(D::digest(message.as_bytes())))
}

/// Signs `params` according to the gateway's `sign_type`.
pub fn sign_as(
	sign_type: SignType,
	params: &SignParams,
	key: &str,
) -> Result<String, SignatureConfigError> {
	match sign_type {
		SignType::Md5 => sign(params, key),
		SignType::HmacSha256 => {
			let message = checked_canonical_string(params, key)?;
			let mut mac = <Hmac<Sha256>>::new_from_slice(key.as_bytes())
				.map_err(|_| SignatureConfigError::MissingSecretKey)?;

			mac.update(message.as_bytes());

			Ok(hex::encode_upper(mac.finalize().into_bytes()))
		},
	}
}

/// Recomputes the signature of `params` and compares it with the carried `sign` entry.
pub fn verify(
	params: &SignParams,
	key: &str,
	sign_type: SignType,
) -> Result<(), SignatureConfigError> {
	let carried = params
		.get(SIGN_FIELD)
		.filter(|value| !value.is_empty())
		.ok_or(SignatureConfigError::MissingSignature)?;

	if sign_as(sign_type, params, key)? == carried {
		Ok(())
	} else {
		Err(SignatureConfigError::Mismatch)
	}
}

/// JS-SDK `wx.config` signature.
///
/// Key order is fixed by the bridge (not sorted-map canonicalization) and the digest is
/// SHA-1 rendered as lower-case hex.
pub fn jsapi_signature(ticket: &str, nonce_str: &str, timestamp: i64, url: &str) -> String {
	let message = format!("jsapi_ticket={ticket}&noncestr={nonce_str}&timestamp={timestamp}&url={url}");

	hex::encode(Sha1::digest(message.as_bytes()))
}

/// Fields of the first-stage unified-order signature.
#[derive(Clone, Copy, Debug)]
pub struct OrderSignFields<'a> {
	/// `appid`
	pub app_id: &'a str,
	/// `body`
	pub body: &'a str,
	/// `mch_id`
	pub mch_id: &'a str,
	/// `nonce_str`
	pub nonce_str: &'a str,
	/// `notify_url`
	pub notify_url: &'a str,
	/// `openid`
	pub open_id: &'a str,
	/// `out_trade_no`
	pub out_trade_no: &'a str,
	/// `spbill_create_ip`
	pub spbill_create_ip: &'a str,
	/// `total_fee`
	pub total_fee: &'a str,
	/// `trade_type`
	pub trade_type: &'a str,
}

/// Renders the fixed unified-order template, including the trailing `key=`.
///
/// Unlike [`canonical_string`], empty fields are kept (`openid=&`).
pub fn unified_order_sign_string(fields: &OrderSignFields<'_>, key: &str) -> String {
	format!(
		"appid={}&body={}&mch_id={}&nonce_str={}&notify_url={}&openid={}&out_trade_no={}&spbill_create_ip={}&total_fee={}&trade_type={}&key={key}",
		fields.app_id,
		fields.body,
		fields.mch_id,
		fields.nonce_str,
		fields.notify_url,
		fields.open_id,
		fields.out_trade_no,
		fields.spbill_create_ip,
		fields.total_fee,
		fields.trade_type,
	)
}

/// MD5 of [`unified_order_sign_string`], upper-case hex.
pub fn unified_order_sign(
	fields: &OrderSignFields<'_>,
	key: &str,
) -> Result<String, SignatureConfigError> {
	if key.is_empty() {
		return Err(SignatureConfigError::MissingSecretKey);
	}

	Ok(hex::encode_upper(Md5::digest(unified_order_sign_string(fields, key).as_bytes())))
}

fn checked_canonical_string(params: &SignParams, key: &str) -> Result<String, SignatureConfigError> {
	if key.is_empty() {
		return Err(SignatureConfigError::MissingSecretKey);
	}
	if !params.iter().any(|(k, v)| k != SIGN_FIELD && !v.is_empty()) {
		return Err(SignatureConfigError::EmptyParameters);
	}

	Ok(canonical_string(params, key))
}
