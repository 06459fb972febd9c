//! Broker-level error types shared across the cache, signing, and feature flows.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Cache backend failure.
	#[error("{0}")]
	Cache(
		#[from]
		#[source]
		crate::cache::CacheError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout, unexpected HTTP status).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A request or reply payload could not be serialized.
	#[error(transparent)]
	Encode(#[from] EncodeError),
	/// The remote body could not be decoded into the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Signing inputs were unusable.
	#[error(transparent)]
	Signature(#[from] SignatureConfigError),

	/// The platform reported a non-zero error code.
	#[error("Remote API rejected the call: code={code}, message={message}.")]
	RemoteApi {
		/// Platform (`errcode`) or business (`err_code`) code, verbatim.
		code: ErrorCode,
		/// Platform-supplied message.
		message: String,
	},
	/// The payment gateway tier (`return_code`) reported a failure.
	#[error("Payment gateway returned {return_code}: {message}.")]
	PayGateway {
		/// Gateway `return_code`, usually `FAIL`.
		return_code: String,
		/// Gateway `return_msg`.
		message: String,
	},
}
impl Error {
	/// Returns a stable label describing the failure class.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Cache(_) => "cache",
			Self::Config(_) => "config",
			Self::Transport(_) => "transport",
			Self::Encode(_) => "encode",
			Self::Decode(_) => "decode",
			Self::Signature(_) => "signature",
			Self::RemoteApi { .. } => "remote",
			Self::PayGateway { .. } => "pay_gateway",
		}
	}
}

/// Error code reported by the remote platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
	/// Numeric `errcode` from the JSON API family.
	Platform(i64),
	/// Business `err_code` from the payment gateway.
	Business(String),
}
impl Display for ErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Platform(code) => write!(f, "{code}"),
			Self::Business(code) => f.write_str(code),
		}
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// The app secret was empty.
	#[error("App secret cannot be empty.")]
	MissingAppSecret,
	/// An endpoint base URL is unusable.
	#[error("The {endpoint} endpoint must be an http(s) URL: {url}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A URL could not be joined onto an endpoint base.
	#[error("Failed to build a request URL.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A payment call was made without merchant settings.
	#[error("Payment settings are missing the {field}.")]
	MissingPaySetting {
		/// Name of the missing setting.
		field: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call did not finish within the configured timeout.
	#[error("Remote endpoint did not respond before the timeout.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// The endpoint answered with a non-success HTTP status.
	#[error("Remote endpoint answered with HTTP status {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Outgoing payloads the serializers rejected.
#[derive(Debug, ThisError)]
pub enum EncodeError {
	/// JSON request body could not be serialized.
	#[error("Request payload could not be serialized as JSON.")]
	Json {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// XML document could not be serialized.
	#[error("Payload could not be serialized as XML.")]
	Xml {
		/// Underlying serializer failure.
		#[source]
		source: BoxError,
	},
}
impl EncodeError {
	/// Wraps an XML serializer failure.
	pub fn xml(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Xml { source: Box::new(src) }
	}
}
impl From<serde_json::Error> for EncodeError {
	fn from(source: serde_json::Error) -> Self {
		Self::Json { source }
	}
}

/// Remote bodies that do not match the expected shape.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// JSON body could not be parsed.
	#[error("Remote endpoint returned malformed JSON.")]
	Json {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// XML body could not be parsed.
	#[error("Remote endpoint returned malformed XML.")]
	Xml {
		/// Underlying XML failure.
		#[source]
		source: BoxError,
	},
	/// A required field was absent or empty.
	#[error("Remote reply is missing the `{field}` field.")]
	MissingField {
		/// Field name as it appears on the wire.
		field: &'static str,
	},
	/// The declared credential lifetime was zero or negative.
	#[error("The expires_in value must be positive, got {value}.")]
	NonPositiveLifetime {
		/// Raw `expires_in` value.
		value: i64,
	},
}
impl DecodeError {
	/// Wraps an XML deserializer failure.
	pub fn xml(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Xml { source: Box::new(src) }
	}
}

/// Signing inputs rejected before any hashing or network call.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SignatureConfigError {
	/// The secret key was empty.
	#[error("Signing key is missing.")]
	MissingSecretKey,
	/// No non-empty parameter remained after canonicalization.
	#[error("Parameter set is empty; nothing to sign.")]
	EmptyParameters,
	/// The requested sign type is not supported.
	#[error("Unsupported sign type `{0}`.")]
	UnsupportedSignType(String),
	/// A signed payload carried no `sign` field.
	#[error("Payload carries no `sign` field.")]
	MissingSignature,
	/// The carried signature did not match the recomputed one.
	#[error("Payload signature does not match.")]
	Mismatch,
}
