//! Transport primitives for calls to the platform's HTTP API.
//!
//! [`HttpTransport`] is the broker's only dependency on an HTTP stack. Callers
//! provide an implementation behind `Arc<dyn HttpTransport>`; the broker builds
//! [`HttpRequest`] values and interprets the raw [`HttpResponse`] bytes itself,
//! so decoding and the error taxonomy stay in one place regardless of client.
//! Implementations must enforce their own timeout and report it as
//! [`TransportError::Timeout`] instead of hanging.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::{Method, header::CONTENT_TYPE};
// self
use crate::{_prelude::*, error::TransportError};

/// `Content-Type` used for XML bodies sent to the payment gateway.
pub const CONTENT_TYPE_XML: &str = "application/xml; charset=utf-8";
/// `Content-Type` used for JSON bodies sent to the API host.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP clients able to issue GET/POST calls.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the raw response.
	///
	/// Non-success statuses should surface as [`TransportError::Status`].
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP verbs used by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
}

/// Outbound request assembled by the broker.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// Verb.
	pub method: HttpMethod,
	/// Fully-formed URL, including query parameters.
	pub url: Url,
	/// Body content type, when a body is present.
	pub content_type: Option<&'static str>,
	/// Raw body bytes.
	pub body: Option<Vec<u8>>,
}
impl HttpRequest {
	/// Builds a body-less `GET`.
	pub fn get(url: Url) -> Self {
		Self { method: HttpMethod::Get, url, content_type: None, body: None }
	}

	/// Builds a `POST` carrying `body`.
	pub fn post(url: Url, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
		Self { method: HttpMethod::Post, url, content_type: Some(content_type), body: Some(body.into()) }
	}
}

/// Raw response handed back by a transport.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Builds a `200 OK` response around `body`.
	pub fn ok(body: impl Into<Vec<u8>>) -> Self {
		Self { status: 200, body: body.into() }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a client that fails calls taking longer than `timeout`.
	pub fn new(timeout: StdDuration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.user_agent(concat!("wechat-broker/", env!("CARGO_PKG_VERSION")))
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`]; the caller owns its timeout policy.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				HttpMethod::Get => Method::GET,
				HttpMethod::Post => Method::POST,
			};
			let mut builder = self.0.request(method, request.url);

			if let Some(content_type) = request.content_type {
				builder = builder.header(CONTENT_TYPE, content_type);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status();

			if !status.is_success() {
				return Err(TransportError::Status { status: status.as_u16() });
			}

			let body = response.bytes().await?.to_vec();

			Ok(HttpResponse { status: status.as_u16(), body })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_builders_set_method_and_body() {
		let url = Url::parse("https://api.weixin.qq.com/cgi-bin/token")
			.expect("Fixture URL should parse.");
		let get = HttpRequest::get(url.clone());
		let post = HttpRequest::post(url, CONTENT_TYPE_XML, "<xml/>");

		assert_eq!(get.method, HttpMethod::Get);
		assert!(get.body.is_none());
		assert_eq!(post.method, HttpMethod::Post);
		assert_eq!(post.content_type, Some(CONTENT_TYPE_XML));
		assert_eq!(post.body.as_deref(), Some(b"<xml/>".as_slice()));
	}
}
