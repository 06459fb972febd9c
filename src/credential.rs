//! Outbound issuance of app-level credentials (access tokens and JS-API tickets).
//!
//! [`CredentialStore`] performs the raw HTTP exchange only; caching and
//! single-flight coordination live in [`crate::token`].

// self
use crate::{
	_prelude::*,
	auth::{AppIdentity, Secret},
	config::Endpoints,
	error::DecodeError,
	http::{HttpRequest, HttpTransport},
	wire,
};

/// Freshly issued credential along with its advertised lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuedCredential {
	/// Credential value; redacted in debug output.
	pub value: Secret,
	/// Lifetime advertised by `expires_in`.
	pub lifetime: Duration,
}

#[derive(Deserialize)]
struct AccessTokenBody {
	#[serde(default)]
	access_token: String,
	#[serde(default)]
	expires_in: i64,
}

#[derive(Deserialize)]
struct TicketBody {
	#[serde(default)]
	ticket: String,
	#[serde(default)]
	expires_in: i64,
}

/// Issues credentials from the API host.
#[derive(Clone)]
pub struct CredentialStore {
	identity: Arc<AppIdentity>,
	endpoints: Endpoints,
	transport: Arc<dyn HttpTransport>,
}
impl CredentialStore {
	/// Creates a store issuing credentials for `identity`.
	pub fn new(
		identity: Arc<AppIdentity>,
		endpoints: Endpoints,
		transport: Arc<dyn HttpTransport>,
	) -> Self {
		Self { identity, endpoints, transport }
	}

	/// Identity the store issues credentials for.
	pub fn identity(&self) -> &AppIdentity {
		&self.identity
	}

	/// Shared transport used for every issuance call.
	pub fn transport(&self) -> &Arc<dyn HttpTransport> {
		&self.transport
	}

	/// Calls `cgi-bin/token` with the app credentials.
	pub async fn issue_access_token(&self) -> Result<IssuedCredential> {
		let mut url = self.endpoints.api_url("cgi-bin/token")?;

		url.query_pairs_mut()
			.append_pair("grant_type", "client_credential")
			.append_pair("appid", self.identity.app_id.as_str())
			.append_pair("secret", self.identity.app_secret.expose());

		let body: AccessTokenBody = self.fetch(url).await?;

		issued("access_token", body.access_token, body.expires_in)
	}

	/// Calls `cgi-bin/ticket/getticket` with a valid access token.
	pub async fn issue_jsapi_ticket(&self, access_token: &str) -> Result<IssuedCredential> {
		let mut url = self.endpoints.api_url("cgi-bin/ticket/getticket")?;

		url.query_pairs_mut().append_pair("access_token", access_token).append_pair("type", "jsapi");

		let body: TicketBody = self.fetch(url).await?;

		issued("ticket", body.ticket, body.expires_in)
	}

	async fn fetch<T>(&self, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.transport.execute(HttpRequest::get(url)).await?;

		wire::decode_api_reply(&response.body)?.into_result()
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore")
			.field("identity", &self.identity)
			.field("endpoints", &self.endpoints)
			.finish_non_exhaustive()
	}
}

fn issued(field: &'static str, value: String, expires_in: i64) -> Result<IssuedCredential> {
	if value.is_empty() {
		return Err(DecodeError::MissingField { field }.into());
	}
	if expires_in <= 0 {
		return Err(DecodeError::NonPositiveLifetime { value: expires_in }.into());
	}

	Ok(IssuedCredential { value: Secret::new(value), lifetime: Duration::seconds(expires_in) })
}
