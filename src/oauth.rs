//! Client-credentials token exchange wire formats and transport error mapping.
//!
//! Two transports are interchangeable from the issuer's point of view: a direct call to the
//! OAuth2 token endpoint with HTTP Basic client authentication, and a call to the same-origin
//! relay's `/api/auth` endpoint with a JSON body. Both answer with a [`TokenResponse`].

pub use oauth2;

// crates.io
use oauth2::{
	HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, DEFAULT_TOKEN_TYPE},
	error::{AuthError, ConfigError, TransportError},
	flows::common::describe_error_body,
	obs::FlowKind,
};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;
/// Longest lifetime honored; larger values are clamped.
pub const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 60 * 60;

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted during `kind` into a broker error.
	fn map_transport_error(&self, kind: FlowKind, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, kind: FlowKind, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) if inner.is_builder() =>
				ConfigError::from(*inner).into(),
			HttpClientError::Reqwest(inner) => transport_failure(kind, TransportError::from(*inner)),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => transport_failure(kind, TransportError::Io(inner)),
			HttpClientError::Other(message) => transport_failure(kind, TransportError::Other(message)),
			_ => transport_failure(kind, TransportError::Other("unknown transport failure".into())),
		}
	}
}

/// Attributes a transport failure to the stage it happened in: failures while exchanging
/// credentials are authentication errors, everything else stays a transport error.
pub fn transport_failure(kind: FlowKind, err: TransportError) -> Error {
	match kind {
		FlowKind::TokenExchange => AuthError::Unreachable(err).into(),
		_ => err.into(),
	}
}

/// Token payload shared by the token endpoint and the relay.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Opaque bearer value.
	pub access_token: String,
	/// Token type; `Bearer` when omitted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Lifetime in seconds; one hour when omitted.
	///
	/// Numeric strings are accepted. Any other non-integer value counts as omitted.
	#[serde(
		default,
		deserialize_with = "deserialize_lifetime",
		skip_serializing_if = "Option::is_none"
	)]
	pub expires_in: Option<i64>,
}
impl TokenResponse {
	/// Token type with the default applied.
	pub fn token_type_or_default(&self) -> &str {
		self.token_type
			.as_deref()
			.filter(|kind| !kind.trim().is_empty())
			.unwrap_or(DEFAULT_TOKEN_TYPE)
	}

	/// Lifetime with the default applied; non-positive values count as omitted and values past
	/// [`MAX_EXPIRES_IN_SECS`] are clamped.
	pub fn expires_in_or_default(&self) -> i64 {
		self.expires_in
			.filter(|secs| *secs > 0)
			.map_or(DEFAULT_EXPIRES_IN_SECS, |secs| secs.min(MAX_EXPIRES_IN_SECS))
	}

	/// Copy with both defaults written out, as the relay returns it.
	pub fn with_defaults(&self) -> Self {
		Self {
			access_token: self.access_token.clone(),
			token_type: Some(self.token_type_or_default().to_owned()),
			expires_in: Some(self.expires_in_or_default()),
		}
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lifetime {
	Seconds(i64),
	Text(String),
	Other(JsonValue),
}

fn deserialize_lifetime<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(match Lifetime::deserialize(deserializer)? {
		Lifetime::Seconds(secs) => Some(secs),
		Lifetime::Text(text) => text.trim().parse().ok(),
		Lifetime::Other(_) => None,
	})
}

/// JSON body accepted by the relay's `POST /api/auth`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthExchangeRequest {
	/// User-supplied client identifier; may be empty when server credentials are requested.
	#[serde(default)]
	pub client_id: String,
	/// User-supplied client secret; may be empty when server credentials are requested.
	#[serde(default)]
	pub secret_id: String,
	/// Asks the relay to exchange its deployment-level pair instead.
	#[serde(default)]
	pub use_server_credentials: bool,
}
impl AuthExchangeRequest {
	/// Builds a body carrying the user's pair.
	pub fn from_pair(pair: &CredentialPair, use_server_credentials: bool) -> Self {
		Self {
			client_id: pair.client_id.clone(),
			secret_id: pair.secret_id.expose().to_owned(),
			use_server_credentials,
		}
	}

	/// Builds a body that relies solely on the relay's deployment-level pair.
	pub fn server_only() -> Self {
		Self { use_server_credentials: true, ..Default::default() }
	}
}
impl Debug for AuthExchangeRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthExchangeRequest")
			.field("client_id", &self.client_id)
			.field("secret_id", &"<redacted>")
			.field("use_server_credentials", &self.use_server_credentials)
			.finish()
	}
}

/// Builds `POST {token_url}` with Basic client authentication and
/// `grant_type=client_credentials`.
pub fn direct_exchange_request(token_url: &Url, pair: &CredentialPair) -> Result<HttpRequest> {
	Request::builder()
		.method(Method::POST)
		.uri(token_url.as_str())
		.header(AUTHORIZATION, pair.basic_authorization())
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.header(ACCEPT, "application/json")
		.body(b"grant_type=client_credentials".to_vec())
		.map_err(|e| ConfigError::from(e).into())
}

/// Builds `POST {relay_url}` with the JSON exchange body.
pub fn relay_exchange_request(relay_url: &Url, body: &AuthExchangeRequest) -> Result<HttpRequest> {
	let payload = serde_json::to_vec(body).map_err(ConfigError::http_client_build)?;

	Request::builder()
		.method(Method::POST)
		.uri(relay_url.as_str())
		.header(CONTENT_TYPE, "application/json")
		.header(ACCEPT, "application/json")
		.body(payload)
		.map_err(|e| ConfigError::from(e).into())
}

/// Interprets a token endpoint (or relay) response.
pub fn parse_token_response(response: HttpResponse) -> Result<TokenResponse> {
	let status = response.status().as_u16();
	let body = response.body();

	if !response.status().is_success() {
		let (message, details) = describe_error_body(body);

		return Err(AuthError::Rejected {
			status,
			message: message.unwrap_or_else(|| "Authentication failed".into()),
			details,
		}
		.into());
	}

	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| AuthError::MalformedResponse { status, source }.into())
}
