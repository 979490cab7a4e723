//! Service descriptor data structures shared by the issuer and the executor.

/// Builder API for assembling service descriptors.
pub mod builder;
/// Service-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Production base URL of the Xubio REST API.
pub const XUBIO_API_BASE: &str = "https://xubio.com/API/1.1/";
/// Token endpoint path relative to the API base.
pub const TOKEN_ENDPOINT_PATH: &str = "TokenEndpoint";
/// Endpoint returning the identity of the authenticated company.
pub const TENANT_ENDPOINT_PATH: &str = "miEmpresa";

/// How the issuer reaches the OAuth2 token endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "url")]
pub enum ExchangeTransport {
	/// Call the token endpoint directly with HTTP Basic client authentication.
	#[default]
	Direct,
	/// Call a same-origin relay's `/api/auth` endpoint, which performs the exchange
	/// server-side. The URL points at that endpoint.
	Relay(Url),
}
impl ExchangeTransport {
	/// Returns the relay endpoint when the relay transport is configured.
	pub fn relay_endpoint(&self) -> Option<&Url> {
		match self {
			Self::Direct => None,
			Self::Relay(url) => Some(url),
		}
	}
}

/// Immutable service descriptor consumed by the broker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
	/// Base URL every resource endpoint is resolved against; always ends with `/`.
	pub api_base: Url,
	/// OAuth2 token endpoint used by the direct transport.
	pub token_endpoint: Url,
	/// Transport used by the issuer to obtain tokens.
	pub exchange: ExchangeTransport,
	/// Endpoint probed by the connection check.
	pub tenant_endpoint: String,
	/// Upper bound for every outbound HTTP call.
	pub timeout: Duration,
	/// Service-specific quirks.
	pub quirks: ServiceQuirks,
}
impl ServiceDescriptor {
	/// Creates a new builder for the provided API base.
	pub fn builder(api_base: Url) -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::new(api_base)
	}

	/// Descriptor for the production Xubio API using the direct token transport.
	pub fn xubio() -> Result<Self, ServiceDescriptorError> {
		let api_base = Url::parse(XUBIO_API_BASE).map_err(|e| ServiceDescriptorError::InvalidUrl {
			endpoint: "api_base",
			message: e.to_string(),
		})?;

		Self::builder(api_base).build()
	}

	/// Resolves a resource endpoint (`cliente`, `/presupuesto/12`, ...) against the API base.
	pub fn resolve(&self, endpoint: &str) -> Result<Url, ConfigError> {
		self.api_base.join(endpoint.trim_start_matches('/')).map_err(|source| {
			ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned(), source }
		})
	}

	/// Converts the configured timeout into the std representation HTTP clients expect.
	pub fn std_timeout(&self) -> std::time::Duration {
		self.timeout.try_into().unwrap_or(std::time::Duration::ZERO)
	}
}
