//! Broker-level error types shared across the issuer, executor, stores, and relay.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem; never retried automatically.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token exchange rejected the credentials or could not complete.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Resource call failed after a valid token was obtained.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Success-status response whose body is not valid JSON.
	#[error("Endpoint `{endpoint}` returned a body that is not valid JSON.")]
	Parse {
		/// Endpoint path that produced the body.
		endpoint: String,
		/// HTTP status code of the offending response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// Transport failure (DNS, TCP, TLS, timeout) while calling a resource endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Collapses the error into the uniform `{httpStatus, message, details?}` shape shown to
	/// users and returned by the relay.
	pub fn normalized(&self) -> NormalizedError {
		match self {
			Self::Auth(AuthError::Rejected { status, message, details }) =>
				NormalizedError::new(*status, message.clone(), details.clone()),
			Self::Auth(err) => NormalizedError::new(500, err.to_string(), source_details(err)),
			Self::Api(ApiError { status, message, details, .. }) =>
				NormalizedError::new(*status, message.clone(), details.clone()),
			Self::Config(err) => NormalizedError::new(err.status(), err.to_string(), None),
			Self::Parse { source, .. } =>
				NormalizedError::new(500, self.to_string(), Some(source.to_string())),
			Self::Transport(err) => NormalizedError::new(500, err.to_string(), source_details(err)),
			Self::Storage(err) => NormalizedError::new(500, err.to_string(), None),
		}
	}

	/// Returns `true` when the failure requires the user to supply configuration.
	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::Config(_))
	}
}

/// Uniform failure description derived from any [`Error`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
	/// HTTP status associated with the failure.
	pub http_status: u16,
	/// Human-readable message.
	pub message: String,
	/// Optional diagnostic payload (upstream body text, parser position, etc.).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
}
impl NormalizedError {
	/// Builds a normalized error from its parts.
	pub fn new(http_status: u16, message: impl Into<String>, details: Option<String>) -> Self {
		Self { http_status, message: message.into(), details }
	}
}
impl Display for NormalizedError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.details {
			Some(details) => write!(f, "{} (HTTP {}): {details}", self.message, self.http_status),
			None => write!(f, "{} (HTTP {})", self.message, self.http_status),
		}
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No credential pair has been saved and no server pair was requested.
	#[error("No credentials are configured.")]
	NoCredentials,
	/// A credential field was empty or whitespace.
	#[error("The {field} credential field cannot be empty.")]
	EmptyCredential {
		/// Name of the offending field.
		field: &'static str,
	},
	/// Server-side credentials can only be used through the relay token transport.
	#[error("Server credentials are only reachable through the relay token transport.")]
	ServerCredentialsRequireRelay,
	/// Cached token builder validation failed.
	#[error("Unable to build cached token.")]
	TokenBuild(#[from] crate::auth::CachedTokenBuilderError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Endpoint path cannot be joined onto the service base URL.
	#[error("Endpoint `{endpoint}` is not a valid path.")]
	InvalidEndpoint {
		/// Endpoint path that failed to resolve.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// HTTP status for the failure: `400` for problems with caller-supplied credentials and
	/// `500` for broker-side setup faults.
	pub fn status(&self) -> u16 {
		match self {
			Self::NoCredentials | Self::EmptyCredential { .. } | Self::ServerCredentialsRequireRelay =>
				400,
			Self::TokenBuild(_)
			| Self::HttpClientBuild { .. }
			| Self::HttpRequest(_)
			| Self::InvalidEndpoint { .. } => 500,
		}
	}

	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token exchange failures.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint answered with a non-success status.
	#[error("Authentication failed with HTTP {status}: {message}.")]
	Rejected {
		/// HTTP status code returned by the token endpoint.
		status: u16,
		/// Best-effort message extracted from the response.
		message: String,
		/// Raw response body for diagnostics.
		details: Option<String>,
	},
	/// Token endpoint could not be reached.
	#[error("Token endpoint could not be reached.")]
	Unreachable(#[source] TransportError),
	/// Token endpoint answered with success but the payload is not a token response.
	#[error("Token endpoint returned a malformed token response.")]
	MalformedResponse {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
}

/// Resource call failure carrying the remote status and best-effort message.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Request to `{endpoint}` failed with HTTP {status}: {message}.")]
pub struct ApiError {
	/// Endpoint path that failed.
	pub endpoint: String,
	/// HTTP status code returned by the remote service.
	pub status: u16,
	/// Message extracted from the error body.
	pub message: String,
	/// Raw error body, when it carried more than the message.
	pub details: Option<String>,
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request to the remote service timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote service.")]
	Io(#[from] std::io::Error),
	/// Transport failure described only by a message.
	#[error("HTTP client error occurred while calling the remote service: {0}.")]
	Other(String),
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

fn source_details(err: &dyn std::error::Error) -> Option<String> {
	err.source().map(|source| source.to_string())
}
