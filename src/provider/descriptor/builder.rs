// self
use crate::{
	_prelude::*,
	provider::{
		ExchangeTransport, FallbackRoutes, ServiceDescriptor, ServiceQuirks, TENANT_ENDPOINT_PATH,
		TOKEN_ENDPOINT_PATH,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ServiceDescriptorError {
	/// A URL could not be parsed or joined.
	#[error("The {endpoint} URL is invalid: {message}.")]
	InvalidUrl {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Parser message.
		message: String,
	},
	/// The API base cannot carry relative paths.
	#[error("The API base must be a hierarchical URL: {url}.")]
	CannotBeABase {
		/// API base that failed validation.
		url: String,
	},
	/// Endpoints must use HTTPS unless they point at the loopback interface.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The tenant identity endpoint is empty.
	#[error("Tenant endpoint cannot be empty.")]
	EmptyTenantEndpoint,
	/// Timeouts must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// A fallback route points back at itself and would loop.
	#[error("Fallback route `{primary}` cannot point at itself.")]
	SelfReferentialFallback {
		/// Offending primary segment.
		primary: String,
	},
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug)]
pub struct ServiceDescriptorBuilder {
	/// API base the descriptor resolves endpoints against.
	pub api_base: Url,
	/// Token endpoint override; defaults to `{api_base}/TokenEndpoint`.
	pub token_endpoint: Option<Url>,
	/// Token exchange transport.
	pub exchange: ExchangeTransport,
	/// Tenant identity endpoint.
	pub tenant_endpoint: String,
	/// Request timeout.
	pub timeout: Duration,
	/// Service-specific quirks.
	pub quirks: ServiceQuirks,
}
impl ServiceDescriptorBuilder {
	const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a new builder seeded with the provided API base.
	pub fn new(api_base: Url) -> Self {
		Self {
			api_base,
			token_endpoint: None,
			exchange: ExchangeTransport::default(),
			tenant_endpoint: TENANT_ENDPOINT_PATH.into(),
			timeout: Self::DEFAULT_TIMEOUT,
			quirks: ServiceQuirks::default(),
		}
	}

	/// Overrides the token endpoint (`/login` on some deployments).
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Selects the token exchange transport.
	pub fn exchange_transport(mut self, transport: ExchangeTransport) -> Self {
		self.exchange = transport;

		self
	}

	/// Overrides the endpoint probed by the connection check.
	pub fn tenant_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.tenant_endpoint = endpoint.into();

		self
	}

	/// Overrides the request timeout (defaults to 30 seconds).
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Adds a single fallback route.
	pub fn fallback_route(mut self, primary: impl Into<String>, alternate: impl Into<String>) -> Self {
		self.quirks.fallback_routes = self.quirks.fallback_routes.with_route(primary, alternate);

		self
	}

	/// Replaces the fallback table.
	pub fn fallback_routes(mut self, routes: FallbackRoutes) -> Self {
		self.quirks.fallback_routes = routes;

		self
	}

	/// Overrides the service quirks.
	pub fn quirks(mut self, quirks: ServiceQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, ServiceDescriptorError> {
		if self.api_base.cannot_be_a_base() {
			return Err(ServiceDescriptorError::CannotBeABase { url: self.api_base.to_string() });
		}

		let mut api_base = self.api_base;

		if !api_base.path().ends_with('/') {
			let path = format!("{}/", api_base.path());

			api_base.set_path(&path);
		}

		let token_endpoint = match self.token_endpoint {
			Some(url) => url,
			None => api_base.join(TOKEN_ENDPOINT_PATH).map_err(|e| {
				ServiceDescriptorError::InvalidUrl { endpoint: "token", message: e.to_string() }
			})?,
		};
		let descriptor = ServiceDescriptor {
			api_base,
			token_endpoint,
			exchange: self.exchange,
			tenant_endpoint: self.tenant_endpoint,
			timeout: self.timeout,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ServiceDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ServiceDescriptorError> {
		if self.tenant_endpoint.trim_matches('/').is_empty() {
			return Err(ServiceDescriptorError::EmptyTenantEndpoint);
		}
		if !self.timeout.is_positive() {
			return Err(ServiceDescriptorError::NonPositiveTimeout);
		}

		validate_endpoint("api_base", &self.api_base)?;
		validate_endpoint("token", &self.token_endpoint)?;

		if let Some(relay) = self.exchange.relay_endpoint() {
			validate_endpoint("relay", relay)?;
		}

		for (primary, alternate) in self.quirks.fallback_routes.iter() {
			if primary == alternate {
				return Err(ServiceDescriptorError::SelfReferentialFallback {
					primary: primary.to_owned(),
				});
			}
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ServiceDescriptorError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(ServiceDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}
