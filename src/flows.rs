//! Broker facade plus the flows built on it: token issuance, authenticated calls, binary
//! downloads, and the connection probe.

pub mod common;
pub mod probe;
pub mod request;

mod client_credentials;

pub use common::*;
pub use probe::*;
pub use request::*;

// crates.io
use oauth2::{AsyncHttpClient, HttpRequest, HttpResponse};
// self
use crate::{
	_prelude::*,
	http::HttpTransport,
	oauth::TransportErrorMapper,
	obs::FlowKind,
	provider::{DirectUrl, ServiceDescriptor, UrlRewrite},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Coordinates token issuance and authenticated calls against a single service descriptor.
///
/// The broker owns the HTTP transport, the credential store, the descriptor, and the URL
/// rewrite strategy so individual flows only deal with request shapes and status handling.
/// Clones share the store and the issuance guard, so every clone observes the same cached
/// token and concurrent callers never trigger more than one exchange at a time.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Store holding the credential pair and the cached token.
	pub store: Arc<CredentialStore>,
	/// Descriptor that defines endpoints, token transport, and quirks.
	pub descriptor: ServiceDescriptor,
	/// Rewrite applied to resource URLs right before they are sent.
	pub rewrite: Arc<dyn UrlRewrite>,
	issuance_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<CredentialStore>,
		descriptor: ServiceDescriptor,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			rewrite: Arc::new(DirectUrl),
			issuance_guard: Default::default(),
		}
	}

	/// Replaces the URL rewrite strategy (for example a CORS relay prefix).
	pub fn with_url_rewrite(mut self, rewrite: Arc<dyn UrlRewrite>) -> Self {
		self.rewrite = rewrite;

		self
	}

	/// Sends one request through the transport, mapping transport failures for `kind`.
	pub(crate) async fn execute(&self, kind: FlowKind, request: HttpRequest) -> Result<HttpResponse> {
		let handle = self.http_client.handle();

		handle.call(request).await.map_err(|e| self.transport_mapper.map_transport_error(kind, e))
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new broker for the provided store and descriptor.
	///
	/// The broker provisions its own reqwest-backed transport bounded by the descriptor's
	/// timeout so callers do not need to pass HTTP handles explicitly.
	pub fn new(store: Arc<CredentialStore>, descriptor: ServiceDescriptor) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(descriptor.std_timeout())?;

		Ok(Self::with_http_client(store, descriptor, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("store", &self.store)
			.finish()
	}
}
