// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};
// crates.io
use url::Url;
// self
use xubio_broker::{
	error::{AuthError, Error, TransportError},
	flows::{Broker, RemoteRequest},
	http::HttpTransport,
	obs::FlowKind,
	oauth::{
		TransportErrorMapper,
		oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse},
		transport_failure,
	},
	provider::ServiceDescriptor,
	store::{CredentialStore, MemoryStore},
};

#[derive(Debug)]
enum FakeTransportError {
	ConnectionReset,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::ConnectionReset => write!(f, "Connection reset by peer."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy, Default)]
struct FailingHttpClient;
impl HttpTransport for FailingHttpClient {
	type Handle = FailingHttpHandle;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		FailingHttpHandle
	}
}

struct FailingHttpHandle;
impl<'a> AsyncHttpClient<'a> for FailingHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, _request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			Err(HttpClientError::Reqwest(Box::new(FakeTransportError::ConnectionReset)))
		})
	}
}

#[derive(Clone, Default)]
struct RecordingTransportErrorMapper {
	kinds: Arc<Mutex<Vec<FlowKind>>>,
}
impl RecordingTransportErrorMapper {
	fn recorded(&self) -> Vec<FlowKind> {
		self.kinds.lock().expect("Recorder lock should not be poisoned.").clone()
	}
}
impl TransportErrorMapper<FakeTransportError> for RecordingTransportErrorMapper {
	fn map_transport_error(
		&self,
		kind: FlowKind,
		error: HttpClientError<FakeTransportError>,
	) -> Error {
		self.kinds.lock().expect("Recorder lock should not be poisoned.").push(kind);

		transport_failure(kind, TransportError::network(error))
	}
}

fn fake_broker(
	mapper: RecordingTransportErrorMapper,
) -> (Broker<FailingHttpClient, RecordingTransportErrorMapper>, Arc<CredentialStore>) {
	let descriptor = ServiceDescriptor::builder(
		Url::parse("https://xubio.example.com/API/1.1/").expect("Fixture URL should parse."),
	)
	.build()
	.expect("Fixture descriptor should build.");
	let store = Arc::new(CredentialStore::new(Arc::new(MemoryStore::default())));
	let broker = Broker::with_http_client(store.clone(), descriptor, FailingHttpClient, mapper);

	(broker, store)
}

#[tokio::test]
async fn token_exchange_transport_failures_become_auth_errors() {
	let mapper = RecordingTransportErrorMapper::default();
	let (broker, store) = fake_broker(mapper.clone());

	store.save_credentials("id1", "sec1").await.expect("Credential save should succeed.");

	let err = broker.access_token().await.expect_err("Failing transport should fail issuance.");

	assert!(matches!(err, Error::Auth(AuthError::Unreachable(TransportError::Network { .. }))));
	assert_eq!(mapper.recorded(), vec![FlowKind::TokenExchange]);
}

#[tokio::test]
async fn resource_transport_failures_stay_transport_errors() {
	let mapper = RecordingTransportErrorMapper::default();
	let (broker, store) = fake_broker(mapper.clone());

	store.store_token("tok", "Bearer", 3600).await.expect("Token store should succeed.");

	let err = broker
		.call(RemoteRequest::get("clienteBean"))
		.await
		.expect_err("Failing transport should fail the call.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(err.normalized().http_status, 500);
	assert_eq!(mapper.recorded(), vec![FlowKind::ApiCall]);
}
