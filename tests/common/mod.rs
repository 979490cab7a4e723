#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::{Mock, prelude::*};
use url::Url;
// self
use xubio_broker::{
	flows::ReqwestBroker,
	provider::{ExchangeTransport, ServiceDescriptor},
	store::{CredentialStore, MemoryStore},
};

pub const CLIENT_ID: &str = "id1";
pub const SECRET_ID: &str = "sec1";
/// `Basic base64("id1:sec1")`.
pub const BASIC_ID1_SEC1: &str = "Basic aWQxOnNlYzE=";

/// Descriptor whose API base and token endpoint live on the mock server.
pub fn descriptor(server: &MockServer) -> ServiceDescriptor {
	ServiceDescriptor::builder(
		Url::parse(&server.base_url()).expect("Mock base URL should parse successfully."),
	)
	.build()
	.expect("Test descriptor should build successfully.")
}

/// Descriptor that exchanges tokens through a relay mounted on the mock server.
pub fn relay_descriptor(server: &MockServer) -> ServiceDescriptor {
	let relay =
		Url::parse(&server.url("/api/auth")).expect("Mock relay endpoint should parse successfully.");

	ServiceDescriptor::builder(
		Url::parse(&server.base_url()).expect("Mock base URL should parse successfully."),
	)
	.exchange_transport(ExchangeTransport::Relay(relay))
	.build()
	.expect("Relay descriptor should build successfully.")
}

/// Broker over an in-memory credential store.
pub fn broker(descriptor: ServiceDescriptor) -> (ReqwestBroker, Arc<CredentialStore>) {
	let store = Arc::new(CredentialStore::new(Arc::new(MemoryStore::default())));
	let broker = ReqwestBroker::new(store.clone(), descriptor)
		.expect("Reqwest test broker should build successfully.");

	(broker, store)
}

/// Broker with `id1`/`sec1` already saved.
pub async fn broker_with_credentials(
	descriptor: ServiceDescriptor,
) -> (ReqwestBroker, Arc<CredentialStore>) {
	let (broker, store) = broker(descriptor);

	store.save_credentials(CLIENT_ID, SECRET_ID).await.expect("Credential save should succeed.");

	(broker, store)
}

/// Mocks a successful direct token exchange for `id1`/`sec1`.
pub async fn mock_token<'a>(server: &'a MockServer, token: &str, expires_in: i64) -> Mock<'a> {
	let body = format!(
		"{{\"access_token\":\"{token}\",\"token_type\":\"Bearer\",\"expires_in\":{expires_in}}}"
	);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/TokenEndpoint")
				.header("authorization", BASIC_ID1_SEC1)
				.header("content-type", "application/x-www-form-urlencoded")
				.body("grant_type=client_credentials");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}
