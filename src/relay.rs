//! Same-origin relay server.
//!
//! The relay lets browser clients reach Xubio without exposing the deployment's credential
//! pair or tripping CORS: it exchanges credentials at `POST /api/auth`, advertises whether it
//! holds a server-side pair at `GET /api/auth`, and forwards bearer-authenticated resource
//! calls and PDF downloads. Every failure answers `{error, details?}` with the normalized
//! status of the underlying broker error.

pub mod error;
pub mod handlers;

pub use error::RelayError;

// crates.io
use axum::{
	Router,
	routing::{get, post},
};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	auth::CredentialPair,
	flows::ReqwestBroker,
	provider::ServiceDescriptor,
	resources::ResourceRoutes,
	store::{CredentialStore, MemoryStore},
};

/// Deployment-level relay configuration.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// Credential pair used when a client asks for server credentials.
	pub server_credentials: Option<CredentialPair>,
	/// Public resource names and the endpoints they forward to.
	pub routes: ResourceRoutes,
}
impl RelayConfig {
	/// Attaches the deployment-level credential pair.
	pub fn with_server_credentials(mut self, pair: CredentialPair) -> Self {
		self.server_credentials = Some(pair);

		self
	}

	/// Replaces the resource routes.
	pub fn with_routes(mut self, routes: ResourceRoutes) -> Self {
		self.routes = routes;

		self
	}
}
impl Default for RelayConfig {
	fn default() -> Self {
		Self { server_credentials: None, routes: ResourceRoutes::xubio() }
	}
}

/// Shared state handed to every relay handler.
#[derive(Clone, Debug)]
pub struct RelayState {
	/// Broker performing upstream calls; its own credential store stays empty.
	pub broker: Arc<ReqwestBroker>,
	/// Relay configuration.
	pub config: Arc<RelayConfig>,
}
impl RelayState {
	/// Builds relay state for `descriptor`.
	pub fn new(descriptor: ServiceDescriptor, config: RelayConfig) -> Result<Self> {
		let store = Arc::new(CredentialStore::new(Arc::new(MemoryStore::default())));
		let broker = ReqwestBroker::new(store, descriptor)?;

		Ok(Self { broker: Arc::new(broker), config: Arc::new(config) })
	}
}

/// Builds the relay router.
pub fn router(state: RelayState) -> Router {
	Router::new()
		.route("/api/auth", post(handlers::exchange_token).get(handlers::server_credentials))
		.route("/api/pdf/{id}", get(handlers::presupuesto_pdf))
		.route("/api/{resource}", get(handlers::list_resource).post(handlers::create_resource))
		.route(
			"/api/{resource}/{id}",
			get(handlers::get_resource).delete(handlers::delete_resource),
		)
		.with_state(state)
}

/// Serves `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
	if let Ok(addr) = listener.local_addr() {
		tracing::info!(%addr, "relay listening");
	}

	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::warn!(error = %e, "failed to listen for shutdown signal");
	}

	tracing::info!("relay shutting down");
}
