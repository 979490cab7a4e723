//! Same-origin relay for the Xubio API.

// std
use std::net::SocketAddr;
// crates.io
use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use url::Url;
// self
use xubio_broker::{
	auth::CredentialPair,
	provider::{ServiceDescriptor, XUBIO_API_BASE},
	relay::{self, RelayConfig, RelayState},
};

#[derive(Debug, Parser)]
#[command(version, about = "Same-origin relay for the Xubio API.")]
struct Args {
	/// Address the relay listens on.
	#[arg(long, env = "RELAY_BIND", default_value = "127.0.0.1:3000")]
	bind: SocketAddr,
	/// Base URL of the Xubio API.
	#[arg(long, env = "XUBIO_API", default_value = XUBIO_API_BASE)]
	api_base: Url,
	/// Deployment-level client identifier.
	#[arg(long, env = "XUBIO_CLIENT_ID", requires = "secret_id")]
	client_id: Option<String>,
	/// Deployment-level client secret.
	#[arg(long, env = "XUBIO_SECRET_ID", hide_env_values = true, requires = "client_id")]
	secret_id: Option<String>,
	/// Upstream request timeout in seconds.
	#[arg(long, env = "XUBIO_TIMEOUT_SECS", default_value_t = 30)]
	timeout_secs: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	init_tracing();

	let args = Args::parse();
	let descriptor = ServiceDescriptor::builder(args.api_base)
		.timeout(time::Duration::seconds(args.timeout_secs))
		.build()
		.wrap_err("invalid upstream configuration")?;
	let mut config = RelayConfig::default();

	if let (Some(client_id), Some(secret_id)) = (args.client_id, args.secret_id) {
		config = config.with_server_credentials(
			CredentialPair::new(client_id, secret_id).wrap_err("invalid server credentials")?,
		);
	}

	tracing::info!(
		api_base = %descriptor.api_base,
		server_credentials = config.server_credentials.is_some(),
		"starting relay"
	);

	let state = RelayState::new(descriptor, config)?;
	let listener =
		TcpListener::bind(args.bind).await.wrap_err_with(|| format!("failed to bind {}", args.bind))?;

	relay::serve(listener, relay::router(state)).await?;

	Ok(())
}

fn init_tracing() {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xubio_broker=info,info"));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
