//! Connection probe and server-credential discovery.

// crates.io
use oauth2::http::{Method, Request, header::ACCEPT};
use serde::ser::SerializeMap;
// self
use crate::{
	_prelude::*,
	error::{ApiError, ConfigError, NormalizedError},
	flows::{Broker, RemoteRequest, common::describe_error_body},
	http::HttpTransport,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
};

/// Outcome of [`Broker::test_connection`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionStatus {
	/// Token issuance and the tenant call both succeeded.
	Connected {
		/// Tenant identity returned by the service (`miEmpresa`), when it sent a body.
		tenant: Option<JsonValue>,
	},
	/// Some stage failed; the error is already normalized for display.
	///
	/// Serializes as `{success: false, error: <message>}`.
	Failed {
		/// Normalized failure.
		error: NormalizedError,
	},
}
impl ConnectionStatus {
	/// Returns `true` for [`ConnectionStatus::Connected`].
	pub fn is_connected(&self) -> bool {
		matches!(self, Self::Connected { .. })
	}
}
impl Serialize for ConnectionStatus {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		let mut map = serializer.serialize_map(Some(2))?;

		match self {
			Self::Connected { tenant } => {
				map.serialize_entry("success", &true)?;
				map.serialize_entry("tenant", tenant)?;
			},
			Self::Failed { error } => {
				map.serialize_entry("success", &false)?;
				map.serialize_entry("error", &error.message)?;
			},
		}

		map.end()
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerCredentialsAdvert {
	#[serde(default)]
	has_server_credentials: bool,
}

impl<C, M> Broker<C, M>
where
	C: HttpTransport + ?Sized,
	M: TransportErrorMapper<C::TransportError> + ?Sized,
{
	/// Validates connectivity end to end by fetching the tenant identity.
	///
	/// Never fails: every error is folded into [`ConnectionStatus::Failed`].
	pub async fn test_connection(&self) -> ConnectionStatus {
		const KIND: FlowKind = FlowKind::ConnectionProbe;

		let request = RemoteRequest::get(self.descriptor.tenant_endpoint.clone());

		match obs::observe(KIND, "test_connection", self.call(request)).await {
			Ok(tenant) => ConnectionStatus::Connected { tenant },
			Err(e) => ConnectionStatus::Failed { error: e.normalized() },
		}
	}

	/// Asks the relay whether it holds a deployment-level credential pair.
	///
	/// Always `false` with the direct token transport, without touching the network. The relay
	/// only reports presence and never the values.
	pub async fn has_server_credentials(&self) -> Result<bool> {
		const KIND: FlowKind = FlowKind::ConnectionProbe;

		let Some(relay) = self.descriptor.exchange.relay_endpoint() else {
			return Ok(false);
		};
		obs::observe(KIND, "has_server_credentials", async move {
			let request = Request::builder()
				.method(Method::GET)
				.uri(relay.as_str())
				.header(ACCEPT, "application/json")
				.body(Vec::new())
				.map_err(ConfigError::from)?;
			let response = self.execute(KIND, request).await?;
			let status = response.status();

			if !status.is_success() {
				let (message, details) = describe_error_body(response.body());

				return Err(ApiError {
					endpoint: relay.path().to_owned(),
					status: status.as_u16(),
					message: message.unwrap_or_else(|| "Server credential check failed".into()),
					details,
				}
				.into());
			}

			let mut de = serde_json::Deserializer::from_slice(response.body());
			let advert: ServerCredentialsAdvert = serde_path_to_error::deserialize(&mut de)
				.map_err(|source| Error::Parse {
					endpoint: relay.path().to_owned(),
					status: status.as_u16(),
					source,
				})?;

			Ok(advert.has_server_credentials)
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn connection_status_serializes_as_success_flag() {
		let connected = ConnectionStatus::Connected {
			tenant: Some(serde_json::json!({ "nombre": "Acme SA" })),
		};
		let failed = ConnectionStatus::Failed {
			error: NormalizedError::new(401, "Error de autenticación", None),
		};

		assert_eq!(
			serde_json::to_value(&connected).expect("Connected status should serialize."),
			serde_json::json!({ "success": true, "tenant": { "nombre": "Acme SA" } })
		);
		assert_eq!(
			serde_json::to_value(&failed).expect("Failed status should serialize."),
			serde_json::json!({ "success": false, "error": "Error de autenticación" })
		);
		assert!(connected.is_connected());
		assert!(!failed.is_connected());
	}
}
