//! The long-lived client identifier/secret pair exchanged for bearer tokens.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::Secret, error::ConfigError};

/// Client identifier/secret pair; exactly one is active at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret; redacted in formatting output.
	pub secret_id: Secret,
	/// Instant the pair was saved.
	#[serde(with = "time::serde::rfc3339")]
	pub saved_at: OffsetDateTime,
}
impl CredentialPair {
	/// Validates both fields and stamps `saved_at` with the current clock.
	pub fn new(client_id: impl Into<String>, secret_id: impl Into<String>) -> Result<Self> {
		let client_id = client_id.into();
		let secret_id = Secret::new(secret_id);

		if client_id.trim().is_empty() {
			return Err(ConfigError::EmptyCredential { field: "clientId" }.into());
		}
		if secret_id.is_blank() {
			return Err(ConfigError::EmptyCredential { field: "secretId" }.into());
		}

		Ok(Self { client_id, secret_id, saved_at: OffsetDateTime::now_utc() })
	}

	/// Renders the `Authorization: Basic` value for `clientId:secretId`.
	pub fn basic_authorization(&self) -> String {
		let raw = format!("{}:{}", self.client_id, self.secret_id.expose());

		format!("Basic {}", STANDARD.encode(raw))
	}
}
