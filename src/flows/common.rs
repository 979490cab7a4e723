//! Shared helpers for flow implementations (token request options, error-body parsing).

// self
use crate::{_prelude::*, auth::CachedTokenBuilderError, error::ConfigError};

/// Options evaluated by [`Broker::access_token_with`](crate::flows::Broker::access_token_with).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenRequest {
	/// Bypasses the cached token when true.
	pub force: bool,
	/// Asks the relay to use its deployment-level credential pair.
	pub prefer_server_credentials: bool,
}
impl TokenRequest {
	/// Creates a request that honors the cache and uses the saved credential pair.
	pub fn new() -> Self {
		Self::default()
	}

	/// Forces the broker to bypass cache checks.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}

	/// Overrides the server-credentials preference.
	pub fn with_server_credentials(mut self, prefer: bool) -> Self {
		self.prefer_server_credentials = prefer;

		self
	}
}

/// Extracts `(message, details)` from an error body.
///
/// JSON bodies contribute their `error_description`, `message`, or `error` string as the
/// message and either their `details` field or the full text as details. Non-JSON bodies
/// become the message verbatim. Blank bodies yield `(None, None)`.
pub(crate) fn describe_error_body(body: &[u8]) -> (Option<String>, Option<String>) {
	let text = String::from_utf8_lossy(body).trim().to_owned();

	if text.is_empty() {
		return (None, None);
	}

	match serde_json::from_str::<JsonValue>(&text) {
		Ok(JsonValue::Object(map)) => {
			let message = ["error_description", "message", "error"]
				.iter()
				.find_map(|key| map.get(*key).and_then(JsonValue::as_str))
				.filter(|value| !value.trim().is_empty())
				.map(str::to_owned);
			let details = match map.get("details") {
				Some(JsonValue::String(details)) => details.clone(),
				Some(other) => other.to_string(),
				None => text,
			};

			(message, Some(details))
		},
		Ok(_) => (None, Some(text)),
		Err(_) => (Some(text.clone()), Some(text)),
	}
}

/// Normalizes token builder errors into broker errors.
pub(crate) fn map_token_builder_error(err: CachedTokenBuilderError) -> Error {
	ConfigError::from(err).into()
}
