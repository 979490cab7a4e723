//! Relay error responses.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
// self
use crate::_prelude::*;

/// Error answered by relay handlers as `{error, details?}`.
#[derive(Debug)]
pub struct RelayError {
	status: StatusCode,
	message: String,
	details: Option<String>,
}
impl RelayError {
	/// Creates an error with an explicit status.
	pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into(), details: None }
	}

	/// `400 Bad Request`.
	pub fn bad_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, message)
	}

	/// `401 Unauthorized`.
	pub fn unauthorized(message: impl Into<String>) -> Self {
		Self::new(StatusCode::UNAUTHORIZED, message)
	}

	/// `404 Not Found`.
	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(StatusCode::NOT_FOUND, message)
	}

	/// Status the relay answers with.
	pub fn status(&self) -> StatusCode {
		self.status
	}
}
impl Display for RelayError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}", self.message)
	}
}
impl From<Error> for RelayError {
	fn from(value: Error) -> Self {
		let normalized = value.normalized();
		let status = StatusCode::from_u16(normalized.http_status)
			.ok()
			.filter(|status| status.is_client_error() || status.is_server_error())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		tracing::warn!(status = status.as_u16(), error = %value, "relay request failed");

		Self { status, message: normalized.message, details: normalized.details }
	}
}
impl IntoResponse for RelayError {
	fn into_response(self) -> Response {
		(self.status, Json(ErrorBody { error: self.message, details: self.details })).into_response()
	}
}

#[derive(Serialize)]
struct ErrorBody {
	error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<String>,
}
