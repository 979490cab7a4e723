//! Relay request handlers.

// crates.io
use axum::{
	Json,
	body::Bytes,
	extract::{Path, State},
	http::{
		HeaderMap, HeaderValue, StatusCode,
		header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
	},
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Secret},
	flows::RemoteRequest,
	http::is_blank_body,
	oauth::{AuthExchangeRequest, TokenResponse},
	obs::{self, FlowKind},
	relay::{RelayError, RelayState},
	resources::{IMPRIMIR_PDF_ENDPOINT, PRESUPUESTOS_ENDPOINT, presupuesto_pdf_filename},
};

type RelayResult<T> = std::result::Result<T, RelayError>;

/// `POST /api/auth`: exchanges a credential pair for a token.
///
/// With `useServerCredentials` and a configured deployment pair, the deployment pair is used
/// and the body's pair is ignored.
pub async fn exchange_token(
	State(state): State<RelayState>,
	body: Bytes,
) -> RelayResult<Json<TokenResponse>> {
	let request: AuthExchangeRequest = if is_blank_body(&body) {
		AuthExchangeRequest::default()
	} else {
		serde_json::from_slice(&body)
			.map_err(|_| RelayError::bad_request("Request body must be valid JSON"))?
	};
	let pair = match (&state.config.server_credentials, request.use_server_credentials) {
		(Some(server), true) => server.clone(),
		_ => CredentialPair::new(request.client_id, request.secret_id)
			.map_err(|_| RelayError::bad_request("clientId and secretId are required"))?,
	};
	let token = forward("exchange_token", state.broker.exchange_credentials(&pair)).await?;

	Ok(Json(token.with_defaults()))
}

/// `GET /api/auth`: reports whether a deployment pair is configured, never its values.
pub async fn server_credentials(State(state): State<RelayState>) -> Json<JsonValue> {
	Json(serde_json::json!({
		"hasServerCredentials": state.config.server_credentials.is_some(),
	}))
}

/// `GET /api/{resource}`.
pub async fn list_resource(
	State(state): State<RelayState>,
	Path(resource): Path<String>,
	headers: HeaderMap,
) -> RelayResult<Response> {
	let token = bearer(&headers)?;
	let endpoint = route(&state, &resource)?;
	let value = forward(
		"list_resource",
		state.broker.call_with_token(&token, RemoteRequest::get(endpoint)),
	)
	.await?;

	Ok(json_or_no_content(StatusCode::OK, value))
}

/// `POST /api/{resource}`: answers `201` with the created record.
pub async fn create_resource(
	State(state): State<RelayState>,
	Path(resource): Path<String>,
	headers: HeaderMap,
	body: Bytes,
) -> RelayResult<Response> {
	let token = bearer(&headers)?;
	let endpoint = route(&state, &resource)?;
	let payload: JsonValue = serde_json::from_slice(&body)
		.map_err(|_| RelayError::bad_request("Request body must be valid JSON"))?;
	let value = forward(
		"create_resource",
		state.broker.call_with_token(&token, RemoteRequest::post(endpoint, payload)),
	)
	.await?;

	Ok(json_or_no_content(StatusCode::CREATED, value))
}

/// `GET /api/{resource}/{id}`.
pub async fn get_resource(
	State(state): State<RelayState>,
	Path((resource, id)): Path<(String, String)>,
	headers: HeaderMap,
) -> RelayResult<Response> {
	let token = bearer(&headers)?;
	let endpoint = route(&state, &resource)?;
	let id = identifier(&id)?;
	let value = forward(
		"get_resource",
		state.broker.call_with_token(&token, RemoteRequest::get(format!("{endpoint}/{id}"))),
	)
	.await?;

	Ok(json_or_no_content(StatusCode::OK, value))
}

/// `DELETE /api/{resource}/{id}`: answers `{success: true, message}`.
pub async fn delete_resource(
	State(state): State<RelayState>,
	Path((resource, id)): Path<(String, String)>,
	headers: HeaderMap,
) -> RelayResult<Json<JsonValue>> {
	let token = bearer(&headers)?;
	let endpoint = route(&state, &resource)?;
	let id = identifier(&id)?;

	forward(
		"delete_resource",
		state.broker.call_with_token(&token, RemoteRequest::delete(format!("{endpoint}/{id}"))),
	)
	.await?;

	Ok(Json(serde_json::json!({
		"success": true,
		"message": format!("Deleted {resource}/{id}"),
	})))
}

/// `GET /api/pdf/{id}`: streams the quote PDF as an attachment.
pub async fn presupuesto_pdf(
	State(state): State<RelayState>,
	Path(id): Path<String>,
	headers: HeaderMap,
) -> RelayResult<Response> {
	let token = bearer(&headers)?;
	let id = identifier(&id)?;
	let endpoint = format!("{IMPRIMIR_PDF_ENDPOINT}/{PRESUPUESTOS_ENDPOINT}/{id}");
	let download =
		forward("presupuesto_pdf", state.broker.download_with_token(&token, &endpoint)).await?;
	let disposition = HeaderValue::from_str(&format!(
		"attachment; filename={}",
		presupuesto_pdf_filename(id)
	))
	.map_err(|_| RelayError::bad_request("Invalid identifier"))?;

	Ok((
		[(CONTENT_TYPE, HeaderValue::from_static("application/pdf")), (CONTENT_DISPOSITION, disposition)],
		download.bytes,
	)
		.into_response())
}

async fn forward<F, T>(stage: &'static str, fut: F) -> RelayResult<T>
where
	F: Future<Output = Result<T>>,
{
	obs::observe(FlowKind::RelayForward, stage, fut).await.map_err(RelayError::from)
}

fn bearer(headers: &HeaderMap) -> RelayResult<Secret> {
	headers
		.get(AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(Secret::new)
		.ok_or_else(|| RelayError::unauthorized("Missing bearer token"))
}

fn route<'a>(state: &'a RelayState, resource: &str) -> RelayResult<&'a str> {
	state
		.config
		.routes
		.endpoint_for(resource)
		.ok_or_else(|| RelayError::not_found(format!("Unknown resource `{resource}`")))
}

fn identifier(id: &str) -> RelayResult<&str> {
	let valid = !id.is_empty()
		&& id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

	if valid { Ok(id) } else { Err(RelayError::bad_request("Invalid identifier")) }
}

fn json_or_no_content(status: StatusCode, value: Option<JsonValue>) -> Response {
	match value {
		Some(value) => (status, Json(value)).into_response(),
		None if status == StatusCode::OK => StatusCode::NO_CONTENT.into_response(),
		None => status.into_response(),
	}
}
