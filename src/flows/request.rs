//! Authenticated resource calls and binary downloads.
//!
//! Every call attaches `Authorization: Bearer <token>` plus JSON content headers, lets caller
//! headers override those defaults, resolves the endpoint against the descriptor's API base,
//! and passes the URL through the broker's [`UrlRewrite`](crate::provider::UrlRewrite). A `404`
//! on a path with a configured fallback route is retried exactly once on the alternate path;
//! other failure statuses are reported as they are. There is no mid-request token retry.

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode,
		header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::{ApiError, ConfigError},
	flows::{Broker, common::describe_error_body},
	http::{self, HttpTransport},
	oauth::TransportErrorMapper,
	obs::{self, FlowKind},
};

/// HTTP verbs supported by resource calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`.
	#[default]
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `DELETE`.
	Delete,
}
impl HttpMethod {
	/// Returns the verb as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}

	fn as_method(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
			Self::Delete => Method::DELETE,
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One call against a resource endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
	/// Path relative to the API base (`clienteBean`, `presupuesto/42`, ...).
	pub endpoint: String,
	/// HTTP verb.
	pub method: HttpMethod,
	/// JSON payload sent as the request body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub body: Option<JsonValue>,
	/// Extra headers; they override the broker's defaults on collision.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub headers: BTreeMap<String, String>,
}
impl RemoteRequest {
	/// Creates a request for `endpoint` with the given verb.
	pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
		Self { endpoint: endpoint.into(), method, ..Default::default() }
	}

	/// `GET {endpoint}`.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self::new(HttpMethod::Get, endpoint)
	}

	/// `POST {endpoint}` with a JSON body.
	pub fn post(endpoint: impl Into<String>, body: JsonValue) -> Self {
		Self::new(HttpMethod::Post, endpoint).with_body(body)
	}

	/// `PUT {endpoint}` with a JSON body.
	pub fn put(endpoint: impl Into<String>, body: JsonValue) -> Self {
		Self::new(HttpMethod::Put, endpoint).with_body(body)
	}

	/// `DELETE {endpoint}`.
	pub fn delete(endpoint: impl Into<String>) -> Self {
		Self::new(HttpMethod::Delete, endpoint)
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}
}

/// Binary payload returned by [`Broker::download`].
#[derive(Clone, PartialEq, Eq)]
pub struct Download {
	/// Raw response body.
	pub bytes: Vec<u8>,
	/// `Content-Type` reported by the service.
	pub content_type: Option<String>,
	/// File name advertised through `Content-Disposition`.
	pub filename: Option<String>,
}
impl Debug for Download {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Download")
			.field("len", &self.bytes.len())
			.field("content_type", &self.content_type)
			.field("filename", &self.filename)
			.finish()
	}
}

impl<C, M> Broker<C, M>
where
	C: HttpTransport + ?Sized,
	M: TransportErrorMapper<C::TransportError> + ?Sized,
{
	/// Performs an authenticated call and decodes the JSON response.
	///
	/// Returns `None` when the service answers a success status with an empty body.
	pub async fn call(&self, request: RemoteRequest) -> Result<Option<JsonValue>> {
		let token = self.access_token().await?;

		self.call_with_token(&token, request).await
	}

	/// Same as [`Broker::call`] but with a bearer token supplied by the caller.
	///
	/// The relay forwards browser-held tokens through this entry point.
	pub async fn call_with_token(
		&self,
		token: &Secret,
		request: RemoteRequest,
	) -> Result<Option<JsonValue>> {
		const KIND: FlowKind = FlowKind::ApiCall;

		obs::observe(KIND, "call", async move {
			let (endpoint, response) = self.send_with_fallback(KIND, token, &request).await?;

			decode_json(&endpoint, response)
		})
		.await
	}

	/// Downloads a binary payload (for example a quote PDF) from `endpoint`.
	pub async fn download(&self, endpoint: &str) -> Result<Download> {
		let token = self.access_token().await?;

		self.download_with_token(&token, endpoint).await
	}

	/// Same as [`Broker::download`] but with a bearer token supplied by the caller.
	pub async fn download_with_token(&self, token: &Secret, endpoint: &str) -> Result<Download> {
		const KIND: FlowKind = FlowKind::Download;

		obs::observe(KIND, "download", async move {
			let request = RemoteRequest::get(endpoint).with_header(ACCEPT.as_str(), "*/*");
			let (_, response) = self.send_with_fallback(KIND, token, &request).await?;

			Ok(Download {
				content_type: http::header_text(&response, CONTENT_TYPE),
				filename: http::header_text(&response, CONTENT_DISPOSITION)
					.as_deref()
					.and_then(disposition_filename),
				bytes: response.into_body(),
			})
		})
		.await
	}

	/// Sends `request`, retrying once on the fallback route when the primary answers `404`.
	///
	/// Returns the endpoint that produced the final response together with that response,
	/// which is guaranteed to carry a success status.
	async fn send_with_fallback(
		&self,
		kind: FlowKind,
		token: &Secret,
		request: &RemoteRequest,
	) -> Result<(String, HttpResponse)> {
		let response = self.send(kind, token, request, &request.endpoint).await?;

		if response.status() == StatusCode::NOT_FOUND {
			if let Some(alternate) =
				self.descriptor.quirks.fallback_routes.alternate_for(&request.endpoint)
			{
				let response = self.send(kind, token, request, &alternate).await?;

				return ensure_success(&alternate, response).map(|response| (alternate, response));
			}
		}

		ensure_success(&request.endpoint, response)
			.map(|response| (request.endpoint.clone(), response))
	}

	async fn send(
		&self,
		kind: FlowKind,
		token: &Secret,
		request: &RemoteRequest,
		endpoint: &str,
	) -> Result<HttpResponse> {
		let http_request = self.build_request(token, request, endpoint)?;

		self.execute(kind, http_request).await
	}

	fn build_request(
		&self,
		token: &Secret,
		request: &RemoteRequest,
		endpoint: &str,
	) -> Result<HttpRequest> {
		let url = self.rewrite.rewrite(self.descriptor.resolve(endpoint)?);
		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", token.expose()))?);
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		for (name, value) in &request.headers {
			let name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;

			headers.insert(name, header_value(value)?);
		}

		let body = match &request.body {
			Some(body) => serde_json::to_vec(body).map_err(ConfigError::http_client_build)?,
			None => Vec::new(),
		};
		let mut http_request = Request::builder()
			.method(request.method.as_method())
			.uri(url.as_str())
			.body(body)
			.map_err(ConfigError::from)?;

		*http_request.headers_mut() = headers;

		Ok(http_request)
	}
}

fn header_value(value: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(value)
		.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)).into())
}

fn ensure_success(endpoint: &str, response: HttpResponse) -> Result<HttpResponse> {
	let status = response.status();

	if status.is_success() {
		return Ok(response);
	}

	let (message, details) = describe_error_body(response.body());
	let message = message.unwrap_or_else(|| {
		status.canonical_reason().map(str::to_owned).unwrap_or_else(|| "Request failed".into())
	});

	Err(ApiError { endpoint: endpoint.to_owned(), status: status.as_u16(), message, details }
		.into())
}

fn decode_json(endpoint: &str, response: HttpResponse) -> Result<Option<JsonValue>> {
	let body = response.body();

	if http::is_blank_body(body) {
		return Ok(None);
	}

	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map(Some).map_err(|source| Error::Parse {
		endpoint: endpoint.to_owned(),
		status: response.status().as_u16(),
		source,
	})
}

/// Extracts the file name from a `Content-Disposition` header value.
pub(crate) fn disposition_filename(value: &str) -> Option<String> {
	value.split(';').map(str::trim).find_map(|part| {
		let (key, raw) = part.split_once('=')?;

		if !key.trim().eq_ignore_ascii_case("filename") {
			return None;
		}

		let name = raw.trim().trim_matches('"');

		(!name.is_empty()).then(|| name.to_owned())
	})
}
