mod common;

// crates.io
use axum::{
	Router,
	body::{Body, to_bytes},
	http::{Request, StatusCode, header},
};
use httpmock::prelude::*;
use serde_json::Value as JsonValue;
use tower::ServiceExt;
// self
use xubio_broker::{
	auth::CredentialPair,
	relay::{self, RelayConfig, RelayState},
};

fn relay_app(server: &MockServer, config: RelayConfig) -> Router {
	let state = RelayState::new(common::descriptor(server), config)
		.expect("Relay state should build successfully.");

	relay::router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, JsonValue) {
	let response = app.oneshot(request).await.expect("Relay should answer.");
	let status = response.status();
	let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");
	let body = if bytes.is_empty() {
		JsonValue::Null
	} else {
		serde_json::from_slice(&bytes).expect("Relay body should be JSON.")
	};

	(status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method("GET").uri(uri);

	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}

	builder.body(Body::empty()).expect("Request should build.")
}

fn post_json(uri: &str, token: Option<&str>, body: JsonValue) -> Request<Body> {
	let mut builder = Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/json");

	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}

	builder.body(Body::from(body.to_string())).expect("Request should build.")
}

#[tokio::test]
async fn auth_exchanges_the_supplied_pair() {
	let server = MockServer::start_async().await;
	let mock = common::mock_token(&server, "relay-tok", 1200).await;
	let (status, body) = send(
		relay_app(&server, RelayConfig::default()),
		post_json("/api/auth", None, serde_json::json!({ "clientId": "id1", "secretId": "sec1" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(
		body,
		serde_json::json!({ "access_token": "relay-tok", "token_type": "Bearer", "expires_in": 1200 })
	);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn auth_rejects_missing_fields() {
	let server = MockServer::start_async().await;
	let (status, body) = send(
		relay_app(&server, RelayConfig::default()),
		post_json("/api/auth", None, serde_json::json!({ "clientId": "id1" })),
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body, serde_json::json!({ "error": "clientId and secretId are required" }));
}

#[tokio::test]
async fn auth_rejects_malformed_json() {
	let server = MockServer::start_async().await;
	let request = Request::builder()
		.method("POST")
		.uri("/api/auth")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from("{\"clientId\":\"id1\","))
		.expect("Request should build.");
	let (status, body) = send(relay_app(&server, RelayConfig::default()), request).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body, serde_json::json!({ "error": "Request body must be valid JSON" }));
}

#[tokio::test]
async fn auth_uses_server_credentials_when_requested() {
	let server = MockServer::start_async().await;
	let mock = common::mock_token(&server, "server-tok", 3600).await;
	let config = RelayConfig::default().with_server_credentials(
		CredentialPair::new(common::CLIENT_ID, common::SECRET_ID)
			.expect("Server pair should be valid."),
	);
	let app = relay_app(&server, config);
	let (status, body) =
		send(app.clone(), post_json("/api/auth", None, serde_json::json!({ "useServerCredentials": true })))
			.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["access_token"], "server-tok");

	let (status, body) = send(app, get("/api/auth", None)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, serde_json::json!({ "hasServerCredentials": true }));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn auth_forwards_upstream_rejections() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/TokenEndpoint");
			then.status(401).body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let (status, body) = send(
		relay_app(&server, RelayConfig::default()),
		post_json("/api/auth", None, serde_json::json!({ "clientId": "id1", "secretId": "bad" })),
	)
	.await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["error"], "invalid_client");
	assert_eq!(body["details"], "{\"error\":\"invalid_client\"}");
}

#[tokio::test]
async fn resources_require_a_bearer_token() {
	let server = MockServer::start_async().await;
	let (status, body) = send(relay_app(&server, RelayConfig::default()), get("/api/clientes", None)).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body, serde_json::json!({ "error": "Missing bearer token" }));
}

#[tokio::test]
async fn unknown_resources_are_not_found() {
	let server = MockServer::start_async().await;
	let (status, _body) =
		send(relay_app(&server, RelayConfig::default()), get("/api/facturas", Some("tok"))).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_listing_uses_the_fallback_route() {
	let server = MockServer::start_async().await;
	let primary = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVentaBean").header("authorization", "Bearer tok");
			then.status(404);
		})
		.await;
	let alternate = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVenta").header("authorization", "Bearer tok");
			then.status(200).header("content-type", "application/json").body("[{\"productoid\":1}]");
		})
		.await;
	let (status, body) =
		send(relay_app(&server, RelayConfig::default()), get("/api/productos", Some("tok"))).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, serde_json::json!([{ "productoid": 1 }]));

	primary.assert_calls_async(1).await;
	alternate.assert_calls_async(1).await;
}

#[tokio::test]
async fn creating_and_deleting_quotes() {
	let server = MockServer::start_async().await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/presupuesto").json_body(serde_json::json!({ "descripcion": "x" }));
			then.status(200).header("content-type", "application/json").body("{\"transaccionid\":9}");
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/presupuesto/9");
			then.status(200);
		})
		.await;
	let app = relay_app(&server, RelayConfig::default());
	let (status, body) = send(
		app.clone(),
		post_json("/api/presupuestos", Some("tok"), serde_json::json!({ "descripcion": "x" })),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body, serde_json::json!({ "transaccionid": 9 }));

	let request = Request::builder()
		.method("DELETE")
		.uri("/api/presupuestos/9")
		.header(header::AUTHORIZATION, "Bearer tok")
		.body(Body::empty())
		.expect("Request should build.");
	let (status, body) = send(app, request).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], true);

	create.assert_calls_async(1).await;
	delete.assert_calls_async(1).await;
}

#[tokio::test]
async fn upstream_failures_keep_their_status() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/presupuesto/404");
			then.status(404).body("{\"error\":\"No existe el presupuesto\"}");
		})
		.await;
	let (status, body) =
		send(relay_app(&server, RelayConfig::default()), get("/api/presupuestos/404", Some("tok")))
			.await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "No existe el presupuesto");
}

#[tokio::test]
async fn pdf_download_is_served_as_an_attachment() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ImprimirPdf/presupuesto/31").header("authorization", "Bearer tok");
			then.status(200).header("content-type", "application/octet-stream").body(b"%PDF-1.7".as_slice());
		})
		.await;
	let response = relay_app(&server, RelayConfig::default())
		.oneshot(get("/api/pdf/31", Some("tok")))
		.await
		.expect("Relay should answer.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
	assert_eq!(
		response.headers()[header::CONTENT_DISPOSITION],
		"attachment; filename=presupuesto-31.pdf"
	);

	let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	assert_eq!(bytes.as_ref(), b"%PDF-1.7");

	mock.assert_calls_async(1).await;
}
