mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::macros::date;
// self
use xubio_broker::{
	error::{ApiError, Error},
	flows::RemoteRequest,
	provider::CorsRelayPrefix,
	resources::{PresupuestoBean, TransaccionProductoItem},
};

#[tokio::test]
async fn end_to_end_call_returns_the_array_verbatim() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let token_mock = common::mock_token(&server, "tok", 3600).await;
	let clientes_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/cliente")
				.header("authorization", "Bearer tok")
				.header("content-type", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"clienteid\":1,\"nombre\":\"Acme\"},{\"clienteid\":2,\"nombre\":\"Beta\"}]");
		})
		.await;
	let value = broker
		.call(RemoteRequest::get("cliente"))
		.await
		.expect("Authenticated call should succeed.");

	assert_eq!(
		value,
		Some(serde_json::json!([
			{ "clienteid": 1, "nombre": "Acme" },
			{ "clienteid": 2, "nombre": "Beta" }
		]))
	);

	token_mock.assert_calls_async(1).await;
	clientes_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn not_found_on_primary_route_retries_the_alternate_once() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let primary = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVentaBean");
			then.status(404).body("Not Found");
		})
		.await;
	let alternate = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVenta");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"productoid\":7}]");
		})
		.await;
	let productos = broker.productos_venta().await.expect("Fallback call should succeed.");

	assert_eq!(productos, vec![serde_json::json!({ "productoid": 7 })]);

	primary.assert_calls_async(1).await;
	alternate.assert_calls_async(1).await;
}

#[tokio::test]
async fn alternate_route_failure_is_reported_without_further_retries() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let primary = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVentaBean");
			then.status(404);
		})
		.await;
	let alternate = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVenta");
			then.status(404).body("{\"error\":\"No existe\"}");
		})
		.await;
	let err = broker.productos_venta().await.expect_err("Both routes missing should fail.");

	match err {
		Error::Api(ApiError { endpoint, status, message, .. }) => {
			assert_eq!(endpoint, "productoVenta");
			assert_eq!(status, 404);
			assert_eq!(message, "No existe");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	primary.assert_calls_async(1).await;
	alternate.assert_calls_async(1).await;
}

#[tokio::test]
async fn server_error_on_primary_route_does_not_fall_back() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let primary = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVentaBean");
			then.status(500).body("{\"message\":\"Internal failure\",\"details\":\"db down\"}");
		})
		.await;
	let alternate = server
		.mock_async(|when, then| {
			when.method(GET).path("/productoVenta");
			then.status(200).body("[]");
		})
		.await;
	let err = broker.productos_venta().await.expect_err("500 should fail.");
	let normalized = err.normalized();

	assert_eq!(normalized.http_status, 500);
	assert_eq!(normalized.message, "Internal failure");
	assert_eq!(normalized.details.as_deref(), Some("db down"));

	primary.assert_calls_async(1).await;
	alternate.assert_calls_async(0).await;
}

#[tokio::test]
async fn empty_success_body_yields_none() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let _delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/presupuesto/42");
			then.status(204);
		})
		.await;
	let value = broker
		.call(RemoteRequest::delete("presupuesto/42"))
		.await
		.expect("Delete should succeed.");

	assert_eq!(value, None);
	broker.delete_presupuesto(42).await.expect("Typed delete should succeed.");
}

#[tokio::test]
async fn non_json_success_body_is_a_parse_error() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let _html = server
		.mock_async(|when, then| {
			when.method(GET).path("/miEmpresa");
			then.status(200).header("content-type", "text/html").body("<html>login</html>");
		})
		.await;
	let err = broker.mi_empresa().await.expect_err("HTML body should fail to parse.");

	assert!(matches!(&err, Error::Parse { endpoint, status: 200, .. } if endpoint == "miEmpresa"));
	assert_eq!(err.normalized().http_status, 500);
}

#[tokio::test]
async fn caller_headers_override_defaults() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/presupuesto/9")
				.header("content-type", "application/vnd.xubio+json")
				.header("authorization", "Bearer tok")
				.json_body(serde_json::json!({ "descripcion": "Editado" }));
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
		})
		.await;
	let value = broker
		.call(
			RemoteRequest::put("presupuesto/9", serde_json::json!({ "descripcion": "Editado" }))
				.with_header("Content-Type", "application/vnd.xubio+json"),
		)
		.await
		.expect("Call with custom headers should succeed.");

	assert_eq!(value, Some(serde_json::json!({ "ok": true })));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn create_presupuesto_posts_the_bean() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let bean = PresupuestoBean::builder(12, date!(2026 - 10 - 19))
		.descripcion("Instalación")
		.item(TransaccionProductoItem::new(7, 3., 100.))
		.build();
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/presupuesto").json_body(serde_json::json!({
				"cliente": { "clienteid": 12 },
				"fecha": "2026-10-19",
				"descripcion": "Instalación",
				"condicionDePago": 2,
				"transaccionProductoItems": [{
					"productoVenta": { "productoid": 7 },
					"cantidad": 3.0,
					"precioUnitario": 100.0,
					"bonificacion": 0.0,
					"descripcion": ""
				}]
			}));
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"transaccionid\":555}");
		})
		.await;
	let created = broker.create_presupuesto(&bean).await.expect("Quote creation should succeed.");

	assert_eq!(created, Some(serde_json::json!({ "transaccionid": 555 })));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn presupuesto_pdf_downloads_bytes_with_defaults() {
	let server = MockServer::start_async().await;
	let (broker, _store) = common::broker_with_credentials(common::descriptor(&server)).await;
	let _token = common::mock_token(&server, "tok", 3600).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ImprimirPdf/presupuesto/77").header("authorization", "Bearer tok");
			then.status(200).body(b"%PDF-1.4 demo".as_slice());
		})
		.await;
	let download = broker.presupuesto_pdf(77).await.expect("PDF download should succeed.");

	assert_eq!(download.bytes, b"%PDF-1.4 demo");
	assert_eq!(download.content_type.as_deref(), Some("application/pdf"));
	assert_eq!(download.filename.as_deref(), Some("presupuesto-77.pdf"));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn url_rewrite_routes_calls_through_a_cors_prefix() {
	let server = MockServer::start_async().await;
	let descriptor = common::descriptor(&server);
	let relay = url::Url::parse(&server.url("/cors/")).expect("CORS relay URL should parse.");
	let (broker, _store) = common::broker_with_credentials(descriptor).await;
	let broker = broker.with_url_rewrite(Arc::new(CorsRelayPrefix::new(relay)));
	let _token = common::mock_token(&server, "tok", 3600).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/cors/").header("authorization", "Bearer tok");
			then.status(200).header("content-type", "application/json").body("{\"nombre\":\"Acme\"}");
		})
		.await;
	let empresa = broker.mi_empresa().await.expect("Rewritten call should succeed.");

	assert_eq!(empresa, Some(serde_json::json!({ "nombre": "Acme" })));

	mock.assert_calls_async(1).await;
}
