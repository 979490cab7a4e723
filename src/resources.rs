//! Typed helpers for the Xubio resources used by the quoting workflow.
//!
//! Every helper is a thin wrapper over [`Broker::call`] or [`Broker::download`]; token handling,
//! fallbacks, and error normalization stay with the executor.

pub mod normalize;
pub mod presupuesto;

pub use normalize::*;
pub use presupuesto::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	flows::{Broker, Download, RemoteRequest},
	http::HttpTransport,
	oauth::TransportErrorMapper,
};

/// Client list endpoint.
pub const CLIENTES_ENDPOINT: &str = "clienteBean";
/// Sales product list endpoint; falls back to `productoVenta` on `404`.
pub const PRODUCTOS_VENTA_ENDPOINT: &str = "productoVentaBean";
/// Quote collection endpoint.
pub const PRESUPUESTOS_ENDPOINT: &str = "presupuesto";
/// Company identity endpoint.
pub const MI_EMPRESA_ENDPOINT: &str = "miEmpresa";
/// Printable document endpoint prefix.
pub const IMPRIMIR_PDF_ENDPOINT: &str = "ImprimirPdf";

/// Maps public resource names (`clientes`, `productos`, ...) to Xubio endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRoutes(BTreeMap<String, String>);
impl ResourceRoutes {
	/// Routes exposed by the relay by default.
	pub fn xubio() -> Self {
		Self::default()
			.with_route("clientes", CLIENTES_ENDPOINT)
			.with_route("productos", PRODUCTOS_VENTA_ENDPOINT)
			.with_route("presupuestos", PRESUPUESTOS_ENDPOINT)
			.with_route("empresa", MI_EMPRESA_ENDPOINT)
	}

	/// Adds or replaces a route.
	pub fn with_route(mut self, name: impl Into<String>, endpoint: impl Into<String>) -> Self {
		self.0.insert(name.into(), endpoint.into());

		self
	}

	/// Returns the endpoint behind `name`.
	pub fn endpoint_for(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Iterates over `(name, endpoint)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(name, endpoint)| (name.as_str(), endpoint.as_str()))
	}
}
impl<C, M> Broker<C, M>
where
	C: HttpTransport + ?Sized,
	M: TransportErrorMapper<C::TransportError> + ?Sized,
{
	/// Lists the company's clients.
	pub async fn clientes(&self) -> Result<Vec<JsonValue>> {
		self.list(CLIENTES_ENDPOINT).await
	}

	/// Lists the company's sales products.
	pub async fn productos_venta(&self) -> Result<Vec<JsonValue>> {
		self.list(PRODUCTOS_VENTA_ENDPOINT).await
	}

	/// Lists the company's quotes.
	pub async fn presupuestos(&self) -> Result<Vec<JsonValue>> {
		self.list(PRESUPUESTOS_ENDPOINT).await
	}

	/// Fetches one quote.
	pub async fn presupuesto(&self, id: impl Display) -> Result<Option<JsonValue>> {
		self.call(RemoteRequest::get(format!("{PRESUPUESTOS_ENDPOINT}/{id}"))).await
	}

	/// Creates a quote and returns the service's representation of it.
	pub async fn create_presupuesto(&self, bean: &PresupuestoBean) -> Result<Option<JsonValue>> {
		let body = serde_json::to_value(bean).map_err(ConfigError::http_client_build)?;

		self.call(RemoteRequest::post(PRESUPUESTOS_ENDPOINT, body)).await
	}

	/// Deletes one quote.
	pub async fn delete_presupuesto(&self, id: impl Display) -> Result<()> {
		self.call(RemoteRequest::delete(format!("{PRESUPUESTOS_ENDPOINT}/{id}"))).await?;

		Ok(())
	}

	/// Returns the identity of the authenticated company.
	pub async fn mi_empresa(&self) -> Result<Option<JsonValue>> {
		self.call(RemoteRequest::get(MI_EMPRESA_ENDPOINT)).await
	}

	/// Downloads the printable PDF of one quote.
	///
	/// The content type defaults to `application/pdf` and the file name to
	/// `presupuesto-{id}.pdf` when the service does not advertise them.
	pub async fn presupuesto_pdf(&self, id: impl Display) -> Result<Download> {
		let id = id.to_string();
		let mut download =
			self.download(&format!("{IMPRIMIR_PDF_ENDPOINT}/{PRESUPUESTOS_ENDPOINT}/{id}")).await?;

		download.content_type.get_or_insert_with(|| "application/pdf".into());
		download.filename.get_or_insert_with(|| presupuesto_pdf_filename(&id));

		Ok(download)
	}

	async fn list(&self, endpoint: &str) -> Result<Vec<JsonValue>> {
		match self.call(RemoteRequest::get(endpoint)).await? {
			Some(value) => serde_path_to_error::deserialize(value).map_err(|source| {
				Error::Parse { endpoint: endpoint.to_owned(), status: 200, source }
			}),
			None => Ok(Vec::new()),
		}
	}
}

/// File name used for downloaded quote PDFs.
pub fn presupuesto_pdf_filename(id: &str) -> String {
	format!("presupuesto-{id}.pdf")
}
