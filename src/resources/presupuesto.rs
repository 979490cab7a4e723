//! `PresupuestoBean` payloads and the payment-terms catalog.

// crates.io
use time::Date;
// self
use crate::_prelude::*;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Payment terms accepted by Xubio quotes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CondicionDePago {
	/// Billed to the client's running account.
	CuentaCorriente,
	/// Paid on delivery.
	#[default]
	AlContado,
}
impl CondicionDePago {
	/// Every known condition, in catalog order.
	pub const ALL: [Self; 2] = [Self::CuentaCorriente, Self::AlContado];

	/// Numeric identifier used by the service.
	pub const fn id(self) -> u8 {
		match self {
			Self::CuentaCorriente => 1,
			Self::AlContado => 2,
		}
	}

	/// Display name shown to users.
	pub const fn nombre(self) -> &'static str {
		match self {
			Self::CuentaCorriente => "Cuenta Corriente",
			Self::AlContado => "Al Contado",
		}
	}
}
impl From<CondicionDePago> for u8 {
	fn from(value: CondicionDePago) -> Self {
		value.id()
	}
}
impl TryFrom<u8> for CondicionDePago {
	type Error = UnknownCondicionDePago;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Self::ALL.into_iter().find(|c| c.id() == value).ok_or(UnknownCondicionDePago(value))
	}
}

/// Raised when a payment-terms identifier is not in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown payment condition identifier {0}.")]
pub struct UnknownCondicionDePago(pub u8);

/// `{clienteid}` reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClienteRef {
	/// Client identifier.
	pub clienteid: i64,
}

/// `{productoid}` reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductoRef {
	/// Product identifier.
	pub productoid: i64,
}

/// `{puntoVentaId}` reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuntoVentaRef {
	/// Point-of-sale identifier.
	pub punto_venta_id: i64,
}

/// `{ID}` currency reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonedaRef {
	/// Currency identifier.
	#[serde(rename = "ID")]
	pub id: i64,
}

/// One line of a quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransaccionProductoItem {
	/// Product being quoted.
	pub producto_venta: ProductoRef,
	/// Quantity.
	pub cantidad: f64,
	/// Unit price.
	pub precio_unitario: f64,
	/// Discount percentage.
	#[serde(default)]
	pub bonificacion: f64,
	/// Free-text line description.
	#[serde(default)]
	pub descripcion: String,
}
impl TransaccionProductoItem {
	/// Creates a line without discount or description.
	pub fn new(producto_id: i64, cantidad: f64, precio_unitario: f64) -> Self {
		Self {
			producto_venta: ProductoRef { productoid: producto_id },
			cantidad,
			precio_unitario,
			bonificacion: 0.,
			descripcion: String::new(),
		}
	}

	/// Sets the discount percentage.
	pub fn bonificacion(mut self, bonificacion: f64) -> Self {
		self.bonificacion = bonificacion;

		self
	}

	/// Sets the line description.
	pub fn descripcion(mut self, descripcion: impl Into<String>) -> Self {
		self.descripcion = descripcion.into();

		self
	}
}

/// Quote payload accepted by `POST presupuesto`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresupuestoBean {
	/// Quoted client.
	pub cliente: ClienteRef,
	/// Issue date.
	#[serde(with = "iso_date")]
	pub fecha: Date,
	/// Expiry date.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "iso_date::option")]
	pub fecha_vto: Option<Date>,
	/// Free-text description.
	#[serde(default)]
	pub descripcion: String,
	/// Point of sale, when the company has several.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub punto_venta: Option<PuntoVentaRef>,
	/// Currency, when not the company default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub moneda: Option<MonedaRef>,
	/// Payment terms.
	#[serde(default)]
	pub condicion_de_pago: CondicionDePago,
	/// Quote lines.
	#[serde(default)]
	pub transaccion_producto_items: Vec<TransaccionProductoItem>,
}
impl PresupuestoBean {
	/// Starts a quote for `cliente_id` issued on `fecha`.
	pub fn builder(cliente_id: i64, fecha: Date) -> PresupuestoBeanBuilder {
		PresupuestoBeanBuilder::new(cliente_id, fecha)
	}

	/// Sum of every line's `cantidad * precioUnitario` after its discount.
	pub fn total(&self) -> f64 {
		self.transaccion_producto_items
			.iter()
			.map(|item| item.cantidad * item.precio_unitario * (1. - item.bonificacion / 100.))
			.sum()
	}
}

/// Builder for [`PresupuestoBean`].
#[derive(Clone, Debug)]
pub struct PresupuestoBeanBuilder {
	bean: PresupuestoBean,
}
impl PresupuestoBeanBuilder {
	/// Creates a builder with an empty description and cash payment terms.
	pub fn new(cliente_id: i64, fecha: Date) -> Self {
		Self {
			bean: PresupuestoBean {
				cliente: ClienteRef { clienteid: cliente_id },
				fecha,
				fecha_vto: None,
				descripcion: String::new(),
				punto_venta: None,
				moneda: None,
				condicion_de_pago: CondicionDePago::default(),
				transaccion_producto_items: Vec::new(),
			},
		}
	}

	/// Sets the expiry date.
	pub fn fecha_vto(mut self, fecha_vto: Date) -> Self {
		self.bean.fecha_vto = Some(fecha_vto);

		self
	}

	/// Sets the description.
	pub fn descripcion(mut self, descripcion: impl Into<String>) -> Self {
		self.bean.descripcion = descripcion.into();

		self
	}

	/// Sets the point of sale.
	pub fn punto_venta(mut self, punto_venta_id: i64) -> Self {
		self.bean.punto_venta = Some(PuntoVentaRef { punto_venta_id });

		self
	}

	/// Sets the currency.
	pub fn moneda(mut self, moneda_id: i64) -> Self {
		self.bean.moneda = Some(MonedaRef { id: moneda_id });

		self
	}

	/// Sets the payment terms.
	pub fn condicion_de_pago(mut self, condicion: CondicionDePago) -> Self {
		self.bean.condicion_de_pago = condicion;

		self
	}

	/// Appends a quote line.
	pub fn item(mut self, item: TransaccionProductoItem) -> Self {
		self.bean.transaccion_producto_items.push(item);

		self
	}

	/// Finalizes the bean.
	pub fn build(self) -> PresupuestoBean {
		self.bean
	}
}
