//! Identifier normalization for records handed to local data sinks.
//!
//! Xubio is inconsistent about identifier field names: a client may arrive with `clienteid`,
//! `ID`, or `id`. Sinks should key records by [`canonical_id`] instead of guessing.

// self
use crate::_prelude::*;

/// Record families with known identifier aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
	/// Client records.
	Cliente,
	/// Sales product records.
	Producto,
	/// Point-of-sale records.
	PuntoVenta,
	/// Currency records.
	Moneda,
}
impl RecordKind {
	/// Identifier fields, in lookup order.
	pub const fn aliases(self) -> &'static [&'static str] {
		match self {
			Self::Cliente => &["clienteid", "ID", "id"],
			Self::Producto => &["productoid", "ID", "id"],
			Self::PuntoVenta => &["puntoVentaId", "ID", "id"],
			Self::Moneda => &["ID", "monedaId", "id"],
		}
	}
}

/// Returns the record's identifier as text, trying each alias of `kind` in order.
///
/// Null, empty, and non-scalar values are skipped.
pub fn canonical_id(kind: RecordKind, record: &JsonValue) -> Option<String> {
	kind.aliases().iter().find_map(|alias| match record.get(*alias)? {
		JsonValue::String(value) if !value.trim().is_empty() => Some(value.trim().to_owned()),
		JsonValue::Number(value) => Some(value.to_string()),
		_ => None,
	})
}

/// Indexes `records` by canonical identifier, dropping records without one.
///
/// Later records win when two share an identifier.
pub fn index_by_id<'a, I>(kind: RecordKind, records: I) -> BTreeMap<String, JsonValue>
where
	I: IntoIterator<Item = &'a JsonValue>,
{
	records
		.into_iter()
		.filter_map(|record| canonical_id(kind, record).map(|id| (id, record.clone())))
		.collect()
}
