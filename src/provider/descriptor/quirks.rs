// self
use crate::_prelude::*;

/// Service-specific quirks that influence how the executor behaves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceQuirks {
	/// Alternate paths tried once when a primary path answers `404 Not Found`.
	pub fallback_routes: FallbackRoutes,
}
impl Default for ServiceQuirks {
	fn default() -> Self {
		Self { fallback_routes: FallbackRoutes::xubio() }
	}
}

/// Primary resource segment → single alternate segment.
///
/// The sales-product catalog is published as `productoVentaBean` on some deployments and as
/// `productoVenta` on others; the table records that pair (and any other) in one place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FallbackRoutes(BTreeMap<String, String>);
impl FallbackRoutes {
	/// Routes known for the Xubio API.
	pub fn xubio() -> Self {
		Self::default().with_route("productoVentaBean", "productoVenta")
	}

	/// Adds or replaces a route.
	pub fn with_route(mut self, primary: impl Into<String>, alternate: impl Into<String>) -> Self {
		self.0.insert(primary.into(), alternate.into());

		self
	}

	/// Returns the alternate endpoint for `endpoint`, matching on its first path segment and
	/// keeping the remainder (`productoVentaBean/7` → `productoVenta/7`).
	pub fn alternate_for(&self, endpoint: &str) -> Option<String> {
		let trimmed = endpoint.trim_start_matches('/');
		let (head, rest) = match trimmed.split_once('/') {
			Some((head, rest)) => (head, Some(rest)),
			None => (trimmed, None),
		};
		let alternate = self.0.get(head)?;

		Some(match rest {
			Some(rest) => format!("{alternate}/{rest}"),
			None => alternate.clone(),
		})
	}

	/// Iterates over `(primary, alternate)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Returns `true` when no routes are configured.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
