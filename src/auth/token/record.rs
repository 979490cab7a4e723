//! Immutable cached token records, lifecycle helpers, and builders.

// self
use crate::{_prelude::*, auth::token::secret::Secret};

/// Token type assumed when the token endpoint omits `token_type`.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Current lifecycle status for a cached token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is valid and outside the safety margin.
	Active,
	/// Token has not expired yet but sits inside the safety margin, so it must not be used.
	Expiring,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Which credential pair an exchange asked for when the token was issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenOrigin {
	/// The user's saved pair.
	#[default]
	UserCredentials,
	/// The relay's deployment pair.
	ServerCredentials,
}

/// Errors produced by [`CachedTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CachedTokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the relative expiry overflows the supported date range.
	#[error("Expiry is outside the supported date range.")]
	ExpiryOutOfRange,
}

/// Bearer token derived from a successful exchange; replaced wholesale on renewal.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Token type reported by the token endpoint.
	pub token_type: String,
	/// Credential pair the exchange asked for.
	#[serde(default)]
	pub origin: TokenOrigin,
	/// Instant after which the remote service rejects the token.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Returns a builder for constructing cached tokens.
	pub fn builder() -> CachedTokenBuilder {
		CachedTokenBuilder::default()
	}

	/// Computes the lifecycle status at a given instant, treating the final `margin` before
	/// expiry as unusable.
	pub fn status_at(&self, instant: OffsetDateTime, margin: Duration) -> TokenStatus {
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}
		if instant >= self.expires_at - margin {
			return TokenStatus::Expiring;
		}

		TokenStatus::Active
	}

	/// Returns `true` if the token may be sent at the provided instant.
	pub fn is_usable_at(&self, instant: OffsetDateTime, margin: Duration) -> bool {
		matches!(self.status_at(instant, margin), TokenStatus::Active)
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("origin", &self.origin)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`CachedToken`].
#[derive(Clone, Debug, Default)]
pub struct CachedTokenBuilder {
	access_token: Option<Secret>,
	token_type: Option<String>,
	origin: TokenOrigin,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CachedTokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Sets the token type; defaults to [`DEFAULT_TOKEN_TYPE`].
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Records which credential pair the exchange asked for.
	pub fn origin(mut self, origin: TokenOrigin) -> Self {
		self.origin = origin;

		self
	}

	/// Sets the instant relative expiries are computed from; defaults to now.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces a [`CachedToken`].
	pub fn build(self) -> Result<CachedToken, CachedTokenBuilderError> {
		let access_token = self.access_token.ok_or(CachedTokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(CachedTokenBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(CachedTokenBuilderError::MissingExpiry),
		};

		Ok(CachedToken {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.into()),
			origin: self.origin,
			expires_at,
		})
	}
}
