//! Credential store over pluggable key-value backends.
//!
//! [`CredentialStore`] owns the two durable records the broker needs: the active
//! [`CredentialPair`] under [`CREDENTIALS_KEY`] and the current [`CachedToken`] under
//! [`TOKEN_KEY`], each kept as a JSON document. Backends implement [`KeyValueStore`] and apply
//! every [`WriteBatch`] atomically, so readers never observe a half-written pair or a token
//! whose value and expiry disagree.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, CredentialPair, Secret, TokenOrigin},
	flows::common::map_token_builder_error,
};

/// Key holding the serialized [`CredentialPair`].
pub const CREDENTIALS_KEY: &str = "xubio_credentials";
/// Key holding the serialized [`CachedToken`].
pub const TOKEN_KEY: &str = "xubio_token";

/// Boxed future returned by [`KeyValueStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Ordered set of writes applied as one unit; `None` removes the key.
pub type WriteBatch = Vec<(&'static str, Option<JsonValue>)>;

/// Durable key-value backend used by [`CredentialStore`].
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Fetches the document stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<JsonValue>>;

	/// Applies every write in `batch` atomically.
	fn write(&self, batch: WriteBatch) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend or while decoding records.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Single-writer owner of the credential pair and cached token.
#[derive(Clone)]
pub struct CredentialStore {
	backend: Arc<dyn KeyValueStore>,
	safety_margin: Duration,
}
impl CredentialStore {
	/// Default window before expiry during which a cached token is no longer handed out.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

	/// Wraps a backend with the default safety margin.
	pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
		Self { backend, safety_margin: Self::DEFAULT_SAFETY_MARGIN }
	}

	/// Overrides the safety margin (negative values clamp to zero).
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Safety margin applied by [`CredentialStore::get_stored_token`].
	pub fn safety_margin(&self) -> Duration {
		self.safety_margin
	}

	/// Returns the active credential pair, if one was saved.
	pub async fn get_credentials(&self) -> Result<Option<CredentialPair>, StoreError> {
		self.read(CREDENTIALS_KEY).await
	}

	/// Validates and saves a new credential pair, replacing the previous one.
	///
	/// Any token issued for the previous pair is discarded in the same write.
	pub async fn save_credentials(
		&self,
		client_id: impl Into<String>,
		secret_id: impl Into<String>,
	) -> Result<CredentialPair> {
		let pair = CredentialPair::new(client_id, secret_id)?;

		self.backend
			.write(vec![(CREDENTIALS_KEY, Some(encode(&pair)?)), (TOKEN_KEY, None)])
			.await?;

		Ok(pair)
	}

	/// Removes both the credential pair and any cached token.
	pub async fn clear_credentials(&self) -> Result<(), StoreError> {
		self.backend.write(vec![(CREDENTIALS_KEY, None), (TOKEN_KEY, None)]).await
	}

	/// Returns the cached access token when it is usable right now.
	pub async fn get_stored_token(&self) -> Result<Option<Secret>, StoreError> {
		self.get_stored_token_at(OffsetDateTime::now_utc()).await
	}

	/// Returns the cached access token when it is usable at `now`; expired and never-issued
	/// tokens both yield `None`.
	pub async fn get_stored_token_at(
		&self,
		now: OffsetDateTime,
	) -> Result<Option<Secret>, StoreError> {
		let token = self.cached_token().await?;

		Ok(token
			.filter(|token| token.is_usable_at(now, self.safety_margin))
			.map(|token| token.access_token))
	}

	/// Returns the cached access token when it is usable right now and was issued for `origin`.
	pub async fn get_stored_token_from(
		&self,
		origin: TokenOrigin,
	) -> Result<Option<Secret>, StoreError> {
		let now = OffsetDateTime::now_utc();
		let token = self.cached_token().await?;

		Ok(token
			.filter(|token| token.origin == origin && token.is_usable_at(now, self.safety_margin))
			.map(|token| token.access_token))
	}

	/// Returns the raw cached token regardless of its validity.
	pub async fn cached_token(&self) -> Result<Option<CachedToken>, StoreError> {
		self.read(TOKEN_KEY).await
	}

	/// Records a freshly issued token expiring `expires_in_secs` from now.
	pub async fn store_token(
		&self,
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		expires_in_secs: i64,
	) -> Result<CachedToken> {
		self.store_token_from(
			TokenOrigin::UserCredentials,
			access_token,
			token_type,
			expires_in_secs,
		)
		.await
	}

	/// Records a freshly issued token tagged with the credential pair it was issued for.
	pub async fn store_token_from(
		&self,
		origin: TokenOrigin,
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		expires_in_secs: i64,
	) -> Result<CachedToken> {
		let token = CachedToken::builder()
			.access_token(access_token)
			.token_type(token_type)
			.origin(origin)
			.expires_in(Duration::seconds(expires_in_secs))
			.build()
			.map_err(map_token_builder_error)?;

		self.replace_token(token.clone()).await?;

		Ok(token)
	}

	/// Replaces the cached token wholesale.
	pub async fn replace_token(&self, token: CachedToken) -> Result<(), StoreError> {
		self.backend.write(vec![(TOKEN_KEY, Some(encode(&token)?))]).await
	}

	async fn read<T>(&self, key: &str) -> Result<Option<T>, StoreError>
	where
		T: for<'de> Deserialize<'de>,
	{
		match self.backend.get(key).await? {
			Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
				StoreError::Serialization { message: format!("Failed to decode `{key}`: {e}") }
			}),
			None => Ok(None),
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore").field("safety_margin", &self.safety_margin).finish()
	}
}

fn encode<T>(value: &T) -> Result<JsonValue, StoreError>
where
	T: Serialize,
{
	serde_json::to_value(value).map_err(|e| StoreError::Serialization {
		message: format!("Failed to encode record: {e}"),
	})
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;

	fn memory_store() -> CredentialStore {
		CredentialStore::new(Arc::new(MemoryStore::default()))
	}

	#[test]
	fn store_error_converts_into_broker_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let broker_error: Error = store_error.clone().into();

		assert!(matches!(broker_error, Error::Storage(_)));
		assert!(broker_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&broker_error)
			.expect("Broker error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[tokio::test]
	async fn saving_new_credentials_discards_previous_token() {
		let store = memory_store();

		store.save_credentials("id1", "sec1").await.expect("First save should succeed.");
		store.store_token("tok", "Bearer", 3600).await.expect("Token store should succeed.");
		store.save_credentials("id2", "sec2").await.expect("Second save should succeed.");

		assert!(store.get_stored_token().await.expect("Token read should succeed.").is_none());
		assert_eq!(
			store
				.get_credentials()
				.await
				.expect("Credential read should succeed.")
				.expect("Credentials should be present.")
				.client_id,
			"id2"
		);
	}

	#[tokio::test]
	async fn stored_token_inside_margin_is_withheld() {
		let store = memory_store();

		store.store_token("short", "Bearer", 30).await.expect("Token store should succeed.");

		assert!(store.get_stored_token().await.expect("Token read should succeed.").is_none());
		assert!(store.cached_token().await.expect("Raw token read should succeed.").is_some());

		let relaxed = store.clone().with_safety_margin(Duration::ZERO);

		assert_eq!(
			relaxed
				.get_stored_token()
				.await
				.expect("Token read should succeed.")
				.expect("Token should be usable without a margin.")
				.expose(),
			"short"
		);
	}

	#[tokio::test]
	async fn origin_filter_only_matches_the_issuing_pair() {
		let store = memory_store();

		store.store_token("user", "Bearer", 3600).await.expect("Token store should succeed.");

		assert!(
			store
				.get_stored_token_from(TokenOrigin::ServerCredentials)
				.await
				.expect("Token read should succeed.")
				.is_none()
		);

		store
			.store_token_from(TokenOrigin::ServerCredentials, "server", "Bearer", 3600)
			.await
			.expect("Token store should succeed.");

		assert_eq!(
			store
				.get_stored_token_from(TokenOrigin::ServerCredentials)
				.await
				.expect("Token read should succeed.")
				.expect("Server token should be cached.")
				.expose(),
			"server"
		);
	}

	#[tokio::test]
	async fn corrupt_records_surface_serialization_errors() {
		let backend = Arc::new(MemoryStore::default());
		let store = CredentialStore::new(backend.clone());

		backend
			.write(vec![(TOKEN_KEY, Some(serde_json::json!({ "accessToken": 7 })))])
			.await
			.expect("Raw write should succeed.");

		let err = store.get_stored_token().await.expect_err("Corrupt token should not decode.");

		assert!(matches!(err, StoreError::Serialization { .. }));
	}
}
