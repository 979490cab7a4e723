//! Thread-safe in-memory [`KeyValueStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError, StoreFuture, WriteBatch},
};

type StoreMap = Arc<RwLock<HashMap<String, JsonValue>>>;

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn get_now(map: StoreMap, key: &str) -> Option<JsonValue> {
		map.read().get(key).cloned()
	}

	fn write_now(map: StoreMap, batch: WriteBatch) -> Result<(), StoreError> {
		let mut guard = map.write();

		for (key, value) in batch {
			match value {
				Some(value) => guard.insert(key.to_owned(), value),
				None => guard.remove(key),
			};
		}

		Ok(())
	}
}
impl KeyValueStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<JsonValue>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(map, key)) })
	}

	fn write(&self, batch: WriteBatch) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::write_now(map, batch) })
	}
}
