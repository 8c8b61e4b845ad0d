//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{CredentialId, CredentialRecord, CredentialUpdate, UserId},
	store::{self, CredentialStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<UserId, CredentialRecord>>>;

/// Thread-safe storage backend that keeps credentials in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored credentials.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no credential has been stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StoreMap, record: CredentialRecord) {
		map.write().insert(record.user.clone(), record);
	}

	fn find_now(map: StoreMap, user: &UserId) -> Option<CredentialRecord> {
		map.read().get(user).cloned()
	}

	fn update_now(
		map: StoreMap,
		id: &CredentialId,
		update: CredentialUpdate,
	) -> Result<(), StoreError> {
		store::apply_update(&mut map.write(), id, update)
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, record: CredentialRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::save_now(map, record);

			Ok(())
		})
	}

	fn find_credential<'a>(
		&'a self,
		user: &'a UserId,
	) -> StoreFuture<'a, Option<CredentialRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::find_now(map, user)) })
	}

	fn update_credential<'a>(
		&'a self,
		id: &'a CredentialId,
		update: CredentialUpdate,
	) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::update_now(map, id, update) })
	}
}
