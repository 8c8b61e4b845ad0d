//! Storage contracts and built-in store implementations for per-user upstream credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialId, CredentialRecord, CredentialUpdate, UserId},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract holding one credential per user for the upstream service.
///
/// Writes are unconditional overwrites; the last writer wins.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential owned by `record.user`.
	fn save(&self, record: CredentialRecord) -> StoreFuture<'_, ()>;

	/// Fetches the credential owned by `user`, if one was ever stored.
	fn find_credential<'a>(&'a self, user: &'a UserId)
	-> StoreFuture<'a, Option<CredentialRecord>>;

	/// Overwrites the rotating fields of the credential identified by `id`.
	fn update_credential<'a>(
		&'a self,
		id: &'a CredentialId,
		update: CredentialUpdate,
	) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
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
	/// No credential carries the requested identifier.
	#[error("Credential {id} does not exist.")]
	NotFound {
		/// Identifier that was looked up.
		id: CredentialId,
	},
}

/// Applies `update` to the record identified by `id` inside a user-keyed map.
pub(crate) fn apply_update(
	records: &mut HashMap<UserId, CredentialRecord>,
	id: &CredentialId,
	update: CredentialUpdate,
) -> Result<(), StoreError> {
	let record = records
		.values_mut()
		.find(|record| &record.id == id)
		.ok_or_else(|| StoreError::NotFound { id: id.clone() })?;

	record.apply(update);

	Ok(())
}
