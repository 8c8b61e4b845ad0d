//! Simple file-backed [`CredentialStore`] for lightweight deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialId, CredentialRecord, CredentialUpdate, UserId},
	store::{self, CredentialStore, StoreError, StoreFuture},
};

/// Persists credentials to a JSON file after each mutation.
///
/// The snapshot is a JSON array of records, rewritten through a temporary sibling file and an
/// atomic rename.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<UserId, CredentialRecord>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<UserId, CredentialRecord>, StoreError> {
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(HashMap::new());
		}

		let records: Vec<CredentialRecord> =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(records.into_iter().map(|record| (record.user.clone(), record)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(
		&self,
		contents: &HashMap<UserId, CredentialRecord>,
	) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let mut snapshot: Vec<_> = contents.values().collect();

		snapshot.sort_by(|a, b| a.user.cmp(&b.user));

		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl CredentialStore for FileStore {
	fn save(&self, record: CredentialRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.insert(record.user.clone(), record);
			self.persist_locked(&guard)
		})
	}

	fn find_credential<'a>(
		&'a self,
		user: &'a UserId,
	) -> StoreFuture<'a, Option<CredentialRecord>> {
		Box::pin(async move { Ok(self.inner.read().get(user).cloned()) })
	}

	fn update_credential<'a>(
		&'a self,
		id: &'a CredentialId,
		update: CredentialUpdate,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			store::apply_update(&mut guard, id, update)?;
			self.persist_locked(&guard)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"reddit_explorer_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record() -> CredentialRecord {
		CredentialRecord::builder(
			CredentialId::new("cred-demo").expect("Failed to build credential fixture."),
			UserId::new("user-demo").expect("Failed to build user fixture."),
		)
		.access_token("access-token")
		.refresh_token("refresh-token")
		.expires_in(Duration::hours(1))
		.build()
		.expect("Failed to build file-store test record.")
	}

	#[test]
	fn save_update_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let record = build_record();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(record.clone()))
			.expect("Failed to save fixture record to file store.");
		rt.block_on(store.update_credential(
			&record.id,
			CredentialUpdate {
				access_token: TokenSecret::new("rotated-access"),
				refresh_token: record.refresh_token.clone(),
				expires_at: None,
			},
		))
		.expect("Failed to update fixture record in file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.find_credential(&record.user))
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.access_token.expose(), "rotated-access");
		assert_eq!(fetched.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-token"));
		assert_eq!(fetched.expires_at, None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn update_unknown_credential_leaves_file_untouched() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let missing =
			CredentialId::new("cred-missing").expect("Credential fixture should be valid.");
		let err = rt
			.block_on(store.update_credential(
				&missing,
				CredentialUpdate {
					access_token: TokenSecret::new("x"),
					refresh_token: None,
					expires_at: None,
				},
			))
			.expect_err("Unknown credentials must be rejected.");

		assert_eq!(err, StoreError::NotFound { id: missing });
		assert!(!path.exists(), "Failed updates must not create a snapshot.");
	}
}
