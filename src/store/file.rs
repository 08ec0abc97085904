//! Simple file-backed [`KeyValueStore`] for desktop shells and command-line tools.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{KeyValueStore, StoreError, StoreFuture},
};

/// Persists every key as a member of one JSON object, rewritten after each mutation.
///
/// Writes use blocking `std::fs` calls under the write lock, and memory only changes once the file
/// has been replaced. Fine for a handful of tokens; wrap it in `spawn_blocking` or pick another
/// backend when the store shares a latency-sensitive runtime.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<BTreeMap<String, String>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
		if !path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &BTreeMap<String, String>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
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
impl KeyValueStore for FileStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.inner.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let mut next = guard.clone();

			next.insert(key.to_owned(), value);
			self.persist_locked(&next)?;

			*guard = next;

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			if !guard.contains_key(key) {
				return Ok(());
			}

			let mut next = guard.clone();

			next.remove(key);
			self.persist_locked(&next)?;

			*guard = next;

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn values_survive_reopen() {
		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let path = dir.path().join("nested").join("tokens.json");
		let store = FileStore::open(&path).expect("File store should open.");

		store.set("frontbet_tokens_v1", "{\"accessToken\":\"a\"}".into()).await.expect("Write.");

		let reopened = FileStore::open(&path).expect("File store should reopen.");

		assert_eq!(
			reopened.get("frontbet_tokens_v1").await.expect("Read."),
			Some("{\"accessToken\":\"a\"}".into()),
		);

		reopened.remove("frontbet_tokens_v1").await.expect("Remove.");

		let emptied = FileStore::open(&path).expect("File store should reopen after removal.");

		assert_eq!(emptied.get("frontbet_tokens_v1").await.expect("Read."), None);
	}

	#[tokio::test]
	async fn failed_writes_leave_memory_untouched() {
		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let parent = dir.path().join("nested");
		let store = FileStore::open(parent.join("tokens.json")).expect("File store should open.");

		store.set("frontbet_tokens_v1", "old".into()).await.expect("Write.");

		fs::remove_dir_all(&parent).expect("Parent directory should be removed.");
		fs::write(&parent, "blocker").expect("Blocking file should be written.");

		let err = store
			.set("frontbet_tokens_v1", "new".into())
			.await
			.expect_err("Writes under a file should fail.");

		assert!(matches!(err, StoreError::Backend { .. }));
		assert_eq!(store.get("frontbet_tokens_v1").await.expect("Read."), Some("old".into()));

		store.remove("frontbet_tokens_v1").await.expect_err("Removal should fail the same way.");

		assert_eq!(store.get("frontbet_tokens_v1").await.expect("Read."), Some("old".into()));
	}

	#[test]
	fn corrupt_files_surface_serialization_errors() {
		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let path = dir.path().join("tokens.json");

		fs::write(&path, "not json").expect("Fixture should be written.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshots should fail to open.");

		assert!(matches!(err, StoreError::Serialization { .. }));
	}
}
