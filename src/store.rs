//! Durable key-value backends that hold the serialized token record.
//!
//! The token store only ever needs three primitives (`get`, `set`, `remove`) against string keys,
//! mirroring browser local storage. Backends stay async so networked or file-backed stores can
//! suspend without blocking callers.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`KeyValueStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by token persistence layers.
pub trait KeyValueStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Stores or replaces the value under `key`.
	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;

	/// Removes the value under `key`; removing a missing key succeeds.
	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Backend for contexts without durable storage: reads find nothing and writes are discarded.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStore;
impl KeyValueStore for NoopStore {
	fn get<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async { Ok(None) })
	}

	fn set<'a>(&'a self, _key: &'a str, _value: String) -> StoreFuture<'a, ()> {
		Box::pin(async { Ok(()) })
	}

	fn remove<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async { Ok(()) })
	}
}

/// Error type produced by [`KeyValueStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
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
}
