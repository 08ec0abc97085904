//! Token store: the single source of truth for the current token pair.
//!
//! Every operation degrades instead of failing. A missing, unreadable, or corrupt record reads as
//! the empty pair, failed writes are logged and dropped, and provider failures read as "no token",
//! so higher layers never special-case storage problems.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{AccessTokenProvider, ProviderRegistry, TokenPair, TokenPatch, TokenSecret},
	store::{KeyValueStore, MemoryStore, NoopStore},
};

/// Persists the token pair under one key and resolves access tokens for outgoing requests.
pub struct TokenStore {
	backend: Arc<dyn KeyValueStore>,
	key: String,
	providers: ProviderRegistry,
	write_guard: AsyncMutex<()>,
	fallback_noted: AtomicBool,
}
impl TokenStore {
	/// Storage key holding the serialized token pair.
	pub const DEFAULT_KEY: &'static str = "frontbet_tokens_v1";

	/// Creates a store persisting through `backend`.
	pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
		Self {
			backend,
			key: Self::DEFAULT_KEY.into(),
			providers: ProviderRegistry::default(),
			write_guard: AsyncMutex::new(()),
			fallback_noted: AtomicBool::new(false),
		}
	}

	/// Creates a store that keeps the pair in process memory.
	pub fn in_memory() -> Self {
		Self::new(Arc::new(MemoryStore::default()))
	}

	/// Creates a store with no durable backend; only a registered provider can supply tokens.
	pub fn detached() -> Self {
		Self::new(Arc::new(NoopStore))
	}

	/// Overrides the storage key.
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();

		self
	}

	/// Storage key in use.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Provider registry consulted before the persisted access token.
	pub fn providers(&self) -> &ProviderRegistry {
		&self.providers
	}

	/// Returns the persisted pair, or the empty pair when absent or unreadable.
	pub async fn load_tokens(&self) -> TokenPair {
		let raw = match self.backend.get(&self.key).await {
			Ok(Some(raw)) => raw,
			Ok(None) => return TokenPair::default(),
			Err(e) => {
				tracing::warn!(error = %e, key = %self.key, "Token record could not be read.");

				return TokenPair::default();
			},
		};

		match serde_json::from_str(&raw) {
			Ok(pair) => pair,
			Err(e) => {
				tracing::warn!(error = %e, key = %self.key, "Token record is corrupt; ignoring it.");

				TokenPair::default()
			},
		}
	}

	/// Writes `pair` verbatim; failures are logged and swallowed.
	pub async fn save_tokens(&self, pair: &TokenPair) {
		let serialized = match serde_json::to_string(pair) {
			Ok(serialized) => serialized,
			Err(e) => {
				tracing::warn!(error = %e, "Token record could not be serialized.");

				return;
			},
		};

		if let Err(e) = self.backend.set(&self.key, serialized).await {
			tracing::warn!(error = %e, key = %self.key, "Token record could not be written.");
		}
	}

	/// Merges `patch` over the stored pair and writes the result.
	pub async fn set_tokens(&self, patch: impl Into<TokenPatch>) {
		let _write = self.write_guard.lock().await;
		let merged = patch.into().apply(self.load_tokens().await);

		self.save_tokens(&merged).await;
	}

	/// Removes the stored pair; safe to call repeatedly.
	pub async fn clear_tokens(&self) {
		let _write = self.write_guard.lock().await;

		if let Err(e) = self.backend.remove(&self.key).await {
			tracing::warn!(error = %e, key = %self.key, "Token record could not be removed.");
		}
	}

	/// Returns the persisted refresh token; an empty value reads as none.
	pub async fn refresh_token(&self) -> Option<TokenSecret> {
		self.load_tokens().await.refresh_token.and_then(|t| TokenSecret::non_empty(t.expose()))
	}

	/// Installs an external provider, or removes the current one when `None`.
	pub fn register_access_token_provider(&self, provider: Option<Arc<dyn AccessTokenProvider>>) {
		self.providers.register(provider);
	}

	/// Resolves the token for the next request: the provider's token when it yields one,
	/// otherwise the persisted access token.
	pub async fn access_token(&self) -> Option<TokenSecret> {
		if self.providers.is_registered() {
			if let Some(token) = self.providers.resolve().await {
				return Some(token);
			}
		} else if !self.fallback_noted.swap(true, Ordering::Relaxed) {
			tracing::debug!(
				"No access token provider registered; falling back to persisted tokens."
			);
		}

		self.load_tokens().await.access_token.and_then(|t| TokenSecret::non_empty(t.expose()))
	}
}
impl Debug for TokenStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenStore")
			.field("key", &self.key)
			.field("providers", &self.providers)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::convert::Infallible;
	// self
	use super::*;
	use crate::{
		auth::provider_fn,
		store::{StoreError, StoreFuture},
	};

	struct BrokenStore;
	impl KeyValueStore for BrokenStore {
		fn get<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, Option<String>> {
			Box::pin(async { Err(StoreError::Backend { message: "quota exceeded".into() }) })
		}

		fn set<'a>(&'a self, _key: &'a str, _value: String) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "quota exceeded".into() }) })
		}

		fn remove<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, ()> {
			Box::pin(async { Err(StoreError::Backend { message: "quota exceeded".into() }) })
		}
	}

	#[tokio::test]
	async fn set_tokens_merges_partial_updates() {
		let store = TokenStore::in_memory();

		store.set_tokens(TokenPatch::new().access_token("a")).await;
		store.set_tokens(TokenPatch::new().refresh_token("b")).await;

		assert_eq!(store.load_tokens().await, TokenPair::new("a", "b"));
		assert_eq!(store.refresh_token().await, Some(TokenSecret::new("b")));
	}

	#[tokio::test]
	async fn clear_tokens_is_idempotent() {
		let store = TokenStore::in_memory();

		store.set_tokens(TokenPair::new("a", "b")).await;
		store.clear_tokens().await;
		store.clear_tokens().await;

		assert!(store.load_tokens().await.is_empty());
		assert_eq!(store.access_token().await, None);
	}

	#[tokio::test]
	async fn corrupt_records_read_as_empty() {
		let backend = MemoryStore::default();
		let store = TokenStore::new(Arc::new(backend.clone()));

		backend.insert_raw(TokenStore::DEFAULT_KEY, "{not json");

		assert!(store.load_tokens().await.is_empty());
	}

	#[tokio::test]
	async fn backend_failures_never_surface() {
		let store = TokenStore::new(Arc::new(BrokenStore));

		store.set_tokens(TokenPatch::new().access_token("a")).await;
		store.clear_tokens().await;

		assert!(store.load_tokens().await.is_empty());
		assert_eq!(store.access_token().await, None);
	}

	#[tokio::test]
	async fn provider_token_takes_priority_over_persisted_token() {
		let store = TokenStore::in_memory();

		store.set_tokens(TokenPair::new("persisted", "refresh")).await;
		store.register_access_token_provider(Some(provider_fn(|| {
			Ok::<_, Infallible>(Some("ext-token".into()))
		})));

		assert_eq!(store.access_token().await, Some(TokenSecret::new("ext-token")));

		store.register_access_token_provider(Some(provider_fn(|| Ok::<_, Infallible>(None))));

		assert_eq!(store.access_token().await, Some(TokenSecret::new("persisted")));
	}

	#[tokio::test]
	async fn empty_persisted_tokens_read_as_none() {
		let store = TokenStore::in_memory();

		store.set_tokens(TokenPair::new("", "")).await;

		assert_eq!(store.access_token().await, None);
		assert_eq!(store.refresh_token().await, None);
	}

	#[tokio::test]
	async fn detached_store_only_serves_provider_tokens() {
		let store = TokenStore::detached().with_key("custom");

		store.set_tokens(TokenPair::new("a", "b")).await;

		assert!(store.load_tokens().await.is_empty());
		assert_eq!(store.key(), "custom");
	}
}
