//! External access-token providers (identity platforms, host applications) and their registry.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Error type a provider may report; the registry logs it and treats it as "no token".
pub type ProviderError = Box<dyn StdError + Send + Sync>;

/// Boxed future returned by [`AccessTokenProvider::access_token`].
pub type ProviderFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Option<String>, ProviderError>> + 'a + Send>>;

/// Source of access tokens that takes priority over the persisted token pair.
///
/// Providers that manage their own refresh cycle (for example a hosted identity platform session)
/// should return a fresh token on every call; the refresh coordinator asks the provider before it
/// falls back to the backend refresh endpoint.
pub trait AccessTokenProvider
where
	Self: Send + Sync,
{
	/// Returns the current access token, `None` when signed out.
	fn access_token(&self) -> ProviderFuture<'_>;
}

/// Adapter turning a synchronous closure into an [`AccessTokenProvider`].
pub struct SyncProvider<F>(F);
impl<F> SyncProvider<F> {
	/// Wraps `f`.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F, E> AccessTokenProvider for SyncProvider<F>
where
	F: Send + Sync + Fn() -> Result<Option<String>, E>,
	E: Into<ProviderError>,
{
	fn access_token(&self) -> ProviderFuture<'_> {
		let outcome = (self.0)().map_err(Into::<ProviderError>::into);

		Box::pin(async move { outcome })
	}
}

/// Adapter turning an async closure into an [`AccessTokenProvider`].
pub struct AsyncProvider<F>(F);
impl<F> AsyncProvider<F> {
	/// Wraps `f`.
	pub fn new(f: F) -> Self {
		Self(f)
	}
}
impl<F, Fut, E> AccessTokenProvider for AsyncProvider<F>
where
	F: Send + Sync + Fn() -> Fut,
	Fut: 'static + Send + Future<Output = Result<Option<String>, E>>,
	E: 'static + Into<ProviderError>,
{
	fn access_token(&self) -> ProviderFuture<'_> {
		let pending = (self.0)();

		Box::pin(async move { pending.await.map_err(Into::<ProviderError>::into) })
	}
}

/// Shorthand for registering a synchronous provider.
pub fn provider_fn<F, E>(f: F) -> Arc<dyn AccessTokenProvider>
where
	F: 'static + Send + Sync + Fn() -> Result<Option<String>, E>,
	E: 'static + Into<ProviderError>,
{
	Arc::new(SyncProvider::new(f))
}

/// Shorthand for registering an async provider.
pub fn async_provider_fn<F, Fut, E>(f: F) -> Arc<dyn AccessTokenProvider>
where
	F: 'static + Send + Sync + Fn() -> Fut,
	Fut: 'static + Send + Future<Output = Result<Option<String>, E>>,
	E: 'static + Into<ProviderError>,
{
	Arc::new(AsyncProvider::new(f))
}

/// Holds at most one registered provider.
///
/// The registry is owned by a [`TokenStore`](crate::auth::TokenStore) rather than living in a
/// global, so each client (and each test) gets its own provider slot.
#[derive(Default)]
pub struct ProviderRegistry(RwLock<Option<Arc<dyn AccessTokenProvider>>>);
impl ProviderRegistry {
	/// Installs `provider`, or removes the current one when `None`.
	pub fn register(&self, provider: Option<Arc<dyn AccessTokenProvider>>) {
		*self.0.write() = provider;
	}

	/// Removes the registered provider.
	pub fn clear(&self) {
		self.register(None);
	}

	/// Returns the registered provider, if any.
	pub fn get(&self) -> Option<Arc<dyn AccessTokenProvider>> {
		self.0.read().clone()
	}

	/// Returns `true` while a provider is registered.
	pub fn is_registered(&self) -> bool {
		self.0.read().is_some()
	}

	/// Asks the registered provider for a token; failures and empty tokens become `None`.
	pub async fn resolve(&self) -> Option<TokenSecret> {
		let provider = self.get()?;

		match provider.access_token().await {
			Ok(token) => token.and_then(TokenSecret::non_empty),
			Err(e) => {
				tracing::warn!(error = %e, "Access token provider failed; treating as signed out.");

				None
			},
		}
	}
}
impl Debug for ProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistry").field("registered", &self.is_registered()).finish()
	}
}
