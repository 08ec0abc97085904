//! Authenticated request execution built on the token store and refresh coordinator.

pub mod common;
pub mod refresh;

mod fetch;

pub use common::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenStore},
	config::ApiConfig,
	http::ApiHttpClient,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Executes API calls against one backend on behalf of one token store.
///
/// The client owns the HTTP transport, the shared [`TokenStore`], the resolved [`ApiConfig`], and
/// the [`RefreshCoordinator`] that deduplicates refreshes across every clone of the client.
pub struct ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// HTTP client used for every outbound request.
	pub http_client: Arc<C>,
	/// Token store consulted for bearer tokens and updated by refreshes.
	pub tokens: Arc<TokenStore>,
	config: ApiConfig,
	refresher: Arc<RefreshCoordinator<C>>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(
		config: ApiConfig,
		tokens: Arc<TokenStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		let http_client = http_client.into();
		let refresher = Arc::new(
			RefreshCoordinator::new(http_client.clone(), tokens.clone())
				.with_timeout(config.timeout),
		);

		Self { http_client, tokens, config, refresher }
	}

	/// Resolved configuration.
	pub fn config(&self) -> &ApiConfig {
		&self.config
	}

	/// Shared refresh coordinator.
	pub fn refresher(&self) -> &Arc<RefreshCoordinator<C>> {
		&self.refresher
	}

	/// Counters describing refresh activity.
	pub fn refresh_metrics(&self) -> &Arc<RefreshMetrics> {
		self.refresher.metrics()
	}

	/// Refreshes the access token against the configured backend.
	pub async fn refresh_tokens(&self) -> Option<TokenSecret> {
		self.refresher.refresh_tokens(&self.config.base_url).await
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ApiConfig, tokens: Arc<TokenStore>) -> Self {
		Self::with_http_client(config, tokens, ReqwestHttpClient::default())
	}

	/// Creates a client configured from the environment with an in-memory token store.
	pub fn from_env() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().build()?;

		Ok(Self::with_http_client(
			ApiConfig::from_env()?,
			Arc::new(TokenStore::in_memory()),
			ReqwestHttpClient::with_client(client),
		))
	}
}
impl<C> Clone for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			tokens: self.tokens.clone(),
			config: self.config.clone(),
			refresher: self.refresher.clone(),
		}
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("tokens", &self.tokens)
			.field("refresher", &self.refresher)
			.finish()
	}
}
