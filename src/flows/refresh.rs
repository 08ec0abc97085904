//! Single-flight token refresh.
//!
//! [`RefreshCoordinator::refresh_tokens`] collapses concurrent refresh requests into one exchange.
//! The first caller takes the guard and performs the exchange; callers that arrive while it is in
//! flight wait on the guard and then reuse the recorded outcome instead of contacting the backend
//! again. A completion counter tells the two apart: a caller whose observed counter moved while it
//! waited knows an exchange finished on its behalf. Dropping the leader's future releases the guard
//! without recording an outcome, so the next waiter performs the exchange itself.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret, TokenStore},
	config,
	http::{ApiHttpClient, HttpRequest, Method},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Backend path exchanging a refresh token for a new access token.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Deduplicates refresh exchanges for one token store.
pub struct RefreshCoordinator<C>
where
	C: ?Sized + ApiHttpClient,
{
	http_client: Arc<C>,
	tokens: Arc<TokenStore>,
	timeout: Option<Duration>,
	guard: AsyncMutex<()>,
	completed: AtomicU64,
	last_outcome: Mutex<Option<TokenSecret>>,
	metrics: Arc<RefreshMetrics>,
}
impl<C> RefreshCoordinator<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a coordinator that refreshes `tokens` through `http_client`.
	pub fn new(http_client: Arc<C>, tokens: Arc<TokenStore>) -> Self {
		Self {
			http_client,
			tokens,
			timeout: None,
			guard: AsyncMutex::new(()),
			completed: AtomicU64::new(0),
			last_outcome: Mutex::new(None),
			metrics: Default::default(),
		}
	}

	/// Applies a timeout to the refresh exchange.
	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;

		self
	}

	/// Counters describing refresh activity.
	pub fn metrics(&self) -> &Arc<RefreshMetrics> {
		&self.metrics
	}

	/// Returns a fresh access token, or `None` when no token can be obtained.
	///
	/// A registered access-token provider wins over the backend endpoint. Otherwise the persisted
	/// refresh token is posted to `{api_base}/api/auth/refresh`; on success the new pair is
	/// persisted (keeping the previous refresh token when the server sends none). Failures never
	/// surface as errors.
	pub async fn refresh_tokens(&self, api_base: &Url) -> Option<TokenSecret> {
		const KIND: FlowKind = FlowKind::Refresh;

		self.metrics.record_attempt();

		let observed = self.completed.load(Ordering::Acquire);
		let _singleflight = self.guard.lock().await;

		if self.completed.load(Ordering::Acquire) != observed {
			self.metrics.record_joined();

			return self.last_outcome.lock().clone();
		}

		let span = FlowSpan::new(KIND, "refresh_tokens");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span.instrument(self.exchange(api_base)).await;

		*self.last_outcome.lock() = outcome.clone();
		self.completed.fetch_add(1, Ordering::AcqRel);

		match outcome {
			Some(_) => {
				self.metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			None => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		outcome
	}

	async fn exchange(&self, api_base: &Url) -> Option<TokenSecret> {
		if let Some(token) = self.tokens.providers().resolve().await {
			tracing::debug!("Access token provider supplied a refreshed token.");

			return Some(token);
		}

		let Some(previous) = self.tokens.refresh_token().await else {
			tracing::debug!("No refresh token is stored; skipping refresh.");

			return None;
		};
		let url = match config::join_base(api_base, REFRESH_PATH) {
			Ok(url) => url,
			Err(e) => {
				tracing::warn!(error = %e, "Refresh endpoint URL is invalid.");

				return None;
			},
		};
		let mut request = HttpRequest::new(Method::Post, url);

		request.headers = vec![
			("accept".into(), "application/json".into()),
			("content-type".into(), "application/json".into()),
		];
		request.body =
			Some(serde_json::json!({ "refreshToken": previous.expose() }).to_string());
		request.timeout = self.timeout;

		self.metrics.record_backend_call();

		let response = match self.http_client.execute(request).await {
			Ok(response) => response,
			Err(e) => {
				tracing::warn!(error = %e, "Refresh request failed.");

				return None;
			},
		};

		if !response.is_success() {
			tracing::warn!(status = response.status, "Refresh endpoint rejected the refresh token.");

			return None;
		}

		let mut de = serde_json::Deserializer::from_str(&response.body);
		let body: RefreshResponse = match serde_path_to_error::deserialize(&mut de) {
			Ok(body) => body,
			Err(e) => {
				tracing::warn!(error = %e, path = %e.path(), "Refresh response is malformed.");

				return None;
			},
		};
		let Some(access_token) = body.data.access_token.and_then(TokenSecret::non_empty) else {
			tracing::warn!("Refresh response carried no access token.");

			return None;
		};
		let refresh_token =
			body.data.refresh_token.and_then(TokenSecret::non_empty).unwrap_or(previous);

		self.tokens
			.set_tokens(TokenPair {
				access_token: Some(access_token.clone()),
				refresh_token: Some(refresh_token),
			})
			.await;

		Some(access_token)
	}
}
impl<C> Debug for RefreshCoordinator<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("timeout", &self.timeout)
			.field("completed", &self.completed.load(Ordering::Relaxed))
			.field("metrics", &self.metrics)
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
	#[serde(default)]
	data: RefreshData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshData {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		convert::Infallible,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// self
	use super::*;
	use crate::{
		auth::provider_fn,
		http::{HttpFuture, HttpResponse},
	};

	struct ScriptedClient {
		calls: AtomicUsize,
		delay: Duration,
		response: HttpResponse,
		last_request: Mutex<Option<HttpRequest>>,
	}
	impl ScriptedClient {
		fn new(status: u16, body: &str) -> Arc<Self> {
			Self::delayed(status, body, Duration::ZERO)
		}

		fn delayed(status: u16, body: &str, delay: Duration) -> Arc<Self> {
			Arc::new(Self {
				calls: AtomicUsize::new(0),
				delay,
				response: HttpResponse::new(status, body)
					.with_header("content-type", "application/json"),
				last_request: Mutex::new(None),
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl ApiHttpClient for ScriptedClient {
		fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
			Box::pin(async move {
				self.calls.fetch_add(1, Ordering::SeqCst);
				*self.last_request.lock() = Some(request);

				if !self.delay.is_zero() {
					tokio::time::sleep(self.delay).await;
				}

				Ok(self.response.clone())
			})
		}
	}

	fn base() -> Url {
		Url::parse("https://api.example.com/").expect("Fixture URL should parse.")
	}

	async fn seeded_store() -> Arc<TokenStore> {
		let tokens = Arc::new(TokenStore::in_memory());

		tokens.set_tokens(TokenPair::new("stale", "r-1")).await;

		tokens
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_exchange() {
		let client = ScriptedClient::delayed(
			200,
			"{\"data\":{\"accessToken\":\"fresh\",\"refreshToken\":\"r-2\"}}",
			Duration::from_millis(50),
		);
		let tokens = seeded_store().await;
		let coordinator = RefreshCoordinator::new(client.clone(), tokens.clone());
		let base = base();
		let outcomes = futures::future::join_all(
			(0..5).map(|_| coordinator.refresh_tokens(&base)),
		)
		.await;

		assert_eq!(client.calls(), 1);
		assert!(outcomes.iter().all(|token| token == &Some(TokenSecret::new("fresh"))));
		assert_eq!(tokens.load_tokens().await, TokenPair::new("fresh", "r-2"));
		assert_eq!(coordinator.metrics().attempts(), 5);
		assert_eq!(coordinator.metrics().backend_calls(), 1);
		assert_eq!(coordinator.metrics().joined(), 4);
		assert_eq!(coordinator.metrics().successes(), 1);
	}

	#[tokio::test]
	async fn exchange_posts_refresh_token_and_keeps_it_when_not_rotated() {
		let client = ScriptedClient::new(200, "{\"data\":{\"accessToken\":\"fresh\"}}");
		let tokens = seeded_store().await;
		let coordinator = RefreshCoordinator::new(client.clone(), tokens.clone())
			.with_timeout(Some(Duration::from_secs(5)));
		let base = Url::parse("https://api.example.com/v1//").expect("Fixture URL should parse.");

		assert_eq!(coordinator.refresh_tokens(&base).await, Some(TokenSecret::new("fresh")));
		assert_eq!(tokens.load_tokens().await, TokenPair::new("fresh", "r-1"));

		let request =
			client.last_request.lock().clone().expect("The exchange should record its request.");

		assert_eq!(request.method, Method::Post);
		assert_eq!(request.url.as_str(), "https://api.example.com/v1/api/auth/refresh");
		assert_eq!(request.body.as_deref(), Some("{\"refreshToken\":\"r-1\"}"));
		assert_eq!(request.header("content-type"), Some("application/json"));
		assert_eq!(request.timeout, Some(Duration::from_secs(5)));
	}

	#[tokio::test]
	async fn failures_yield_none_and_leave_tokens_untouched() {
		for (status, body) in [
			(500, "{\"error\":\"boom\"}"),
			(200, "not json"),
			(200, "{\"data\":{}}"),
			(200, "{\"data\":{\"accessToken\":\"\"}}"),
		] {
			let client = ScriptedClient::new(status, body);
			let tokens = seeded_store().await;
			let coordinator = RefreshCoordinator::new(client.clone(), tokens.clone());

			assert_eq!(coordinator.refresh_tokens(&base()).await, None, "body: {body}");
			assert_eq!(tokens.load_tokens().await, TokenPair::new("stale", "r-1"));
			assert_eq!(coordinator.metrics().failures(), 1);
		}
	}

	#[tokio::test]
	async fn missing_refresh_token_skips_the_backend() {
		let client = ScriptedClient::new(200, "{\"data\":{\"accessToken\":\"fresh\"}}");
		let coordinator = RefreshCoordinator::new(client.clone(), Arc::new(TokenStore::in_memory()));

		assert_eq!(coordinator.refresh_tokens(&base()).await, None);
		assert_eq!(client.calls(), 0);
	}

	#[tokio::test]
	async fn empty_refresh_token_skips_the_backend() {
		let client = ScriptedClient::new(200, "{\"data\":{\"accessToken\":\"fresh\"}}");
		let tokens = Arc::new(TokenStore::in_memory());

		tokens.set_tokens(TokenPair::new("", "")).await;

		let coordinator = RefreshCoordinator::new(client.clone(), tokens.clone());

		assert_eq!(coordinator.refresh_tokens(&base()).await, None);
		assert_eq!(client.calls(), 0);
		assert_eq!(tokens.access_token().await, None);
	}

	#[tokio::test]
	async fn registered_provider_short_circuits_the_backend() {
		let client = ScriptedClient::new(200, "{\"data\":{\"accessToken\":\"fresh\"}}");
		let tokens = seeded_store().await;

		tokens.register_access_token_provider(Some(provider_fn(|| {
			Ok::<_, Infallible>(Some("provided".into()))
		})));

		let coordinator = RefreshCoordinator::new(client.clone(), tokens);

		assert_eq!(coordinator.refresh_tokens(&base()).await, Some(TokenSecret::new("provided")));
		assert_eq!(client.calls(), 0);
	}

	#[tokio::test]
	async fn dropped_leader_releases_the_guard() {
		let client = ScriptedClient::delayed(
			200,
			"{\"data\":{\"accessToken\":\"fresh\"}}",
			Duration::from_millis(100),
		);
		let coordinator = RefreshCoordinator::new(client.clone(), seeded_store().await);
		let base = base();
		let abandoned =
			tokio::time::timeout(Duration::from_millis(10), coordinator.refresh_tokens(&base)).await;

		assert!(abandoned.is_err());
		assert_eq!(coordinator.refresh_tokens(&base).await, Some(TokenSecret::new("fresh")));
		assert_eq!(client.calls(), 2);
	}
}
