// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// self
use frontbet_client::{
	auth::{TokenPair, TokenStore},
	config::ApiConfig,
	error::{Error, TransportError},
	flows::{ApiClient, RequestOptions},
	http::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse},
	url::Url,
};

enum Script {
	Respond(u16, &'static str),
	TimeOut,
	Refuse,
}

struct FakeHttpClient {
	script: Script,
	requests: parking_lot::Mutex<Vec<HttpRequest>>,
	calls: AtomicUsize,
}
impl FakeHttpClient {
	fn new(script: Script) -> Self {
		Self { script, requests: Default::default(), calls: AtomicUsize::new(0) }
	}
}
impl ApiHttpClient for FakeHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.requests.lock().push(request);

			match self.script {
				Script::Respond(status, body) => Ok(HttpResponse::new(status, body)
					.with_header("Content-Type", "application/json")),
				Script::TimeOut => Err(TransportError::TimedOut),
				Script::Refuse => Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"connection refused",
				))),
			}
		})
	}
}

fn client(script: Script) -> ApiClient<FakeHttpClient> {
	let config = ApiConfig::new(
		Url::parse("https://backbet.example.com/").expect("Fixture URL should parse."),
	);

	ApiClient::with_http_client(config, Arc::new(TokenStore::in_memory()), FakeHttpClient::new(script))
}

#[tokio::test]
async fn custom_transports_receive_resolved_requests() {
	let client = client(Script::Respond(200, "{\"ok\":true}"));

	client.tokens.set_tokens(TokenPair::new("tok", "ref")).await;

	let body = client
		.api_fetch("/api/ping", RequestOptions::default().header("X-Trace", "abc"))
		.await
		.expect("Scripted responses should succeed.");
	let requests = client.http_client.requests.lock();
	let request = requests.first().expect("One request should be recorded.");

	assert_eq!(body.as_json(), Some(&serde_json::json!({ "ok": true })));
	assert_eq!(request.url.as_str(), "https://backbet.example.com/api/ping");
	assert_eq!(request.header("authorization"), Some("Bearer tok"));
	assert_eq!(request.header("accept"), Some("application/json"));
	assert_eq!(request.header("x-trace"), Some("abc"));
	assert_eq!(request.body, None);
}

#[tokio::test]
async fn transport_failures_map_onto_the_error_taxonomy() {
	let err = client(Script::TimeOut)
		.api_fetch("/api/ping", RequestOptions::default())
		.await
		.expect_err("Transport timeouts should fail.");

	assert!(matches!(err, Error::Timeout));
	assert_eq!(err.status(), 408);

	let err = client(Script::Refuse)
		.api_fetch("/api/ping", RequestOptions::default())
		.await
		.expect_err("Refused connections should fail.");

	assert!(matches!(err, Error::Transport(_)));
	assert_eq!(err.status(), 500);
}

#[tokio::test]
async fn unauthorized_without_refresh_token_skips_refresh() {
	let client = client(Script::Respond(401, ""));
	let err = client
		.api_fetch("/api/auth/me", RequestOptions::default())
		.await
		.expect_err("401 without a refresh token should surface.");

	assert!(err.is_unauthorized());
	assert_eq!(client.http_client.calls.load(Ordering::SeqCst), 1);
	assert_eq!(client.refresh_metrics().backend_calls(), 0);
	assert_eq!(client.refresh_metrics().failures(), 1);
}
