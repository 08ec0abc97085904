//! Demonstrates plugging a non-reqwest transport into the client.
//!
//! 1. Implement [`ApiHttpClient`] and return fully collected [`HttpResponse`]s.
//! 2. Report elapsed deadlines as [`TransportError::TimedOut`] so callers see a 408.
//! 3. Pass the transport to [`ApiClient::with_http_client`].

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use frontbet_client::{
	auth::{TokenPair, TokenStore},
	config::ApiConfig,
	error::TransportError,
	flows::{ApiClient, RequestOptions},
	http::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ApiConfig::new(Url::parse("https://backbet.example.com")?);
	let tokens = Arc::new(TokenStore::in_memory());

	tokens.set_tokens(TokenPair::new("demo-access", "demo-refresh")).await;

	let client = ApiClient::with_http_client(config, tokens, CannedHttpClient);
	let body = client.api_fetch("/api/games", RequestOptions::default()).await?;

	println!("Canned games payload: {body:?}.");

	let err = client
		.api_fetch("/api/slow", RequestOptions::default())
		.await
		.expect_err("The canned transport times out on /api/slow.");

	println!("Slow endpoint failed with status {}: {err}", err.status());

	Ok(())
}

/// Answers from a fixed table instead of the network.
struct CannedHttpClient;
impl ApiHttpClient for CannedHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			match request.url.path() {
				"/api/slow" => Err(TransportError::TimedOut),
				"/api/games" if request.header("authorization") == Some("Bearer demo-access") =>
					Ok(HttpResponse::new(200, "{\"success\":true,\"data\":[{\"id\":\"g-1\"}]}")
						.with_header("content-type", "application/json")),
				_ => Ok(HttpResponse::new(404, "not found")),
			}
		})
	}
}
