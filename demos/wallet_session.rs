//! Signs in against a mock backend, reads the wallet, and recovers from an expired access token
//! through the refresh endpoint with the default reqwest transport.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use frontbet_client::{
	auth::{TokenPatch, TokenStore},
	config::ApiConfig,
	flows::ApiClient,
	resources::Credentials,
	session::Session,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).header("content-type", "application/json").body(
				"{\"success\":true,\"data\":{\"accessToken\":\"expired\",\"refreshToken\":\"demo-refresh\",\
				\"user\":{\"id\":\"u-1\",\"email\":\"demo@example.com\",\"username\":\"demo\",\
				\"status\":\"ACTIVE\",\"createdAt\":\"2025-01-01T00:00:00Z\"}}}",
			);
		})
		.await;
	let rejected_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/wallets/me").header("authorization", "Bearer expired");
			then.status(401);
		})
		.await;
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":{\"accessToken\":\"demo-access\"}}");
		})
		.await;
	let wallet_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/wallets/me").header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(
				"{\"success\":true,\"data\":{\"id\":\"w-1\",\"userId\":\"u-1\",\
				\"balance\":{\"amount\":2500,\"currency\":\"BRL\"},\"createdAt\":\"2025-01-01T00:00:00Z\"}}",
			);
		})
		.await;
	let tokens = Arc::new(TokenStore::in_memory());
	let client = ApiClient::new(ApiConfig::new(Url::parse(&server.base_url())?), tokens.clone());
	let session = Session::new(tokens.clone());
	let signed_in = client.login(&Credentials::new("demo@example.com", "demo-password")).await?;

	tokens.set_tokens(TokenPatch::from(signed_in.tokens())).await;

	match client.my_wallet().await {
		Ok(Some(wallet)) =>
			println!("Balance: {} cents ({:?}).", wallet.balance.amount, wallet.balance.currency),
		Ok(None) => println!("No wallet yet."),
		Err(e) => session.handle_api_error(&e).await,
	}

	println!("Refresh exchanges performed: {}.", client.refresh_metrics().backend_calls());

	login_mock.assert_async().await;
	rejected_mock.assert_async().await;
	refresh_mock.assert_async().await;
	wallet_mock.assert_async().await;

	Ok(())
}
