//! Authenticated request executor with a single refresh-and-retry cycle.

// std
use std::pin::pin;
// crates.io
use futures::future::{self, Either};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{Details, TransportError},
	flows::{ApiClient, RequestOptions, ResponseBody},
	http::{ApiHttpClient, HttpRequest, HttpResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	schema::{Schema, ValidationDirection},
};

/// Status that triggers the refresh-and-retry cycle.
const UNAUTHORIZED: u16 = 401;

/// Executor progress for one call.
///
/// `Sent` and `Retried` hold the response of the first and second attempt. At most one
/// `RefreshPending` is ever entered, which bounds every call to two transport requests.
#[derive(Debug)]
enum FetchState {
	Initial,
	Sent(HttpResponse),
	Unauthorized(HttpResponse),
	RefreshPending(HttpResponse),
	Retried(HttpResponse),
	Done(HttpResponse),
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Performs an API call and returns the untyped body.
	///
	/// Relative `path`s are appended to the configured base URL; paths starting with `http` are
	/// used as-is. Unless `options.skip_auth` is set, a bearer token is attached and a 401 triggers
	/// one refresh followed by one retry.
	pub async fn api_fetch(&self, path: &str, options: RequestOptions) -> Result<ResponseBody> {
		const KIND: FlowKind = FlowKind::Fetch;

		let span = FlowSpan::new(KIND, "api_fetch");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute_flow(path, options)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(e) => {
				tracing::debug!(error = %e, status = e.status(), "API call failed.");
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	/// Performs an API call and validates the body with `schema`.
	///
	/// Empty bodies are validated as JSON `null` and text bodies as JSON strings. A mismatch
	/// surfaces as a response-direction [`Error::Validation`] carrying every issue.
	pub async fn api_fetch_with<S>(
		&self,
		path: &str,
		options: RequestOptions,
		schema: &S,
	) -> Result<S::Output>
	where
		S: ?Sized + Schema,
	{
		let body = self.api_fetch(path, options).await?;

		schema.parse(&body.into_value()).map_err(|issues| {
			tracing::warn!(path, issues = %issues, "Response validation failed.");

			Error::validation(ValidationDirection::Response, issues)
		})
	}

	async fn execute_flow(&self, path: &str, options: RequestOptions) -> Result<ResponseBody> {
		let url = self.config.resolve(path)?;
		let mut state = FetchState::Initial;

		loop {
			state = match state {
				FetchState::Initial => {
					let token = if options.skip_auth {
						None
					} else {
						self.tokens.access_token().await
					};

					FetchState::Sent(self.send(&url, &options, token.as_ref()).await?)
				},
				FetchState::Sent(response) =>
					if response.status == UNAUTHORIZED {
						FetchState::Unauthorized(response)
					} else {
						FetchState::Done(response)
					},
				FetchState::Unauthorized(response) =>
					if options.skip_auth {
						FetchState::Done(response)
					} else {
						FetchState::RefreshPending(response)
					},
				FetchState::RefreshPending(response) => {
					let refreshed = cancellable(
						options.signal.as_ref(),
						self.refresher.refresh_tokens(&self.config.base_url),
					)
					.await?;

					match refreshed {
						Some(token) =>
							FetchState::Retried(self.send(&url, &options, Some(&token)).await?),
						None => {
							tracing::debug!("Refresh produced no token; keeping the 401 response.");

							FetchState::Done(response)
						},
					}
				},
				FetchState::Retried(response) => FetchState::Done(response),
				FetchState::Done(response) => return interpret(response),
			};
		}
	}

	async fn send(
		&self,
		url: &Url,
		options: &RequestOptions,
		token: Option<&TokenSecret>,
	) -> Result<HttpResponse> {
		let mut request = HttpRequest::new(options.method, url.clone());

		request.headers = options.build_headers(token);
		request.body = options.json.as_ref().map(Value::to_string);
		request.timeout = if options.signal.is_none() { self.config.timeout } else { None };

		match cancellable(options.signal.as_ref(), self.http_client.execute(request)).await? {
			Ok(response) => Ok(response),
			Err(TransportError::TimedOut) => Err(Error::Timeout),
			Err(e) => Err(e.into()),
		}
	}
}

/// Races `fut` against the caller's cancellation token.
async fn cancellable<F>(signal: Option<&CancellationToken>, fut: F) -> Result<F::Output>
where
	F: Future,
{
	let Some(signal) = signal else {
		return Ok(fut.await);
	};

	if signal.is_cancelled() {
		return Err(Error::Cancelled);
	}

	let fut = pin!(fut);
	let cancelled = pin!(signal.cancelled());

	match future::select(fut, cancelled).await {
		Either::Left((output, _)) => Ok(output),
		Either::Right(_) => Err(Error::Cancelled),
	}
}

/// Turns a final response into a body or an error.
fn interpret(response: HttpResponse) -> Result<ResponseBody> {
	let is_json = response.is_json();
	let HttpResponse { status, body, .. } = response;

	if !(200..300).contains(&status) {
		let details = if body.is_empty() {
			None
		} else if is_json {
			serde_json::from_str(&body).ok().map(Details::Json)
		} else {
			Some(Details::Text(body))
		};

		return Err(Error::Http { status, details });
	}
	if body.is_empty() {
		return Ok(ResponseBody::Empty);
	}
	if !is_json {
		return Ok(ResponseBody::Text(body));
	}

	let mut de = serde_json::Deserializer::from_str(&body);

	serde_path_to_error::deserialize(&mut de)
		.map(ResponseBody::Json)
		.map_err(|source| Error::BadResponse { source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn json(status: u16, body: &str) -> HttpResponse {
		HttpResponse::new(status, body).with_header("content-type", "application/json")
	}

	#[test]
	fn success_bodies_follow_content_type() {
		assert_eq!(
			interpret(json(200, "{\"ok\":true}")).expect("JSON bodies should parse."),
			ResponseBody::Json(serde_json::json!({ "ok": true })),
		);
		assert_eq!(
			interpret(HttpResponse::new(200, "pong").with_header("content-type", "text/plain"))
				.expect("Text bodies should pass through."),
			ResponseBody::Text("pong".into()),
		);
		assert_eq!(
			interpret(json(204, "")).expect("Empty bodies should succeed."),
			ResponseBody::Empty,
		);
	}

	#[test]
	fn malformed_success_json_is_a_bad_response() {
		let err = interpret(json(200, "{\"ok\":")).expect_err("Truncated JSON should fail.");

		assert!(matches!(err, Error::BadResponse { .. }));
		assert_eq!(err.status(), 502);
	}

	#[test]
	fn error_bodies_become_details() {
		let err = interpret(json(422, "{\"message\":\"stake too low\"}"))
			.expect_err("Non-2xx responses should fail.");

		assert_eq!(err.status(), 422);
		assert_eq!(
			err.details(),
			Some(Details::Json(serde_json::json!({ "message": "stake too low" }))),
		);

		let err = interpret(HttpResponse::new(503, "maintenance"))
			.expect_err("Non-2xx responses should fail.");

		assert_eq!(err.details(), Some(Details::Text("maintenance".into())));

		let err = interpret(json(500, "<html>")).expect_err("Non-2xx responses should fail.");

		assert_eq!(err.details(), None);
	}

	#[tokio::test]
	async fn cancellable_short_circuits_on_cancelled_tokens() {
		let signal = CancellationToken::new();

		assert_eq!(cancellable(Some(&signal), async { 7 }).await.expect("Live tokens pass."), 7);

		signal.cancel();

		let err = cancellable(Some(&signal), async { 7 })
			.await
			.expect_err("Cancelled tokens should abort.");

		assert!(matches!(err, Error::Cancelled));
		assert_eq!(cancellable(None, async { 7 }).await.expect("No token never cancels."), 7);
	}
}
