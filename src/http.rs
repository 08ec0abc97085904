//! Transport primitives for API calls.
//!
//! [`ApiHttpClient`] is the crate's only dependency on an HTTP stack. The executor and the refresh
//! coordinator build a transport-neutral [`HttpRequest`], hand it to the client, and read back an
//! [`HttpResponse`] whose body has already been collected. Implementations must be
//! `Send + Sync + 'static` so a single client can be shared by every in-flight call.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// HTTP methods the client issues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	#[default]
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical upper-case method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully resolved outgoing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
	/// Request method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Header pairs in insertion order; names are lower-case.
	pub headers: Vec<(String, String)>,
	/// Serialized request body.
	pub body: Option<String>,
	/// Per-request timeout enforced by the transport.
	pub timeout: Option<Duration>,
}
impl HttpRequest {
	/// Creates a request with no headers, body, or timeout.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None, timeout: None }
	}

	/// Returns the value of header `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Response returned by an [`ApiHttpClient`], with the body fully read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// Status code.
	pub status: u16,
	/// Response headers keyed by lower-case name.
	pub headers: BTreeMap<String, String>,
	/// Body text; empty when the server sent none.
	pub body: String,
}
impl HttpResponse {
	/// Creates a response with the given status and body and no headers.
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds a header, normalizing its name to lower case.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the `content-type` header, if present.
	pub fn content_type(&self) -> Option<&str> {
		self.headers.get("content-type").map(String::as_str)
	}

	/// Returns `true` when the content type declares a JSON body.
	pub fn is_json(&self) -> bool {
		self.content_type().is_some_and(|value| value.contains("application/json"))
	}
}

/// Abstraction over HTTP transports used by the executor and the refresh coordinator.
///
/// Implementations report a [`TransportError::TimedOut`] when `request.timeout` elapses so the
/// executor can surface it as a 408; every other failure maps to [`TransportError::Network`] or
/// [`TransportError::Io`].
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and collects the full response.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = self.0.request(method, request.url);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}
			if let Some(timeout) = request.timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.text().await?;

			Ok(HttpResponse { status, headers, body })
		})
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn response_helpers_classify_status_and_content_type() {
		let response = HttpResponse::new(201, "{}")
			.with_header("Content-Type", "application/json; charset=utf-8");

		assert!(response.is_success());
		assert!(response.is_json());
		assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
		assert!(!HttpResponse::new(401, "").is_success());
		assert!(!HttpResponse::new(200, "ok").with_header("content-type", "text/plain").is_json());
	}

	#[test]
	fn request_header_lookup_ignores_case() {
		let mut request = HttpRequest::new(
			Method::Post,
			Url::parse("https://api.example.com/api/bets").expect("Fixture URL should parse."),
		);

		request.headers.push(("authorization".into(), "Bearer tok".into()));

		assert_eq!(request.header("Authorization"), Some("Bearer tok"));
		assert_eq!(request.header("content-type"), None);
		assert_eq!(Method::Delete.to_string(), "DELETE");
	}
}
