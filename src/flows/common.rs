//! Request options, response bodies, and header assembly shared by the executor.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError, http::Method};

/// Per-call options for [`ApiClient::api_fetch`](crate::flows::ApiClient::api_fetch).
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// Request method; defaults to `GET`.
	pub method: Method,
	/// Caller headers merged over the defaults (names are case-insensitive).
	pub headers: Vec<(String, String)>,
	/// JSON body; sets `content-type: application/json` when present.
	pub json: Option<Value>,
	/// Sends the request without a bearer token and never refreshes.
	pub skip_auth: bool,
	/// Caller cancellation; when set the configured timeout is not applied.
	pub signal: Option<CancellationToken>,
}
impl RequestOptions {
	/// Creates options for `method` with no body.
	pub fn new(method: Method) -> Self {
		Self { method, ..Default::default() }
	}

	/// Overrides the method.
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		set_header(&mut self.headers, name.as_ref(), value.into());

		self
	}

	/// Sets the JSON body.
	pub fn json(mut self, body: Value) -> Self {
		self.json = Some(body);

		self
	}

	/// Serializes `body` and sets it as the JSON body.
	pub fn try_json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let value =
			serde_json::to_value(body).map_err(|source| ConfigError::RequestBody { source })?;

		Ok(self.json(value))
	}

	/// Marks the call as unauthenticated.
	pub fn skip_auth(mut self, skip: bool) -> Self {
		self.skip_auth = skip;

		self
	}

	/// Attaches a cancellation token.
	pub fn signal(mut self, signal: CancellationToken) -> Self {
		self.signal = Some(signal);

		self
	}

	/// Builds the outgoing header list: `accept: application/json`, then caller headers, then
	/// `content-type` for JSON bodies and `authorization` when a token is supplied.
	pub fn build_headers(&self, token: Option<&TokenSecret>) -> Vec<(String, String)> {
		let mut headers = vec![("accept".to_owned(), "application/json".to_owned())];

		for (name, value) in &self.headers {
			set_header(&mut headers, name, value.clone());
		}
		if self.json.is_some() {
			set_header(&mut headers, "content-type", "application/json".into());
		}
		if let Some(token) = token {
			set_header(&mut headers, "authorization", token.bearer());
		}

		headers
	}
}

/// Untyped executor result.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// The server sent no body.
	Empty,
	/// Parsed JSON body.
	Json(Value),
	/// Body of a non-JSON content type.
	Text(String),
}
impl ResponseBody {
	/// Returns `true` for [`ResponseBody::Empty`].
	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Empty)
	}

	/// Returns the JSON payload, if any.
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Self::Json(value) => Some(value),
			_ => None,
		}
	}

	/// Converts the body into the value handed to schemas: `null` when empty and a JSON string
	/// for text bodies.
	pub fn into_value(self) -> Value {
		match self {
			Self::Empty => Value::Null,
			Self::Json(value) => value,
			Self::Text(text) => Value::String(text),
		}
	}
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
	let name = name.to_ascii_lowercase();

	match headers.iter_mut().find(|(key, _)| *key == name) {
		Some(slot) => slot.1 = value,
		None => headers.push((name, value)),
	}
}
