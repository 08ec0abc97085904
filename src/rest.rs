//! Thin REST helpers over the executor: method shorthands and query-string serialization.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	flows::{ApiClient, RequestOptions, ResponseBody},
	http::{ApiHttpClient, Method},
	schema::Schema,
};

/// Serializes query parameters in the order given.
///
/// `null` values are skipped, arrays expand to one `key[]=item` pair per item, objects are
/// JSON-encoded, and scalars use their plain string form. Keys and values are form-url-encoded.
pub fn serialize_params(params: &[(&str, Value)]) -> String {
	let mut parts = Vec::new();

	for (key, value) in params {
		let key = encode(key);

		match value {
			Value::Null => {},
			Value::Array(items) =>
				for item in items {
					parts.push(format!("{key}[]={}", encode(&scalar_string(item))));
				},
			Value::Object(_) => parts.push(format!("{key}={}", encode(&value.to_string()))),
			scalar => parts.push(format!("{key}={}", encode(&scalar_string(scalar)))),
		}
	}

	parts.join("&")
}

/// Appends serialized `params` to `path`, using `&` when the path already has a query.
pub fn build_url(path: &str, params: &[(&str, Value)]) -> String {
	let query = serialize_params(params);

	if query.is_empty() {
		return path.to_owned();
	}

	let separator = if path.contains('?') { '&' } else { '?' };

	format!("{path}{separator}{query}")
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// `GET path?params`, validated with `schema`.
	pub async fn get<S>(
		&self,
		path: &str,
		params: &[(&str, Value)],
		schema: &S,
		skip_auth: bool,
	) -> Result<S::Output>
	where
		S: ?Sized + Schema,
	{
		let options = RequestOptions::new(Method::Get).skip_auth(skip_auth);

		self.api_fetch_with(&build_url(path, params), options, schema).await
	}

	/// `POST path` with an optional JSON body, validated with `schema`.
	pub async fn post<S>(
		&self,
		path: &str,
		body: Option<Value>,
		schema: &S,
		skip_auth: bool,
	) -> Result<S::Output>
	where
		S: ?Sized + Schema,
	{
		self.api_fetch_with(path, with_body(Method::Post, body, skip_auth), schema).await
	}

	/// `PUT path` with an optional JSON body, validated with `schema`.
	pub async fn put<S>(
		&self,
		path: &str,
		body: Option<Value>,
		schema: &S,
		skip_auth: bool,
	) -> Result<S::Output>
	where
		S: ?Sized + Schema,
	{
		self.api_fetch_with(path, with_body(Method::Put, body, skip_auth), schema).await
	}

	/// `DELETE path`, validated with `schema`.
	pub async fn delete<S>(&self, path: &str, schema: &S, skip_auth: bool) -> Result<S::Output>
	where
		S: ?Sized + Schema,
	{
		let options = RequestOptions::new(Method::Delete).skip_auth(skip_auth);

		self.api_fetch_with(path, options, schema).await
	}

	/// Untyped `GET path?params`.
	pub async fn get_json(
		&self,
		path: &str,
		params: &[(&str, Value)],
		skip_auth: bool,
	) -> Result<ResponseBody> {
		let options = RequestOptions::new(Method::Get).skip_auth(skip_auth);

		self.api_fetch(&build_url(path, params), options).await
	}

	/// Untyped `POST path`.
	pub async fn post_json(
		&self,
		path: &str,
		body: Option<Value>,
		skip_auth: bool,
	) -> Result<ResponseBody> {
		self.api_fetch(path, with_body(Method::Post, body, skip_auth)).await
	}

	/// Untyped `PUT path`.
	pub async fn put_json(
		&self,
		path: &str,
		body: Option<Value>,
		skip_auth: bool,
	) -> Result<ResponseBody> {
		self.api_fetch(path, with_body(Method::Put, body, skip_auth)).await
	}

	/// Untyped `DELETE path`.
	pub async fn delete_json(&self, path: &str, skip_auth: bool) -> Result<ResponseBody> {
		self.api_fetch(path, RequestOptions::new(Method::Delete).skip_auth(skip_auth)).await
	}
}

fn with_body(method: Method, body: Option<Value>, skip_auth: bool) -> RequestOptions {
	let options = RequestOptions::new(method).skip_auth(skip_auth);

	match body {
		Some(body) => options.json(body),
		None => options,
	}
}

fn encode(raw: &str) -> String {
	form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn scalar_string(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn params_skip_nulls_and_expand_arrays() {
		let query = serialize_params(&[
			("status", json!("PENDING")),
			("skip", Value::Null),
			("ids", json!([1, "b"])),
			("page", json!(2)),
			("live", json!(true)),
		]);

		assert_eq!(query, "status=PENDING&ids[]=1&ids[]=b&page=2&live=true");
	}

	#[test]
	fn params_encode_objects_and_reserved_characters() {
		let query = serialize_params(&[("filter", json!({ "a": 1 })), ("q", json!("a b&c"))]);

		assert_eq!(query, "filter=%7B%22a%22%3A1%7D&q=a+b%26c");
	}

	#[test]
	fn build_url_picks_the_separator() {
		assert_eq!(build_url("/api/bets", &[]), "/api/bets");
		assert_eq!(build_url("/api/bets", &[("skip", Value::Null)]), "/api/bets");
		assert_eq!(build_url("/api/bets", &[("page", json!(1))]), "/api/bets?page=1");
		assert_eq!(build_url("/api/bets?x=1", &[("page", json!(1))]), "/api/bets?x=1&page=1");
	}
}
