//! Typed resource clients for the betting backend.
//!
//! Every endpoint answers with a `{ success, data, meta }` envelope. The clients validate the
//! envelope against a declarative [`Shape`] (so every mismatched field is reported at once),
//! deserialize it, and hand back `data`.

pub mod auth;
pub mod bets;
pub mod games;
pub mod wallet;

pub use auth::*;
pub use bets::*;
pub use wallet::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	schema::{Shape, Typed, ValidationDirection, ValidationIssue, ValidationIssues},
};

/// Standard response envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Envelope<T> {
	/// Backend success flag.
	pub success: bool,
	/// Payload; absent or `null` on some endpoints.
	#[serde(default = "Option::default")]
	pub data: Option<T>,
	/// Free-form metadata (timestamps, request ids).
	#[serde(default)]
	pub meta: Option<Value>,
}
impl<T> Envelope<T> {
	/// Returns `data`, failing response validation when it is missing.
	pub fn require_data(self) -> Result<T> {
		self.data.ok_or_else(|| {
			Error::validation(
				ValidationDirection::Response,
				ValidationIssues::from(vec![ValidationIssue::new("data", "required")]),
			)
		})
	}
}

/// Builds the envelope shape around `data`; `nullable` also accepts `"data": null`.
pub fn envelope_shape(data: Shape, nullable: bool) -> Shape {
	let data = if nullable { data.nullable() } else { data };

	Shape::object([
		("success", Shape::Bool),
		("data", data.optional()),
		("meta", Shape::object(Vec::<(String, Shape)>::new()).optional()),
	])
}

/// Schema validating an envelope shape and deserializing it into `Envelope<T>`.
pub fn envelope_schema<T>(data: Shape, nullable: bool) -> Typed<Envelope<T>>
where
	T: DeserializeOwned,
{
	Typed::new(envelope_shape(data, nullable))
}

pub(crate) fn to_body<T>(body: &T) -> Result<Value>
where
	T: ?Sized + Serialize,
{
	Ok(serde_json::to_value(body).map_err(|source| ConfigError::RequestBody { source })?)
}
