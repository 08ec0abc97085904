//! Schema capability, declarative JSON shapes, and structured validation issues.
//!
//! A [`Schema`] is anything that can turn a parsed JSON value into a typed output or a list of
//! issues. Closures of the form `Fn(&Value) -> Result<T, ValidationIssues>` qualify, as do the
//! declarative [`Shape`] and the serde-backed [`Typed`] wrapper. Object shapes keep checking after
//! the first failure so callers see every mismatched field at once.

// std
use std::marker::PhantomData;
// crates.io
use serde::de::DeserializeOwned;
use serde_json::Map;
// self
use crate::_prelude::*;

/// Validation capability consumed by the executor and [`validate_with_schema`].
pub trait Schema {
	/// Value produced when validation succeeds.
	type Output;

	/// Validates `value`, returning every issue found on failure.
	fn parse(&self, value: &Value) -> Result<Self::Output, ValidationIssues>;
}
impl<F, T> Schema for F
where
	F: Fn(&Value) -> Result<T, ValidationIssues>,
{
	type Output = T;

	fn parse(&self, value: &Value) -> Result<T, ValidationIssues> {
		self(value)
	}
}

/// Validates a caller-supplied payload, raising a request-direction (400) error on mismatch.
pub fn validate_with_schema<S>(schema: &S, payload: &Value) -> Result<S::Output>
where
	S: ?Sized + Schema,
{
	schema.parse(payload).map_err(|issues| Error::validation(ValidationDirection::Request, issues))
}

/// Which side of the wire produced the invalid payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValidationDirection {
	/// Data the client was about to send.
	Request,
	/// Data the server returned.
	Response,
}
impl ValidationDirection {
	/// Returns a stable label suitable for messages and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Request => "Request",
			Self::Response => "Response",
		}
	}
}
impl Display for ValidationDirection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Schema mismatch carrying every field-level issue.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("{direction} validation failed: {issues}.")]
pub struct ValidationError {
	/// Side of the wire that produced the payload.
	pub direction: ValidationDirection,
	/// Every issue reported by the schema.
	pub issues: ValidationIssues,
}

/// One step in the path to an invalid value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
	/// Object member name.
	Key(String),
	/// Array position.
	Index(usize),
}
impl PathSegment {
	fn to_key(&self) -> String {
		match self {
			Self::Key(key) => key.clone(),
			Self::Index(idx) => idx.to_string(),
		}
	}
}

/// A single mismatch located by its path from the payload root.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationIssue {
	/// Path from the payload root; empty for the root itself.
	pub path: Vec<PathSegment>,
	/// Human-readable description of the mismatch.
	pub message: String,
}
impl ValidationIssue {
	/// Creates an issue for a top-level object member.
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self { path: vec![PathSegment::Key(field.into())], message: message.into() }
	}

	/// Creates an issue for the payload root.
	pub fn root(message: impl Into<String>) -> Self {
		Self { path: Vec::new(), message: message.into() }
	}

	/// Creates an issue at an explicit path.
	pub fn at(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
		Self { path, message: message.into() }
	}

	/// Renders the path as `data.items[2].id`; the root renders as `(root)`.
	pub fn path_string(&self) -> String {
		if self.path.is_empty() {
			return "(root)".into();
		}

		let mut buf = String::new();

		for segment in &self.path {
			match segment {
				PathSegment::Key(key) => {
					if !buf.is_empty() {
						buf.push('.');
					}

					buf.push_str(key);
				},
				PathSegment::Index(idx) => buf.push_str(&format!("[{idx}]")),
			}
		}

		buf
	}
}
impl Display for ValidationIssue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}: {}", self.path_string(), self.message)
	}
}

/// Ordered collection of [`ValidationIssue`]s.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationIssues(Vec<ValidationIssue>);
impl ValidationIssues {
	/// Returns `true` when no issues were recorded.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of recorded issues.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterates over the recorded issues in discovery order.
	pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
		self.0.iter()
	}

	/// Appends an issue.
	pub fn push(&mut self, issue: ValidationIssue) {
		self.0.push(issue);
	}

	/// Renders the issues as a nested tree: every node carries an `_errors` array and one child
	/// per path segment, e.g. `{ "_errors": [], "data": { "_errors": [], "id": { "_errors":
	/// ["expected string, received number"] } } }`.
	pub fn format(&self) -> Value {
		let mut root = empty_node();

		for issue in &self.0 {
			insert_issue(&mut root, &issue.path, &issue.message);
		}

		Value::Object(root)
	}
}
impl From<Vec<ValidationIssue>> for ValidationIssues {
	fn from(issues: Vec<ValidationIssue>) -> Self {
		Self(issues)
	}
}
impl IntoIterator for ValidationIssues {
	type IntoIter = std::vec::IntoIter<ValidationIssue>;
	type Item = ValidationIssue;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl Display for ValidationIssues {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		for (idx, issue) in self.0.iter().enumerate() {
			if idx > 0 {
				f.write_str("; ")?;
			}

			write!(f, "{issue}")?;
		}

		Ok(())
	}
}

fn empty_node() -> Map<String, Value> {
	let mut node = Map::new();

	node.insert("_errors".into(), Value::Array(Vec::new()));

	node
}

fn insert_issue(node: &mut Map<String, Value>, path: &[PathSegment], message: &str) {
	match path.split_first() {
		None =>
			if let Some(Value::Array(errors)) = node.get_mut("_errors") {
				errors.push(Value::String(message.to_owned()));
			},
		Some((head, rest)) => {
			let child = node.entry(head.to_key()).or_insert_with(|| Value::Object(empty_node()));

			if let Value::Object(map) = child {
				insert_issue(map, rest, message);
			}
		},
	}
}

/// Declarative JSON shape, similar in spirit to a zod object schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
	/// Accepts any value.
	Any,
	/// Accepts only `null`.
	Null,
	/// Accepts booleans.
	Bool,
	/// Accepts any JSON number.
	Number,
	/// Accepts numbers without a fractional part.
	Integer,
	/// Accepts strings.
	String,
	/// Accepts one of the listed string literals.
	Enum(Vec<String>),
	/// Accepts arrays whose items all match the inner shape.
	Array(Box<Shape>),
	/// Accepts objects; unknown members pass through.
	Object(Vec<(String, Shape)>),
	/// Object member that may be absent.
	Optional(Box<Shape>),
	/// Accepts `null` or the inner shape.
	Nullable(Box<Shape>),
	/// Accepts the first matching alternative.
	OneOf(Vec<Shape>),
}
impl Shape {
	/// Builds an object shape from `(member, shape)` pairs.
	pub fn object<I, K>(fields: I) -> Self
	where
		I: IntoIterator<Item = (K, Shape)>,
		K: Into<String>,
	{
		Self::Object(fields.into_iter().map(|(name, shape)| (name.into(), shape)).collect())
	}

	/// Builds an array shape.
	pub fn array(items: Shape) -> Self {
		Self::Array(Box::new(items))
	}

	/// Builds a string-literal enumeration.
	pub fn enumeration<I, S>(values: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Enum(values.into_iter().map(Into::into).collect())
	}

	/// Marks the shape as an optional object member.
	pub fn optional(self) -> Self {
		Self::Optional(Box::new(self))
	}

	/// Allows `null` in addition to the shape.
	pub fn nullable(self) -> Self {
		Self::Nullable(Box::new(self))
	}

	fn check(&self, value: &Value, path: &mut Vec<PathSegment>, issues: &mut ValidationIssues) {
		match self {
			Self::Any => {},
			Self::Null =>
				if !value.is_null() {
					issues.push(mismatch(path, "null", value));
				},
			Self::Bool =>
				if !value.is_boolean() {
					issues.push(mismatch(path, "boolean", value));
				},
			Self::Number =>
				if !value.is_number() {
					issues.push(mismatch(path, "number", value));
				},
			Self::Integer =>
				if !is_integer(value) {
					issues.push(mismatch(path, "integer", value));
				},
			Self::String =>
				if !value.is_string() {
					issues.push(mismatch(path, "string", value));
				},
			Self::Enum(allowed) => match value.as_str() {
				Some(text) if allowed.iter().any(|candidate| candidate == text) => {},
				Some(text) => issues.push(ValidationIssue::at(
					path.clone(),
					format!("expected one of {}, received `{text}`", allowed.join(", ")),
				)),
				None => issues.push(mismatch(path, "string", value)),
			},
			Self::Array(items) => match value.as_array() {
				Some(values) =>
					for (idx, item) in values.iter().enumerate() {
						path.push(PathSegment::Index(idx));
						items.check(item, path, issues);
						path.pop();
					},
				None => issues.push(mismatch(path, "array", value)),
			},
			Self::Object(fields) => match value.as_object() {
				Some(map) =>
					for (name, shape) in fields {
						path.push(PathSegment::Key(name.clone()));

						match (map.get(name), shape) {
							(None, Self::Optional(_)) => {},
							(None, _) => issues.push(ValidationIssue::at(path.clone(), "required")),
							(Some(member), shape) => shape.check(member, path, issues),
						}

						path.pop();
					},
				None => issues.push(mismatch(path, "object", value)),
			},
			Self::Optional(inner) => inner.check(value, path, issues),
			Self::Nullable(inner) =>
				if !value.is_null() {
					inner.check(value, path, issues);
				},
			Self::OneOf(options) => {
				let matched = options.iter().any(|option| {
					let mut scratch = ValidationIssues::default();

					option.check(value, &mut path.clone(), &mut scratch);

					scratch.is_empty()
				});

				if !matched {
					issues.push(ValidationIssue::at(
						path.clone(),
						format!("{} did not match any allowed shape", describe(value)),
					));
				}
			},
		}
	}
}
impl Schema for Shape {
	type Output = Value;

	fn parse(&self, value: &Value) -> Result<Value, ValidationIssues> {
		let mut issues = ValidationIssues::default();

		self.check(value, &mut Vec::new(), &mut issues);

		if issues.is_empty() { Ok(value.clone()) } else { Err(issues) }
	}
}

fn is_integer(value: &Value) -> bool {
	value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|float| float.fract() == 0.0)
}

fn describe(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

fn mismatch(path: &[PathSegment], expected: &str, value: &Value) -> ValidationIssue {
	ValidationIssue::at(path.to_vec(), format!("expected {expected}, received {}", describe(value)))
}

/// Shape check followed by serde deserialization into `T`.
pub struct Typed<T> {
	shape: Shape,
	_output: PhantomData<fn() -> T>,
}
impl<T> Typed<T>
where
	T: DeserializeOwned,
{
	/// Validates against `shape` before deserializing.
	pub fn new(shape: Shape) -> Self {
		Self { shape, _output: PhantomData }
	}

	/// Relies on serde alone; only the first mismatch is reported.
	pub fn serde_only() -> Self {
		Self::new(Shape::Any)
	}
}
impl<T> Clone for Typed<T> {
	fn clone(&self) -> Self {
		Self { shape: self.shape.clone(), _output: PhantomData }
	}
}
impl<T> Debug for Typed<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Typed").field("shape", &self.shape).finish()
	}
}
impl<T> Schema for Typed<T>
where
	T: DeserializeOwned,
{
	type Output = T;

	fn parse(&self, value: &Value) -> Result<T, ValidationIssues> {
		self.shape.parse(value)?;

		serde_path_to_error::deserialize(value.clone()).map_err(|err| {
			let path = err.path().iter().filter_map(segment_from_serde).collect();

			ValidationIssues::from(vec![ValidationIssue::at(path, err.into_inner().to_string())])
		})
	}
}

fn segment_from_serde(segment: &serde_path_to_error::Segment) -> Option<PathSegment> {
	match segment {
		serde_path_to_error::Segment::Map { key } => Some(PathSegment::Key(key.clone())),
		serde_path_to_error::Segment::Seq { index } => Some(PathSegment::Index(*index)),
		serde_path_to_error::Segment::Enum { variant } => Some(PathSegment::Key(variant.clone())),
		serde_path_to_error::Segment::Unknown => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn wallet_shape() -> Shape {
		Shape::object([
			("id", Shape::String),
			(
				"balance",
				Shape::object([("amount", Shape::Integer), ("currency", Shape::String.optional())]),
			),
			("tags", Shape::array(Shape::String).optional()),
		])
	}

	#[test]
	fn object_shapes_report_every_failing_member() {
		let payload = json!({ "id": 7, "balance": { "amount": "ten" }, "tags": ["a", 1] });
		let issues = wallet_shape().parse(&payload).expect_err("Malformed wallet should fail.");
		let paths: Vec<_> = issues.iter().map(ValidationIssue::path_string).collect();

		assert_eq!(paths, vec!["id", "balance.amount", "tags[1]"]);
	}

	#[test]
	fn missing_required_members_are_reported_and_optional_ones_are_not() {
		let issues = wallet_shape().parse(&json!({})).expect_err("Empty object should fail.");
		let messages: Vec<_> = issues.iter().map(ToString::to_string).collect();

		assert_eq!(messages, vec!["id: required", "balance: required"]);
	}

	#[test]
	fn nullable_enum_and_one_of_shapes_behave_like_their_zod_counterparts() {
		let status = Shape::enumeration(["PENDING", "WON"]).nullable();

		assert!(status.parse(&Value::Null).is_ok());
		assert!(status.parse(&json!("WON")).is_ok());
		assert!(status.parse(&json!("LOST")).is_err());

		let either = Shape::OneOf(vec![Shape::String, Shape::Integer]);

		assert!(either.parse(&json!(3)).is_ok());
		assert!(either.parse(&json!(3.5)).is_err());
	}

	#[test]
	fn format_builds_nested_error_tree() {
		let issues = ValidationIssues::from(vec![
			ValidationIssue::root("bad payload"),
			ValidationIssue::at(
				vec![PathSegment::Key("items".into()), PathSegment::Index(0)],
				"expected string, received number",
			),
		]);
		let tree = issues.format();

		assert_eq!(tree["_errors"][0], "bad payload");
		assert_eq!(tree["items"]["0"]["_errors"][0], "expected string, received number");
	}

	#[test]
	fn typed_schema_deserializes_after_shape_check() {
		#[derive(Debug, Deserialize, PartialEq)]
		struct Balance {
			amount: i64,
		}

		let schema = Typed::<Balance>::new(Shape::object([("amount", Shape::Integer)]));

		assert_eq!(schema.parse(&json!({ "amount": 1500 })), Ok(Balance { amount: 1500 }));
		assert!(schema.parse(&json!({ "amount": "1500" })).is_err());
	}

	#[test]
	fn closures_satisfy_the_schema_capability() {
		let positive = |value: &Value| match value.as_i64() {
			Some(number) if number > 0 => Ok(number),
			_ => Err(ValidationIssues::from(vec![ValidationIssue::root("expected positive")])),
		};
		let err = validate_with_schema(&positive, &json!(-1))
			.expect_err("Negative numbers should be rejected.");

		assert_eq!(validate_with_schema(&positive, &json!(5)).ok(), Some(5));
		assert_eq!(err.status(), 400);
	}
}
