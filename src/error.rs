//! Client-level error types shared by the executor, refresh coordinator, and validators.

// self
use crate::{
	_prelude::*,
	schema::{ValidationDirection, ValidationError, ValidationIssues},
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical API error exposed by public APIs.
///
/// Every variant maps onto an HTTP-style status through [`Error::status`], so UI code can keep
/// treating failures as `{ message, status, details }` triples.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response or request payload failed schema validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// The configured request timeout elapsed before the call completed.
	#[error("Request timed out.")]
	Timeout,
	/// The caller's cancellation token fired before the call completed.
	#[error("Request was cancelled.")]
	Cancelled,
	/// Upstream returned a non-success status.
	#[error("HTTP {status}.")]
	Http {
		/// Response status code.
		status: u16,
		/// Parsed JSON error body, or the raw text when the body is not JSON.
		details: Option<Details>,
	},
	/// Upstream answered 2xx with a JSON content type but an unparseable body.
	#[error("Invalid JSON response.")]
	BadResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Status used for timeouts and cancellations.
	pub const STATUS_TIMEOUT: u16 = 408;
	/// Status used for an unrecoverable unauthorized response.
	pub const STATUS_UNAUTHORIZED: u16 = 401;
	/// Status used when the server breaks its response contract.
	pub const STATUS_BAD_RESPONSE: u16 = 502;
	/// Status used for request-side validation failures.
	pub const STATUS_BAD_REQUEST: u16 = 400;
	/// Status used for local failures that never reached a server.
	pub const STATUS_INTERNAL: u16 = 500;

	/// HTTP-style status code describing the failure.
	pub fn status(&self) -> u16 {
		match self {
			Self::Timeout | Self::Cancelled => Self::STATUS_TIMEOUT,
			Self::Http { status, .. } => *status,
			Self::BadResponse { .. } => Self::STATUS_BAD_RESPONSE,
			Self::Validation(err) => match err.direction {
				ValidationDirection::Request => Self::STATUS_BAD_REQUEST,
				ValidationDirection::Response => Self::STATUS_BAD_RESPONSE,
			},
			Self::Config(_) | Self::Transport(_) => Self::STATUS_INTERNAL,
		}
	}

	/// Structured payload attached to the failure, if any.
	pub fn details(&self) -> Option<Details> {
		match self {
			Self::Http { details, .. } => details.clone(),
			Self::Validation(err) => Some(Details::Issues(err.issues.clone())),
			_ => None,
		}
	}

	/// Returns `true` for a 401 that survived the refresh-and-retry cycle.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Http { status, .. } if *status == Self::STATUS_UNAUTHORIZED)
	}

	/// Returns `true` when the call was aborted by a timeout or cancellation.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout | Self::Cancelled)
	}

	pub(crate) fn validation(direction: ValidationDirection, issues: ValidationIssues) -> Self {
		ValidationError { direction, issues }.into()
	}
}

/// Structured error payload carried by [`Error::Http`] and [`Error::Validation`].
#[derive(Clone, Debug, PartialEq)]
pub enum Details {
	/// JSON error body returned by the server.
	Json(Value),
	/// Raw response text for non-JSON error bodies.
	Text(String),
	/// Field-level validation issues.
	Issues(ValidationIssues),
}
impl Details {
	/// Renders the payload as a JSON value (issues use the nested `_errors` layout).
	pub fn to_value(&self) -> Value {
		match self {
			Self::Json(value) => value.clone(),
			Self::Text(text) => Value::String(text.clone()),
			Self::Issues(issues) => issues.format(),
		}
	}
}

/// Configuration failures raised while building clients or requests.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Environment or explicit configuration sources could not be read.
	#[error("Configuration could not be loaded.")]
	Load(#[from] config::ConfigError),
	/// Configured API base URL cannot be parsed.
	#[error("API base URL `{value}` is invalid.")]
	InvalidBaseUrl {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Configured request timeout is not a non-negative integer.
	#[error("Request timeout `{value}` is not a whole number of milliseconds.")]
	InvalidTimeout {
		/// Raw configured value.
		value: String,
	},
	/// A request path could not be resolved into a URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidRequestUrl {
		/// Resolved URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The JSON request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The transport gave up after the request timeout elapsed.
	#[error("The API call exceeded its timeout.")]
	TimedOut,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::TimedOut } else { Self::network(e) }
	}
}
