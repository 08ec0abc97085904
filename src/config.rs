//! Client configuration loaded from the environment.
//!
//! The base URL is taken from the first of `NEXT_PUBLIC_API_BASE_URL`,
//! `PUBLIC_BACKEND_API_BASE_URL`, and `URL_BACKEND` that is set, falling back to
//! [`ApiConfig::DEFAULT_BASE_URL`]. `API_TIMEOUT_MS` sets the request timeout; `0` or an unset
//! variable disables it.

// crates.io
use config::{Config, Environment};
// self
use crate::{_prelude::*, error::ConfigError};

/// Connection settings shared by the executor and the refresh coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
	/// Base URL that relative request paths are appended to.
	pub base_url: Url,
	/// Timeout applied to calls that carry no cancellation token.
	pub timeout: Option<Duration>,
}
impl ApiConfig {
	/// Base URL used when no environment variable provides one.
	pub const DEFAULT_BASE_URL: &'static str = "https://backbet.onrender.com";
	/// Environment variables consulted for the base URL, in priority order.
	pub const BASE_URL_VARS: [&'static str; 3] =
		["NEXT_PUBLIC_API_BASE_URL", "PUBLIC_BACKEND_API_BASE_URL", "URL_BACKEND"];
	/// Environment variable holding the request timeout in milliseconds.
	pub const TIMEOUT_VAR: &'static str = "API_TIMEOUT_MS";

	/// Creates a configuration without a timeout.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, timeout: None }
	}

	/// Sets the request timeout; a zero duration disables it.
	pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout.filter(|value| !value.is_zero());

		self
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		let vars = std::env::vars()
			.filter(|(name, _)| Self::BASE_URL_VARS.contains(&name.as_str()) || name == Self::TIMEOUT_VAR)
			.collect();

		Self::from_source(vars)
	}

	/// Reads the configuration from an explicit variable map (names as in the environment).
	pub fn from_source(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
		let raw: RawConfig = Config::builder()
			.add_source(Environment::default().source(Some(vars)))
			.build()?
			.try_deserialize()?;
		let base = [raw.next_public_api_base_url, raw.public_backend_api_base_url, raw.url_backend]
			.into_iter()
			.flatten()
			.map(|value| value.trim().to_owned())
			.find(|value| !value.is_empty())
			.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_owned());
		let base_url = Url::parse(&base)
			.map_err(|source| ConfigError::InvalidBaseUrl { value: base.clone(), source })?;
		let timeout = match raw.api_timeout_ms.as_deref().map(str::trim) {
			None | Some("") => None,
			Some(value) => Some(Duration::from_millis(
				value
					.parse::<u64>()
					.map_err(|_| ConfigError::InvalidTimeout { value: value.to_owned() })?,
			)),
		};

		Ok(Self::new(base_url).with_timeout(timeout))
	}

	/// Resolves a request path: absolute `http(s)` URLs pass through, anything else is appended
	/// to the base URL.
	pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
		if path.starts_with("http") {
			return Url::parse(path)
				.map_err(|source| ConfigError::InvalidRequestUrl { url: path.to_owned(), source });
		}

		join_base(&self.base_url, path)
	}
}

/// Appends `path` to `base` without doubling the separating slash.
pub(crate) fn join_base(base: &Url, path: &str) -> Result<Url, ConfigError> {
	let base = base.as_str().trim_end_matches('/');
	let joined = if path.starts_with('/') || path.is_empty() {
		format!("{base}{path}")
	} else {
		format!("{base}/{path}")
	};

	Url::parse(&joined).map_err(|source| ConfigError::InvalidRequestUrl { url: joined, source })
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
	next_public_api_base_url: Option<String>,
	public_backend_api_base_url: Option<String>,
	url_backend: Option<String>,
	api_timeout_ms: Option<String>,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	#[test]
	fn defaults_apply_without_variables() {
		let config = ApiConfig::from_source(HashMap::new()).expect("Empty sources should load.");

		assert_eq!(config.base_url.as_str(), "https://backbet.onrender.com/");
		assert_eq!(config.timeout, None);
	}

	#[test]
	fn base_url_variables_follow_priority_order() {
		let config = ApiConfig::from_source(vars(&[
			("URL_BACKEND", "https://legacy.example.com"),
			("PUBLIC_BACKEND_API_BASE_URL", "https://public.example.com"),
		]))
		.expect("Configured sources should load.");

		assert_eq!(config.base_url.as_str(), "https://public.example.com/");

		let config = ApiConfig::from_source(vars(&[
			("NEXT_PUBLIC_API_BASE_URL", "https://next.example.com"),
			("URL_BACKEND", "https://legacy.example.com"),
		]))
		.expect("Configured sources should load.");

		assert_eq!(config.base_url.as_str(), "https://next.example.com/");
	}

	#[test]
	fn timeout_parses_milliseconds_and_zero_disables_it() {
		let config = ApiConfig::from_source(vars(&[("API_TIMEOUT_MS", "2500")]))
			.expect("Numeric timeouts should load.");

		assert_eq!(config.timeout, Some(Duration::from_millis(2500)));

		let config = ApiConfig::from_source(vars(&[("API_TIMEOUT_MS", "0")]))
			.expect("Zero timeouts should load.");

		assert_eq!(config.timeout, None);

		let err = ApiConfig::from_source(vars(&[("API_TIMEOUT_MS", "soon")]))
			.expect_err("Non-numeric timeouts should be rejected.");

		assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
	}

	#[test]
	fn resolve_appends_relative_paths_and_keeps_absolute_urls() {
		let config = ApiConfig::new(
			Url::parse("https://api.example.com/v1/").expect("Fixture URL should parse."),
		);

		assert_eq!(
			config.resolve("/api/wallets/me").expect("Relative paths should resolve.").as_str(),
			"https://api.example.com/v1/api/wallets/me",
		);
		assert_eq!(
			config.resolve("https://other.example.com/x").expect("Absolute URLs pass.").as_str(),
			"https://other.example.com/x",
		);
	}
}
