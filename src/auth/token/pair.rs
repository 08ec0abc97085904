//! Access/refresh token pair and the partial update applied by `set_tokens`.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Persisted token record; serialized as `{"accessToken": …, "refreshToken": …}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
	/// Short-lived credential sent with each authenticated request.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Longer-lived credential used only to mint new access tokens.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
}
impl TokenPair {
	/// Builds a pair holding both tokens.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self {
			access_token: Some(access_token.into()),
			refresh_token: Some(refresh_token.into()),
		}
	}

	/// Returns `true` when neither token is present.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_none() && self.refresh_token.is_none()
	}
}

/// Partial update merged over the stored [`TokenPair`].
///
/// Each field is tri-state: `None` keeps the stored value, `Some(None)` clears it, and
/// `Some(Some(token))` replaces it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenPatch {
	/// Update for the access token.
	pub access_token: Option<Option<TokenSecret>>,
	/// Update for the refresh token.
	pub refresh_token: Option<Option<TokenSecret>>,
}
impl TokenPatch {
	/// Creates an empty patch that leaves both fields untouched.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the access token.
	pub fn access_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.access_token = Some(Some(token.into()));

		self
	}

	/// Replaces the refresh token.
	pub fn refresh_token(mut self, token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(Some(token.into()));

		self
	}

	/// Clears the access token while keeping the refresh token.
	pub fn clear_access_token(mut self) -> Self {
		self.access_token = Some(None);

		self
	}

	/// Clears the refresh token while keeping the access token.
	pub fn clear_refresh_token(mut self) -> Self {
		self.refresh_token = Some(None);

		self
	}

	/// Shallow-merges the patch over `current`.
	pub fn apply(self, current: TokenPair) -> TokenPair {
		TokenPair {
			access_token: self.access_token.unwrap_or(current.access_token),
			refresh_token: self.refresh_token.unwrap_or(current.refresh_token),
		}
	}
}
impl From<TokenPair> for TokenPatch {
	fn from(pair: TokenPair) -> Self {
		Self { access_token: Some(pair.access_token), refresh_token: Some(pair.refresh_token) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn patches_merge_field_by_field() {
		let first = TokenPatch::new().access_token("a").apply(TokenPair::default());
		let second = TokenPatch::new().refresh_token("b").apply(first);

		assert_eq!(second, TokenPair::new("a", "b"));

		let cleared = TokenPatch::new().clear_access_token().apply(second);

		assert_eq!(cleared.access_token, None);
		assert_eq!(cleared.refresh_token, Some(TokenSecret::new("b")));
	}

	#[test]
	fn pairs_use_camel_case_and_skip_missing_fields() {
		let pair = TokenPair { access_token: Some("tok".into()), refresh_token: None };
		let json = serde_json::to_string(&pair).expect("Token pairs should serialize.");

		assert_eq!(json, "{\"accessToken\":\"tok\"}");

		let parsed: TokenPair = serde_json::from_str("{\"accessToken\":null,\"refreshToken\":\"r\"}")
			.expect("Null members should deserialize as absent.");

		assert_eq!(parsed.access_token, None);
		assert_eq!(parsed.refresh_token, Some(TokenSecret::new("r")));
	}

	#[test]
	fn full_pairs_overwrite_both_fields() {
		let stored = TokenPair::new("old-access", "old-refresh");
		let next = TokenPatch::from(TokenPair { access_token: Some("new".into()), refresh_token: None })
			.apply(stored);

		assert_eq!(next, TokenPair { access_token: Some("new".into()), refresh_token: None });
	}
}
