//! Login, registration, and session endpoints.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	flows::ApiClient,
	http::ApiHttpClient,
	resources::{self, Wallet, envelope_schema},
	schema::Shape,
};

/// Account lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
	/// Email not yet confirmed.
	PendingVerification,
	/// Account in good standing.
	Active,
	/// Account locked by an operator.
	Suspended,
}

/// Account profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Account id (UUID).
	pub id: String,
	/// Login email.
	pub email: String,
	/// Public handle.
	pub username: String,
	/// Given name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Lifecycle state.
	pub status: UserStatus,
	/// RFC 3339 creation time.
	pub created_at: String,
	/// RFC 3339 last update time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
}
impl User {
	/// Shape of a user object.
	pub fn shape() -> Shape {
		Shape::object([
			("id", Shape::String),
			("email", Shape::String),
			("username", Shape::String),
			("firstName", Shape::String.optional()),
			("lastName", Shape::String.optional()),
			("status", Shape::enumeration(["PENDING_VERIFICATION", "ACTIVE", "SUSPENDED"])),
			("createdAt", Shape::String),
			("updatedAt", Shape::String.optional()),
		])
	}
}

/// Login payload.
#[derive(Clone, Debug, Serialize)]
pub struct Credentials {
	/// Login email.
	pub email: String,
	/// Plain-text password.
	pub password: String,
}
impl Credentials {
	/// Creates a login payload.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}

/// Registration payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	/// Login email.
	pub email: String,
	/// Plain-text password.
	pub password: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Public handle.
	pub username: String,
}

/// Tokens and profile returned by a successful login.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
	/// New access token.
	pub access_token: String,
	/// New refresh token.
	pub refresh_token: String,
	/// Signed-in user.
	pub user: User,
}
impl AuthSession {
	/// Shape of the login payload.
	pub fn shape() -> Shape {
		Shape::object([
			("accessToken", Shape::String),
			("refreshToken", Shape::String),
			("user", User::shape()),
		])
	}

	/// Token pair to hand to [`TokenStore::set_tokens`](crate::auth::TokenStore::set_tokens).
	pub fn tokens(&self) -> TokenPair {
		TokenPair::new(self.access_token.as_str(), self.refresh_token.as_str())
	}
}

/// Result of a registration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Registration {
	/// Human-readable confirmation.
	pub message: String,
	/// Created account.
	pub user: User,
	/// Wallet opened for the account, when the backend creates one eagerly.
	#[serde(default)]
	pub wallet: Option<Wallet>,
}
impl Registration {
	/// Shape of the registration payload.
	pub fn shape() -> Shape {
		Shape::object([
			("message", Shape::String),
			("user", User::shape()),
			("wallet", Wallet::shape().optional()),
		])
	}
}

/// Logout confirmation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LogoutAck {
	/// Human-readable confirmation.
	pub message: String,
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// `POST /api/auth/login` without a bearer token.
	///
	/// Tokens are not stored automatically; pass [`AuthSession::tokens`] to the token store.
	pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession> {
		let schema = envelope_schema::<AuthSession>(AuthSession::shape(), false);
		let body = resources::to_body(credentials)?;

		self.post("/api/auth/login", Some(body), &schema, true).await?.require_data()
	}

	/// `POST /api/auth/register` without a bearer token.
	pub async fn register(&self, request: &RegisterRequest) -> Result<Registration> {
		let schema = envelope_schema::<Registration>(Registration::shape(), false);
		let body = resources::to_body(request)?;

		self.post("/api/auth/register", Some(body), &schema, true).await?.require_data()
	}

	/// `GET /api/auth/me`.
	pub async fn me(&self) -> Result<Option<User>> {
		let schema = envelope_schema::<User>(User::shape(), false);

		Ok(self.get("/api/auth/me", &[], &schema, false).await?.data)
	}

	/// `POST /api/auth/logout`.
	pub async fn logout(&self) -> Result<Option<LogoutAck>> {
		let schema =
			envelope_schema::<LogoutAck>(Shape::object([("message", Shape::String)]), false);

		Ok(self.post("/api/auth/logout", None, &schema, false).await?.data)
	}
}
