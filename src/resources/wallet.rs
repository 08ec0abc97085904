//! Wallet balance endpoint.

// self
use crate::{
	_prelude::*,
	flows::ApiClient,
	http::ApiHttpClient,
	resources::envelope_schema,
	schema::Shape,
};

/// Supported currencies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
	/// Brazilian real.
	#[default]
	#[serde(rename = "BRL")]
	Brl,
	/// US dollar.
	#[serde(rename = "USD")]
	Usd,
	/// Euro.
	#[serde(rename = "EUR")]
	Eur,
}
impl Currency {
	/// Shape accepting a currency code.
	pub fn shape() -> Shape {
		Shape::enumeration(["BRL", "USD", "EUR"])
	}
}

/// Monetary amount in minor units (cents).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
	/// Amount in cents.
	pub amount: i64,
	/// Currency; `BRL` when omitted.
	#[serde(default)]
	pub currency: Currency,
}
impl Money {
	/// Shape of a money object.
	pub fn shape() -> Shape {
		Shape::object([("amount", Shape::Integer), ("currency", Currency::shape().optional())])
	}
}

/// Player wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
	/// Wallet id (UUID).
	pub id: String,
	/// Owner id (UUID).
	pub user_id: String,
	/// Spendable balance.
	pub balance: Money,
	/// Funds reserved by open bets.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub locked_balance: Option<Money>,
	/// RFC 3339 creation time.
	pub created_at: String,
	/// RFC 3339 last update time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
}
impl Wallet {
	/// Shape of a wallet object.
	pub fn shape() -> Shape {
		Shape::object([
			("id", Shape::String),
			("userId", Shape::String),
			("balance", Money::shape()),
			("lockedBalance", Money::shape().optional()),
			("createdAt", Shape::String),
			("updatedAt", Shape::String.optional()),
		])
	}
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// `GET /api/wallets/me`; `None` when the backend reports no wallet.
	pub async fn my_wallet(&self) -> Result<Option<Wallet>> {
		let schema = envelope_schema::<Wallet>(Wallet::shape(), true);

		Ok(self.get("/api/wallets/me", &[], &schema, false).await?.data)
	}
}
