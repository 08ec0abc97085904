//! Bet placement and history endpoints.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	flows::ApiClient,
	http::ApiHttpClient,
	resources::{self, Currency, envelope_schema},
	schema::Shape,
};

/// Settlement state of a bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
	/// Awaiting settlement.
	Pending,
	/// Settled as a win.
	Won,
	/// Settled as a loss.
	Lost,
	/// Cancelled before settlement.
	Canceled,
}

/// Single or accumulator bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetType {
	/// One selection.
	Single,
	/// Several selections combined.
	Multiple,
}

/// Placed bet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
	/// Bet id.
	pub id: String,
	/// Bettor id (UUID).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	/// Event the bet is placed on.
	pub event_id: String,
	/// Market within the event.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub market_id: Option<String>,
	/// Selected odd.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub odd_id: Option<String>,
	/// Stake.
	pub amount: f64,
	/// Stake currency.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub currency: Option<Currency>,
	/// Decimal odds at placement.
	pub odds: f64,
	/// Payout if the bet wins.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub potential_return: Option<f64>,
	/// Settlement state.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<BetStatus>,
	/// Bet kind.
	#[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
	pub bet_type: Option<BetType>,
	/// RFC 3339 placement time.
	pub created_at: String,
	/// RFC 3339 settlement time.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resolved_at: Option<String>,
	/// Reason recorded when the bet was cancelled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cancellation_reason: Option<String>,
}
impl Bet {
	/// Shape of a bet object.
	pub fn shape() -> Shape {
		Shape::object([
			("id", Shape::String),
			("userId", Shape::String.optional()),
			("eventId", Shape::String),
			("marketId", Shape::String.optional()),
			("oddId", Shape::String.optional()),
			("amount", Shape::Number),
			("currency", Currency::shape().optional()),
			("odds", Shape::Number),
			("potentialReturn", Shape::Number.optional()),
			("status", Shape::enumeration(["PENDING", "WON", "LOST", "CANCELED"]).optional()),
			("type", Shape::enumeration(["SINGLE", "MULTIPLE"]).optional()),
			("createdAt", Shape::String),
			("resolvedAt", Shape::String.nullable().optional()),
			("cancellationReason", Shape::String.nullable().optional()),
		])
	}
}

/// Page of bets.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct BetList {
	/// Bets on this page.
	pub bets: Vec<Bet>,
	/// Total number of bets across pages.
	#[serde(default)]
	pub total: Option<u64>,
}
impl BetList {
	/// Shape of a bet list payload.
	pub fn shape() -> Shape {
		Shape::object([("bets", Shape::array(Bet::shape())), ("total", Shape::Integer.optional())])
	}
}

/// Bet placement payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetRequest {
	/// Event to bet on.
	pub event_id: String,
	/// Market within the event.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub market_id: Option<String>,
	/// Selected odd.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub odd_id: Option<String>,
	/// Stake.
	pub amount: f64,
	/// Bet kind.
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub bet_type: Option<BetType>,
	/// Stake currency.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub currency: Option<Currency>,
}
impl PlaceBetRequest {
	/// Creates a single-selection payload.
	pub fn new(event_id: impl Into<String>, amount: f64) -> Self {
		Self {
			event_id: event_id.into(),
			market_id: None,
			odd_id: None,
			amount,
			bet_type: None,
			currency: None,
		}
	}
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// `POST /api/bets`.
	pub async fn place_bet(&self, request: &PlaceBetRequest) -> Result<Option<Bet>> {
		let schema = envelope_schema::<Bet>(Bet::shape(), false);
		let body = resources::to_body(request)?;

		Ok(self.post("/api/bets", Some(body), &schema, false).await?.data)
	}

	/// `POST /api/bets/cancel`.
	pub async fn cancel_bet(&self, bet_id: &str) -> Result<Option<Bet>> {
		let schema = envelope_schema::<Bet>(Bet::shape(), false);
		let body = serde_json::json!({ "betId": bet_id });

		Ok(self.post("/api/bets/cancel", Some(body), &schema, false).await?.data)
	}

	/// `GET /api/bets/{id}`; the id is url-encoded.
	pub async fn bet(&self, id: &str) -> Result<Option<Bet>> {
		let schema = envelope_schema::<Bet>(Bet::shape(), false);
		let id = form_urlencoded::byte_serialize(id.as_bytes()).collect::<String>();

		Ok(self.get(&format!("/api/bets/{id}"), &[], &schema, false).await?.data)
	}

	/// `GET /api/bets?params`; an absent payload reads as no bets.
	pub async fn list_bets(&self, params: &[(&str, Value)]) -> Result<Vec<Bet>> {
		let schema = envelope_schema::<BetList>(BetList::shape(), false);
		let envelope = self.get("/api/bets", params, &schema, false).await?;

		Ok(envelope.data.map(|list| list.bets).unwrap_or_default())
	}
}
