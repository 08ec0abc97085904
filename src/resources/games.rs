//! Games catalog endpoint.

// self
use crate::{_prelude::*, flows::ApiClient, http::ApiHttpClient};

impl<C> ApiClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// `GET /api/games`; returns the raw `data` array, empty when absent or not an array.
	pub async fn games(&self) -> Result<Vec<Value>> {
		let body = self.get_json("/api/games", &[], false).await?.into_value();

		Ok(match body {
			Value::Object(mut envelope) => match envelope.remove("data") {
				Some(Value::Array(games)) => games,
				_ => Vec::new(),
			},
			_ => Vec::new(),
		})
	}
}
