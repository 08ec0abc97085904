//! Spans and counters for API calls.
//!
//! Executor calls and refresh exchanges each run inside a `frontbet_client.flow` span carrying
//! `flow` and `stage` fields. The `metrics` feature adds the `frontbet_client_flow_total{flow,
//! outcome}` counter.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Which part of the client a span or counter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// `api_fetch` and everything built on it.
	Fetch,
	/// The shared `/api/auth/refresh` exchange.
	Refresh,
}
impl FlowKind {
	/// Label used for the `flow` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Fetch => "fetch",
			FlowKind::Refresh => "refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Value of the `outcome` label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Counted on entry.
	Attempt,
	/// Counted when a body or a fresh token came back.
	Success,
	/// The call returned an error, or the refresh yielded no token.
	Failure,
}
impl FlowOutcome {
	/// Label used for the `outcome` field.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
