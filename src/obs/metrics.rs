// self
use crate::obs::{FlowKind, FlowOutcome};

/// Bumps `frontbet_client_flow_total`; a no-op unless the `metrics` feature is on.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"frontbet_client_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_without_an_installed_recorder_are_dropped() {
		for kind in [FlowKind::Fetch, FlowKind::Refresh] {
			for outcome in [FlowOutcome::Attempt, FlowOutcome::Success, FlowOutcome::Failure] {
				record_flow_outcome(kind, outcome);
			}
		}
	}
}
