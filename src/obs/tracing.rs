// crates.io
use tracing::{Span, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::FlowKind};

/// Future wrapped in a [`FlowSpan`].
pub type InstrumentedFlow<F> = Instrumented<F>;

/// Span attached to one executor call or refresh exchange.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: Span,
}
impl FlowSpan {
	/// Opens a `frontbet_client.flow` span for `kind`, tagged with the calling `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("frontbet_client.flow", flow = kind.as_str(), stage) }
	}

	/// Runs `fut` inside the span; no guard is held across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
