// self
use crate::{_prelude::*, http::Method};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedDispatch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedDispatch<F> = F;

/// Span wrapping a single pass of a query through the gate and the executor.
#[derive(Clone, Debug)]
pub struct DispatchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl DispatchSpan {
	/// Creates a new span tagged with the method and the 1-based attempt number.
	pub fn new(method: Method, attempt: u32) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::debug_span!("query_throttle.dispatch", method = method.as_str(), attempt);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, attempt);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedDispatch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug-level dispatcher event when the `tracing` feature is enabled.
macro_rules! dispatch_event {
	($($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::debug!(target: "query_throttle::dispatch", $($arg)+);
		}
	};
}
pub(crate) use dispatch_event;

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = DispatchSpan::new(Method::Get, 1);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn dispatch_event_compiles_in_statement_position() {
		let attempt = 3_u32;

		dispatch_event!(attempt, "Smoke-testing the dispatcher event macro.");

		assert_eq!(attempt, 3);
	}
}
