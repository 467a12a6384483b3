//! Optional observability helpers for the query dispatcher.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every dispatch inside a span named `query_throttle.dispatch`
//!   with the `method` and `attempt` fields, and to emit debug events for gating, retry
//!   scheduling, and retry promotion.
//! - Enable `metrics` to increment the `query_throttle_dispatch_total` counter for every
//!   terminal or retry outcome, labeled by `method` + `outcome`.

mod dispatch_metrics;
mod dispatch_span;

pub use dispatch_metrics::*;
pub use dispatch_span::*;

pub(crate) use dispatch_span::dispatch_event;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each dispatch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
	/// A decoded value was delivered.
	Success,
	/// A non-retryable error was delivered.
	Failure,
	/// The server throttled the request and a retry was scheduled.
	RateLimited,
	/// The retry policy gave up on a throttled request.
	Exhausted,
	/// The caller dropped its result future before dispatch.
	Abandoned,
}
impl DispatchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchOutcome::Success => "success",
			DispatchOutcome::Failure => "failure",
			DispatchOutcome::RateLimited => "rate_limited",
			DispatchOutcome::Exhausted => "exhausted",
			DispatchOutcome::Abandoned => "abandoned",
		}
	}
}
impl Display for DispatchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
