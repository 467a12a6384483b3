// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{http::Method, obs::DispatchOutcome};

/// Records a dispatch outcome via the global metrics recorder (when enabled).
pub fn record_dispatch_outcome(method: Method, outcome: DispatchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"query_throttle_dispatch_total",
			"method" => method.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}

/// Thread-safe counters describing one client's dispatcher.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
	executed: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	rate_limited: AtomicU64,
	abandoned: AtomicU64,
}
impl DispatchMetrics {
	/// Returns the number of attempts that cleared the rate-limit gate and reached the
	/// executor (retries included). Attempts the executor rejects before calling the
	/// transport, such as unsupported methods, are counted too.
	pub fn executed(&self) -> u64 {
		self.executed.load(Ordering::Relaxed)
	}

	/// Returns the number of successfully delivered results.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of delivered errors (exhausted retries included).
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of rate-limit rejections that led to a scheduled retry.
	pub fn rate_limited(&self) -> u64 {
		self.rate_limited.load(Ordering::Relaxed)
	}

	/// Returns the number of requests skipped because their caller went away.
	pub fn abandoned(&self) -> u64 {
		self.abandoned.load(Ordering::Relaxed)
	}

	pub(crate) fn record_executed(&self) {
		self.executed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record(&self, method: Method, outcome: DispatchOutcome) {
		let counter = match outcome {
			DispatchOutcome::Success => &self.success,
			DispatchOutcome::Failure | DispatchOutcome::Exhausted => &self.failure,
			DispatchOutcome::RateLimited => &self.rate_limited,
			DispatchOutcome::Abandoned => &self.abandoned,
		};

		counter.fetch_add(1, Ordering::Relaxed);
		record_dispatch_outcome(method, outcome);
	}
}
