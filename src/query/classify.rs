//! Rate-limit classification of API errors.

// self
use crate::{_prelude::*, query::ApiError};

/// Outcome of inspecting an [`ApiError`] for a rate-limit rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitSignal {
	/// The rejection is final; deliver it to the caller.
	NotLimited,
	/// The server throttled the request until `reset_at`.
	Limited {
		/// Wall-clock instant at which the server's window resets.
		reset_at: OffsetDateTime,
	},
}
impl RateLimitSignal {
	/// Returns `true` for [`RateLimitSignal::Limited`].
	pub fn is_limited(&self) -> bool {
		matches!(self, Self::Limited { .. })
	}

	/// Time left until the reset, measured from `from`; zero when already past.
	pub fn remaining_from(&self, from: OffsetDateTime) -> StdDuration {
		match self {
			Self::NotLimited => StdDuration::ZERO,
			Self::Limited { reset_at } =>
				StdDuration::try_from(*reset_at - from).unwrap_or(StdDuration::ZERO),
		}
	}
}

/// Decides whether an API error is a retryable rate-limit rejection.
pub trait RateLimitClassifier
where
	Self: Send + Sync,
{
	/// Classifies `error`.
	fn classify(&self, error: &ApiError) -> RateLimitSignal;
}

/// Default classifier driven by status codes, the `code 88` payload, and reset headers.
///
/// A response is rate limited when its status is 429 or 420, or when its payload lists
/// error code 88. The reset instant comes from `x-rate-limit-reset`, then `retry-after`,
/// then the receipt instant plus [`fallback_window`](Self::fallback_window). It is never
/// earlier than the receipt instant plus [`min_wait`](Self::min_wait), so a server that
/// keeps answering 429 with a stale reset is not hammered in a tight loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderRateLimitClassifier {
	/// Wait applied when a rejection carries no reset hint.
	pub fallback_window: Duration,
	/// Lower bound on the wait after any rate-limit rejection.
	pub min_wait: Duration,
}
impl HeaderRateLimitClassifier {
	/// HTTP 429 Too Many Requests.
	pub const TOO_MANY_REQUESTS: u16 = 429;
	/// Legacy "Enhance Your Calm" status still emitted by some providers.
	pub const ENHANCE_YOUR_CALM: u16 = 420;
	/// Payload error code signalling an exhausted rate limit.
	pub const RATE_LIMIT_EXCEEDED_CODE: i64 = 88;
	/// Default [`fallback_window`](Self::fallback_window).
	pub const DEFAULT_FALLBACK_WINDOW: Duration = Duration::seconds(60);
	/// Default [`min_wait`](Self::min_wait).
	pub const DEFAULT_MIN_WAIT: Duration = Duration::seconds(1);

	/// Overrides the fallback window; negative values clamp to zero.
	pub fn with_fallback_window(mut self, window: Duration) -> Self {
		self.fallback_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Overrides the minimum wait; negative values clamp to zero.
	pub fn with_min_wait(mut self, wait: Duration) -> Self {
		self.min_wait = if wait.is_negative() { Duration::ZERO } else { wait };

		self
	}
}
impl Default for HeaderRateLimitClassifier {
	fn default() -> Self {
		Self {
			fallback_window: Self::DEFAULT_FALLBACK_WINDOW,
			min_wait: Self::DEFAULT_MIN_WAIT,
		}
	}
}
impl RateLimitClassifier for HeaderRateLimitClassifier {
	fn classify(&self, error: &ApiError) -> RateLimitSignal {
		let limited = matches!(error.status, Self::TOO_MANY_REQUESTS | Self::ENHANCE_YOUR_CALM)
			|| error.has_error_code(Self::RATE_LIMIT_EXCEEDED_CODE);

		if !limited {
			return RateLimitSignal::NotLimited;
		}

		let headers = &error.rate_limit;
		let reset_at = headers
			.reset_at
			.or_else(|| headers.retry_after.map(|delay| error.received_at + delay))
			.unwrap_or(error.received_at + self.fallback_window)
			.max(error.received_at + self.min_wait);

		RateLimitSignal::Limited { reset_at }
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::http::RawResponse;

	const RECEIVED: OffsetDateTime = datetime!(2023-11-14 22:13:00 UTC);

	fn api_error(response: RawResponse) -> ApiError {
		ApiError::from_response(&response, RECEIVED)
	}

	#[test]
	fn reset_header_wins_over_retry_after() {
		let err = api_error(
			RawResponse::new(429, "")
				.with_header("x-rate-limit-reset", "1700000000")
				.with_header("retry-after", "5"),
		);
		let signal = HeaderRateLimitClassifier::default().classify(&err);

		assert_eq!(signal, RateLimitSignal::Limited { reset_at: datetime!(2023-11-14 22:13:20 UTC) });
		assert_eq!(signal.remaining_from(RECEIVED), StdDuration::from_secs(20));
	}

	#[test]
	fn retry_after_is_relative_to_receipt() {
		let err = api_error(RawResponse::new(420, "").with_header("retry-after", "2"));

		assert_eq!(
			HeaderRateLimitClassifier::default().classify(&err),
			RateLimitSignal::Limited { reset_at: RECEIVED + Duration::seconds(2) }
		);
	}

	#[test]
	fn payload_code_marks_rate_limit_without_headers() {
		let err = api_error(RawResponse::new(
			400,
			r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#,
		));
		let classifier =
			HeaderRateLimitClassifier::default().with_fallback_window(Duration::seconds(15));

		assert_eq!(
			classifier.classify(&err),
			RateLimitSignal::Limited { reset_at: RECEIVED + Duration::seconds(15) }
		);
	}

	#[test]
	fn other_failures_are_not_limited() {
		for status in [400, 401, 403, 404, 500, 503] {
			let err = api_error(RawResponse::new(status, "{}").with_header("retry-after", "5"));

			assert_eq!(
				HeaderRateLimitClassifier::default().classify(&err),
				RateLimitSignal::NotLimited,
				"Status {status} must not be retried."
			);
		}
	}

	#[test]
	fn stale_reset_is_raised_to_the_minimum_wait() {
		let stale = api_error(RawResponse::new(429, "").with_header("x-rate-limit-reset", "0"));
		let immediate = api_error(RawResponse::new(429, "").with_header("retry-after", "0"));
		let classifier = HeaderRateLimitClassifier::default();

		for err in [&stale, &immediate] {
			let signal = classifier.classify(err);

			assert_eq!(signal, RateLimitSignal::Limited { reset_at: RECEIVED + Duration::seconds(1) });
			assert_eq!(signal.remaining_from(RECEIVED), StdDuration::from_secs(1));
		}

		let eager = classifier.with_min_wait(Duration::ZERO);

		assert_eq!(eager.classify(&stale).remaining_from(RECEIVED), StdDuration::ZERO);
	}

	#[test]
	fn elapsed_reset_yields_zero_remaining() {
		let signal = RateLimitSignal::Limited { reset_at: RECEIVED - Duration::seconds(3) };

		assert_eq!(signal.remaining_from(RECEIVED), StdDuration::ZERO);
		assert!(signal.is_limited());
		assert!(!RateLimitSignal::NotLimited.is_limited());
	}
}
