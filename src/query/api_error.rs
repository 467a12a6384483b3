//! Structured view of non-200 API responses.

// crates.io
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, http::RawResponse};

const MESSAGE_PREVIEW_LIMIT: usize = 256;

/// Non-200 response returned by the API.
///
/// Carries enough of the response to answer "was this a rate-limit rejection, and when
/// does the window reset" without keeping the transport response alive.
#[derive(Clone, Debug, ThisError)]
#[error("API request failed with status {status}: {message}.")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Human-readable summary taken from the error payload or the raw body.
	pub message: String,
	/// Error entries parsed from an `{"errors": [...]}` payload.
	pub errors: Vec<ApiErrorDetail>,
	/// Rate-limit headers attached to the response.
	pub rate_limit: RateLimitHeaders,
	/// Raw response body, lossily decoded as UTF-8.
	pub body: String,
	/// Wall-clock instant at which the response was received.
	pub received_at: OffsetDateTime,
}
impl ApiError {
	/// Builds an error from a transport response received at `received_at`.
	pub fn from_response(response: &RawResponse, received_at: OffsetDateTime) -> Self {
		let body = String::from_utf8_lossy(&response.body).into_owned();
		let envelope = serde_json::from_slice::<ErrorEnvelope>(&response.body).unwrap_or_default();
		let message = envelope
			.errors
			.first()
			.map(|detail| detail.message.clone())
			.filter(|message| !message.is_empty())
			.or(envelope.error)
			.unwrap_or_else(|| preview(&body));

		Self {
			status: response.status,
			message,
			errors: envelope.errors,
			rate_limit: RateLimitHeaders::from_response(response, received_at),
			body,
			received_at,
		}
	}

	/// Returns `true` when the payload lists an error with the provided code.
	pub fn has_error_code(&self, code: i64) -> bool {
		self.errors.iter().any(|detail| detail.code == code)
	}
}

/// One entry of an `{"errors": [...]}` payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
	/// Provider-specific error code.
	#[serde(default)]
	pub code: i64,
	/// Provider-supplied message.
	#[serde(default)]
	pub message: String,
}

/// Rate-limit headers reported alongside a response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateLimitHeaders {
	/// Requests allowed per window (`x-rate-limit-limit`).
	pub limit: Option<u64>,
	/// Requests left in the current window (`x-rate-limit-remaining`).
	pub remaining: Option<u64>,
	/// Instant the window resets (`x-rate-limit-reset`, epoch seconds).
	pub reset_at: Option<OffsetDateTime>,
	/// Relative delay requested by the server (`retry-after`).
	pub retry_after: Option<Duration>,
}
impl RateLimitHeaders {
	/// Header carrying the window size.
	pub const LIMIT: &'static str = "x-rate-limit-limit";
	/// Header carrying the remaining budget.
	pub const REMAINING: &'static str = "x-rate-limit-remaining";
	/// Header carrying the reset instant in epoch seconds.
	pub const RESET: &'static str = "x-rate-limit-reset";
	/// Standard HTTP retry hint.
	pub const RETRY_AFTER: &'static str = "retry-after";

	/// Extracts the rate-limit headers from `response`; `now` anchors HTTP-date hints.
	pub fn from_response(response: &RawResponse, now: OffsetDateTime) -> Self {
		let number =
			|name: &str| response.header(name).and_then(|raw| raw.trim().parse::<u64>().ok());
		let reset_at = response
			.header(Self::RESET)
			.and_then(|raw| raw.trim().parse::<i64>().ok())
			.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok());
		let retry_after =
			response.header(Self::RETRY_AFTER).and_then(|raw| parse_retry_after(raw, now));

		Self {
			limit: number(Self::LIMIT),
			remaining: number(Self::REMAINING),
			reset_at,
			retry_after,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
	#[serde(default)]
	errors: Vec<ApiErrorDetail>,
	#[serde(default)]
	error: Option<String>,
}

fn parse_retry_after(raw: &str, now: OffsetDateTime) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(i64::from(secs)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - now;

		return Some(if delta.is_positive() { delta } else { Duration::ZERO });
	}

	None
}

fn preview(body: &str) -> String {
	let trimmed = body.trim();

	match trimmed.char_indices().nth(MESSAGE_PREVIEW_LIMIT) {
		Some((idx, _)) => format!("{}...", &trimmed[..idx]),
		None => trimmed.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn error_payload_populates_message_and_codes() {
		let response =
			RawResponse::new(429, r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#)
				.with_header("x-rate-limit-limit", "15")
				.with_header("x-rate-limit-remaining", "0")
				.with_header("x-rate-limit-reset", "1700000000");
		let err = ApiError::from_response(&response, datetime!(2023-11-14 22:00 UTC));

		assert_eq!(err.status, 429);
		assert_eq!(err.message, "Rate limit exceeded");
		assert!(err.has_error_code(88));
		assert_eq!(err.rate_limit.limit, Some(15));
		assert_eq!(err.rate_limit.remaining, Some(0));
		assert_eq!(err.rate_limit.reset_at, Some(datetime!(2023-11-14 22:13:20 UTC)));
		assert_eq!(err.to_string(), "API request failed with status 429: Rate limit exceeded.");
	}

	#[test]
	fn non_json_bodies_fall_back_to_a_preview() {
		let long = "x".repeat(MESSAGE_PREVIEW_LIMIT + 10);
		let err = ApiError::from_response(
			&RawResponse::new(503, long.clone()),
			OffsetDateTime::UNIX_EPOCH,
		);

		assert_eq!(err.body, long);
		assert_eq!(err.message.len(), MESSAGE_PREVIEW_LIMIT + 3);
		assert!(err.errors.is_empty());

		let err = ApiError::from_response(
			&RawResponse::new(401, r#"{"error":"Not authorized."}"#),
			OffsetDateTime::UNIX_EPOCH,
		);

		assert_eq!(err.message, "Not authorized.");
	}

	#[test]
	fn retry_after_accepts_seconds_and_http_dates() {
		let now = datetime!(2015-10-21 07:28:00 UTC);

		assert_eq!(parse_retry_after("120", now), Some(Duration::seconds(120)));
		assert_eq!(
			parse_retry_after("Wed, 21 Oct 2015 07:28:30 +0000", now),
			Some(Duration::seconds(30))
		);
		assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:27:00 +0000", now), Some(Duration::ZERO));
		assert_eq!(parse_retry_after("soon", now), None);
	}
}
