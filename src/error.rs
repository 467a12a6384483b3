//! Crate-level error types shared by the bucket, executor, dispatcher, and client.

// self
use crate::{_prelude::*, bucket::BucketError, http::Method, query::ApiError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error delivered to callers of [`Client`](crate::client::Client) operations.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (network, signing, IO). Never retried.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The API answered with a non-200 status that is not a retryable rate-limit rejection.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// A 200 response body could not be decoded into the requested type.
	#[error("Response body could not be decoded (status {status}).")]
	Decode {
		/// HTTP status of the response that failed to decode.
		status: u16,
		/// Structured decoding failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The request used an HTTP method the executor does not dispatch.
	#[error("HTTP method {method} is not supported.")]
	UnsupportedMethod {
		/// Rejected method.
		method: Method,
	},
	/// The retry policy refused another attempt after repeated rate-limit rejections.
	#[error("Rate-limit retries exhausted after {attempts} attempts.")]
	RetriesExhausted {
		/// Number of attempts performed, including the first one.
		attempts: u32,
		/// Rejection returned by the final attempt.
		#[source]
		last: ApiError,
	},
	/// The dispatcher task is gone, so the request can no longer be served.
	#[error("Query dispatcher is no longer running.")]
	DispatcherClosed,
}
impl From<BucketError> for Error {
	fn from(e: BucketError) -> Self {
		Self::Config(e.into())
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Token bucket parameters are invalid.
	#[error(transparent)]
	Bucket(#[from] BucketError),
	/// A rate-limit setting was changed while rate limiting is disabled.
	#[error("Rate limiting is disabled for this client.")]
	RateLimitingDisabled,
	/// The client was constructed outside a tokio runtime.
	#[error("A tokio runtime is required to spawn the query dispatcher.")]
	NoRuntime,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, signing, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request signing failed before the request was sent.
	#[error("Request signing failed: {reason}.")]
	Signing {
		/// Signer-supplied reason string.
		reason: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds a signing failure from a reason string.
	pub fn signing(reason: impl Into<String>) -> Self {
		Self::Signing { reason: reason.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
