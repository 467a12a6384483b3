//! Explicit per-client configuration.
//!
//! Consumer credentials, rate-limit settings, the retry policy, and the rate-limit
//! classifier all travel inside a [`ClientConfig`] value handed to the client constructor,
//! so clients living in the same process never share hidden state.

// self
use crate::{
	_prelude::*,
	auth::ConsumerCredentials,
	bucket::{BucketError, TokenBucket},
	dispatch::RetryPolicy,
	error::ConfigError,
	query::{HeaderRateLimitClassifier, RateLimitClassifier},
};

/// Default interval between bucket refills; zero means no throttling beyond the burst.
pub const DEFAULT_DELAY: StdDuration = StdDuration::ZERO;
/// Default bucket capacity.
pub const DEFAULT_CAPACITY: u64 = 5;

/// Token-bucket parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
	/// Time between token refills.
	pub interval: StdDuration,
	/// Maximum number of stored tokens (burst size).
	pub capacity: u64,
}
impl RateLimitConfig {
	/// Creates a rate-limit configuration.
	pub const fn new(interval: StdDuration, capacity: u64) -> Self {
		Self { interval, capacity }
	}

	pub(crate) fn build_bucket(&self) -> Result<TokenBucket, BucketError> {
		TokenBucket::new(self.interval, self.capacity)
	}
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self::new(DEFAULT_DELAY, DEFAULT_CAPACITY)
	}
}

/// Everything a [`Client`](crate::client::Client) needs besides its access credentials and
/// transport.
#[derive(Clone)]
pub struct ClientConfig {
	/// Application credentials used for signing.
	pub consumer: ConsumerCredentials,
	/// Token-bucket settings; `None` disables local rate limiting.
	pub rate_limit: Option<RateLimitConfig>,
	/// Retry policy for rate-limited requests.
	pub retry: RetryPolicy,
	/// Decides which API errors are rate-limit rejections.
	pub classifier: Arc<dyn RateLimitClassifier>,
}
impl ClientConfig {
	/// Creates a configuration with rate limiting disabled and unbounded retries.
	pub fn new(consumer: ConsumerCredentials) -> Self {
		Self {
			consumer,
			rate_limit: None,
			retry: RetryPolicy::default(),
			classifier: Arc::new(HeaderRateLimitClassifier::default()),
		}
	}

	/// Starts a validated builder.
	pub fn builder(consumer: ConsumerCredentials) -> ClientConfigBuilder {
		ClientConfigBuilder { config: Self::new(consumer) }
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("consumer", &self.consumer)
			.field("rate_limit", &self.rate_limit)
			.field("retry", &self.retry)
			.finish_non_exhaustive()
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	config: ClientConfig,
}
impl ClientConfigBuilder {
	/// Enables rate limiting with one token per `interval` and bursts of up to `capacity`.
	pub fn rate_limit(mut self, interval: StdDuration, capacity: u64) -> Self {
		self.config.rate_limit = Some(RateLimitConfig::new(interval, capacity));

		self
	}

	/// Enables rate limiting with [`DEFAULT_DELAY`] and [`DEFAULT_CAPACITY`].
	pub fn default_rate_limit(mut self) -> Self {
		self.config.rate_limit = Some(RateLimitConfig::default());

		self
	}

	/// Disables local rate limiting.
	pub fn without_rate_limit(mut self) -> Self {
		self.config.rate_limit = None;

		self
	}

	/// Sets the retry policy for rate-limited requests.
	pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.config.retry = policy;

		self
	}

	/// Replaces the rate-limit classifier.
	pub fn classifier(mut self, classifier: impl 'static + RateLimitClassifier) -> Self {
		self.config.classifier = Arc::new(classifier);

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if matches!(self.config.rate_limit, Some(RateLimitConfig { capacity: 0, .. })) {
			return Err(BucketError::ZeroCapacity.into());
		}

		Ok(self.config)
	}
}
