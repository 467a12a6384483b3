//! Public client handle and submission API.

// std
use std::task::{Context, Poll};
// crates.io
use tokio::{
	runtime::Handle,
	sync::{mpsc, oneshot},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessCredentials, Credentials},
	bucket::TokenBucket,
	config::{ClientConfig, RateLimitConfig},
	dispatch::{DispatchShared, Dispatcher, QueryRequest},
	error::ConfigError,
	http::{Form, Method, SignedTransport},
	obs::DispatchMetrics,
	query::QueryExecutor,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Handle through which every request of one authenticated user is issued.
///
/// Creating a client spawns its dispatcher on the current tokio runtime. Clones share the
/// same dispatcher, queue, bucket, and credentials, so requests from every clone are
/// serialized together. The dispatcher stops once all clones are dropped and no rate-limited
/// retry is still waiting.
#[derive(Clone)]
pub struct Client {
	queue: mpsc::UnboundedSender<QueryRequest>,
	shared: Arc<DispatchShared>,
}
impl Client {
	/// Creates a client backed by the default reqwest transport and bearer signer.
	#[cfg(feature = "reqwest")]
	pub fn new(config: ClientConfig, access: AccessCredentials) -> Result<Self> {
		let transport = ReqwestTransport::new()?;

		Self::with_transport::<ReqwestTransport>(config, access, transport)
	}

	/// Creates a client that sends every call through `transport`.
	///
	/// Fails with [`ConfigError::NoRuntime`] outside a tokio runtime.
	pub fn with_transport<T>(
		config: ClientConfig,
		access: AccessCredentials,
		transport: impl Into<Arc<T>>,
	) -> Result<Self>
	where
		T: ?Sized + SignedTransport,
	{
		let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
		let bucket = config.rate_limit.as_ref().map(RateLimitConfig::build_bucket).transpose()?;
		let credentials = Credentials::new(config.consumer, access);
		let shared = Arc::new(DispatchShared::new(bucket, credentials));
		let (queue, receiver) = mpsc::unbounded_channel();
		let dispatcher = Dispatcher::new(
			receiver,
			QueryExecutor::new(transport),
			config.classifier,
			config.retry,
			shared.clone(),
		);

		runtime.spawn(dispatcher.run());

		Ok(Self { queue, shared })
	}

	/// Enqueues a query and returns a future resolving to its decoded result.
	///
	/// The request joins the dispatch queue immediately, before the returned future is
	/// polled. Dropping the future before the request reaches the front of the queue
	/// abandons it.
	pub fn query<R>(&self, method: Method, url: Url, form: Form) -> PendingQuery<R>
	where
		R: 'static + Send + DeserializeOwned,
	{
		let (reply, receiver) = oneshot::channel();
		let request = QueryRequest::new(method, url, form, reply);

		match self.queue.send(request) {
			Ok(()) => PendingQuery { state: PendingState::Waiting(receiver) },
			Err(_) => PendingQuery { state: PendingState::Failed(Some(Error::DispatcherClosed)) },
		}
	}

	/// Shorthand for a GET [`query`](Self::query).
	pub fn get<R>(&self, url: Url, form: Form) -> PendingQuery<R>
	where
		R: 'static + Send + DeserializeOwned,
	{
		self.query(Method::Get, url, form)
	}

	/// Shorthand for a POST [`query`](Self::query).
	pub fn post<R>(&self, url: Url, form: Form) -> PendingQuery<R>
	where
		R: 'static + Send + DeserializeOwned,
	{
		self.query(Method::Post, url, form)
	}

	/// Installs a fresh, full token bucket, replacing any existing one.
	pub fn enable_rate_limiting(&self, interval: StdDuration, capacity: u64) -> Result<()> {
		let bucket = TokenBucket::new(interval, capacity)?;

		*self.shared.bucket.write() = Some(Arc::new(bucket));

		Ok(())
	}

	/// Removes the token bucket; subsequent dispatches are no longer gated.
	pub fn disable_rate_limiting(&self) {
		*self.shared.bucket.write() = None;
	}

	/// Returns `true` while a token bucket is installed.
	pub fn rate_limiting_enabled(&self) -> bool {
		self.shared.bucket.read().is_some()
	}

	/// Changes the refill interval of the installed bucket.
	pub fn set_delay(&self, interval: StdDuration) -> Result<()> {
		let bucket = self.shared.bucket().ok_or(ConfigError::RateLimitingDisabled)?;

		bucket.set_rate(interval);

		Ok(())
	}

	/// Returns the refill interval, or `None` when rate limiting is disabled.
	pub fn delay(&self) -> Option<StdDuration> {
		self.shared.bucket().map(|bucket| bucket.rate())
	}

	/// Replaces the access credentials used for requests dispatched from now on.
	pub fn set_credentials(&self, access: AccessCredentials) {
		self.shared.credentials.write().access = access;
	}

	/// Dispatcher counters for this client.
	pub fn metrics(&self) -> &DispatchMetrics {
		&self.shared.metrics
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("rate_limit", &self.shared.bucket())
			.field("dispatcher_running", &!self.queue.is_closed())
			.finish()
	}
}

/// Future returned by [`Client::query`]; resolves once the dispatcher delivers a result.
#[must_use = "dropping a pending query before dispatch abandons it"]
pub struct PendingQuery<R> {
	state: PendingState<R>,
}
impl<R> Future for PendingQuery<R> {
	type Output = Result<R>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match &mut self.get_mut().state {
			PendingState::Waiting(receiver) => Pin::new(receiver)
				.poll(cx)
				.map(|delivered| delivered.unwrap_or_else(|_| Err(Error::DispatcherClosed))),
			PendingState::Failed(err) =>
				Poll::Ready(Err(err.take().unwrap_or(Error::DispatcherClosed))),
		}
	}
}
impl<R> Unpin for PendingQuery<R> {}
impl<R> Debug for PendingQuery<R> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = match self.state {
			PendingState::Waiting(_) => "waiting",
			PendingState::Failed(_) => "failed",
		};

		f.debug_struct("PendingQuery").field("state", &state).finish()
	}
}

enum PendingState<R> {
	Waiting(oneshot::Receiver<Result<R>>),
	Failed(Option<Error>),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ConsumerCredentials;

	fn config() -> ClientConfig {
		ClientConfig::new(ConsumerCredentials::new("consumer", "consumer-secret"))
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn construction_requires_a_runtime() {
		let err = Client::new(config(), AccessCredentials::new("token", "secret"))
			.expect_err("Construction outside a runtime must fail.");

		assert!(matches!(err, Error::Config(ConfigError::NoRuntime)));
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn rate_limit_toggles_round_trip() {
		let client = Client::new(config(), AccessCredentials::new("token", "secret"))
			.expect("Client should build inside a runtime.");

		assert!(!client.rate_limiting_enabled());
		assert_eq!(client.delay(), None);
		assert!(matches!(
			client.set_delay(StdDuration::from_secs(1)),
			Err(Error::Config(ConfigError::RateLimitingDisabled))
		));

		client
			.enable_rate_limiting(StdDuration::from_millis(250), 3)
			.expect("Bucket parameters are valid.");

		assert_eq!(client.delay(), Some(StdDuration::from_millis(250)));

		client.set_delay(StdDuration::from_secs(2)).expect("Bucket is installed.");

		assert_eq!(client.delay(), Some(StdDuration::from_secs(2)));

		client.disable_rate_limiting();

		assert!(!client.rate_limiting_enabled());
		assert!(client.enable_rate_limiting(StdDuration::from_secs(1), 0).is_err());
	}
}
