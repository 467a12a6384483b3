//! Single-consumer dispatch loop with token-bucket gating and delayed retries.
//!
//! Each [`Client`](crate::client::Client) spawns exactly one dispatcher task. The task pulls
//! requests off an unbounded queue in submission order, waits for a bucket token when rate
//! limiting is enabled, executes the call, and then either delivers the outcome to the
//! caller or, for rate-limit rejections, parks the request in a [`RetryScheduler`] until the
//! server's window resets. Parked requests never block the loop: other queued requests
//! keep flowing, and once a deadline passes the bucket is drained and the due requests are
//! re-injected at the front of the queue.

pub(crate) mod request;
pub(crate) mod scheduler;

pub(crate) use request::QueryRequest;

// crates.io
use tokio::{
	sync::mpsc,
	time::{self, Instant},
};
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	bucket::TokenBucket,
	dispatch::scheduler::RetryScheduler,
	http::SignedTransport,
	obs::{DispatchMetrics, DispatchOutcome, DispatchSpan, dispatch_event},
	query::{QueryExecutor, RateLimitClassifier, RateLimitSignal},
};

/// Bounds how often a rate-limited request is re-attempted.
///
/// The default is unbounded: a persistently throttled request keeps waiting for the next
/// window instead of failing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Maximum number of attempts (first call included); `None` retries forever.
	pub max_attempts: Option<u32>,
}
impl RetryPolicy {
	/// Retries rate-limited requests until they succeed or fail for another reason.
	pub const fn unbounded() -> Self {
		Self { max_attempts: None }
	}

	/// Caps the total number of attempts; values below one are raised to one.
	pub fn limited(max_attempts: u32) -> Self {
		Self { max_attempts: Some(max_attempts.max(1)) }
	}

	/// Returns `true` when a request that has made `attempts` attempts may try again.
	pub fn allows_retry(&self, attempts: u32) -> bool {
		self.max_attempts.is_none_or(|max| attempts < max)
	}
}

/// State shared between client handles and their dispatcher.
#[derive(Debug)]
pub(crate) struct DispatchShared {
	pub(crate) bucket: RwLock<Option<Arc<TokenBucket>>>,
	pub(crate) credentials: RwLock<Credentials>,
	pub(crate) metrics: DispatchMetrics,
}
impl DispatchShared {
	pub(crate) fn new(bucket: Option<TokenBucket>, credentials: Credentials) -> Self {
		Self {
			bucket: RwLock::new(bucket.map(Arc::new)),
			credentials: RwLock::new(credentials),
			metrics: DispatchMetrics::default(),
		}
	}

	pub(crate) fn bucket(&self) -> Option<Arc<TokenBucket>> {
		self.bucket.read().clone()
	}
}

/// Sole consumer of a client's request queue.
pub(crate) struct Dispatcher<T>
where
	T: ?Sized + SignedTransport,
{
	queue: mpsc::UnboundedReceiver<QueryRequest>,
	executor: QueryExecutor<T>,
	classifier: Arc<dyn RateLimitClassifier>,
	retry: RetryPolicy,
	shared: Arc<DispatchShared>,
	ready: VecDeque<QueryRequest>,
	scheduler: RetryScheduler,
	closed: bool,
}
impl<T> Dispatcher<T>
where
	T: ?Sized + SignedTransport,
{
	pub(crate) fn new(
		queue: mpsc::UnboundedReceiver<QueryRequest>,
		executor: QueryExecutor<T>,
		classifier: Arc<dyn RateLimitClassifier>,
		retry: RetryPolicy,
		shared: Arc<DispatchShared>,
	) -> Self {
		Self {
			queue,
			executor,
			classifier,
			retry,
			shared,
			ready: VecDeque::new(),
			scheduler: RetryScheduler::default(),
			closed: false,
		}
	}

	/// Serves requests until every client handle is gone and no retry is pending.
	pub(crate) async fn run(mut self) {
		while let Some(request) = self.next_request().await {
			self.dispatch(request).await;
		}

		dispatch_event!("Query dispatcher stopped.");
	}

	async fn next_request(&mut self) -> Option<QueryRequest> {
		loop {
			self.promote_due();

			if let Some(request) = self.ready.pop_front() {
				return Some(request);
			}

			if self.closed && self.scheduler.is_empty() {
				return None;
			}

			tokio::select! {
				biased;
				_ = wait_until(self.scheduler.next_due()) => {},
				received = self.queue.recv(), if !self.closed => match received {
					Some(request) => return Some(request),
					None => self.closed = true,
				},
			}
		}
	}

	fn promote_due(&mut self) {
		let due = self.scheduler.pop_due(Instant::now());

		if due.is_empty() {
			return;
		}
		if let Some(bucket) = self.shared.bucket() {
			bucket.drain();
		}

		dispatch_event!(
			promoted = due.len(),
			pending = self.scheduler.len(),
			"Rate-limit window reset; bucket drained and throttled requests re-queued."
		);

		for request in due.into_iter().rev() {
			self.ready.push_front(request);
		}
	}

	async fn dispatch(&mut self, mut request: QueryRequest) {
		let method = request.method;

		if request.is_abandoned() {
			dispatch_event!(%method, url = %request.url, "Skipping query abandoned by its caller.");
			self.shared.metrics.record(method, DispatchOutcome::Abandoned);

			return;
		}

		request.attempts += 1;

		let span = DispatchSpan::new(method, request.attempts);
		let outcome = span.instrument(self.attempt(&request)).await;
		let observed = Instant::now();

		match outcome {
			Ok(body) => {
				let outcome = match request.complete(body) {
					true => DispatchOutcome::Success,
					false => DispatchOutcome::Failure,
				};

				self.shared.metrics.record(method, outcome);
			},
			Err(Error::Api(api)) => match self.classifier.classify(&api) {
				signal @ RateLimitSignal::Limited { .. }
					if self.retry.allows_retry(request.attempts) =>
				{
					let delay = signal.remaining_from(api.received_at);

					dispatch_event!(
						%method,
						url = %request.url,
						attempt = request.attempts,
						status = api.status,
						delay_ms = delay.as_millis() as u64,
						"Rate limited; retry scheduled after the server window resets."
					);
					self.shared.metrics.record(method, DispatchOutcome::RateLimited);
					self.scheduler.schedule(observed + delay, request);
				},
				RateLimitSignal::Limited { .. } => {
					let attempts = request.attempts;

					dispatch_event!(
						%method,
						url = %request.url,
						attempts,
						"Rate-limit retries exhausted."
					);
					self.shared.metrics.record(method, DispatchOutcome::Exhausted);
					request.fail(Error::RetriesExhausted { attempts, last: api });
				},
				RateLimitSignal::NotLimited => {
					self.shared.metrics.record(method, DispatchOutcome::Failure);
					request.fail(Error::Api(api));
				},
			},
			Err(err) => {
				self.shared.metrics.record(method, DispatchOutcome::Failure);
				request.fail(err);
			},
		}
	}

	async fn attempt(&self, request: &QueryRequest) -> Result<Vec<u8>> {
		if let Some(bucket) = self.shared.bucket() {
			dispatch_event!(available = bucket.available(), "Waiting for a rate-limit token.");

			bucket.acquire(1).await?;
		}

		let credentials = self.shared.credentials.read().clone();

		self.shared.metrics.record_executed();

		self.executor.execute(&credentials, request.method, &request.url, &request.form).await
	}
}

async fn wait_until(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => time::sleep_until(deadline).await,
		None => std::future::pending().await,
	}
}
