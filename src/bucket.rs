//! Token bucket gate applied before every dispatched query.
//!
//! The bucket starts full and produces one token per refill interval, up to its capacity.
//! Refill is computed lazily from the elapsed time, so an idle bucket keeps accumulating
//! tokens without a background task while never exceeding capacity.

// crates.io
use tokio::{
	sync::{Notify, futures::Notified},
	time::{self, Instant},
};
// self
use crate::_prelude::*;

/// Errors raised by [`TokenBucket`] construction and acquisition.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum BucketError {
	/// Buckets must hold at least one token.
	#[error("Token bucket capacity must be greater than zero.")]
	ZeroCapacity,
	/// The caller asked for more tokens than the bucket can ever hold.
	#[error("Requested {requested} tokens but the bucket capacity is {capacity}.")]
	ExceedsCapacity {
		/// Tokens requested by the caller.
		requested: u64,
		/// Configured bucket capacity.
		capacity: u64,
	},
}

/// Leaky-bucket rate limiter shared by a client and its dispatcher.
pub struct TokenBucket {
	state: Mutex<BucketState>,
	// Serializes waiters so grants are handed out in arrival order.
	turnstile: AsyncMutex<()>,
	reconfigured: Notify,
}
impl TokenBucket {
	/// Creates a full bucket that produces one token every `interval`, up to `capacity`.
	///
	/// A zero `interval` makes every acquisition of at most `capacity` tokens succeed
	/// immediately.
	pub fn new(interval: StdDuration, capacity: u64) -> Result<Self, BucketError> {
		if capacity == 0 {
			return Err(BucketError::ZeroCapacity);
		}

		Ok(Self {
			state: Mutex::new(BucketState {
				interval,
				capacity,
				tokens: capacity,
				last_refill: Instant::now(),
			}),
			turnstile: AsyncMutex::new(()),
			reconfigured: Notify::new(),
		})
	}

	/// Waits until `n` tokens are available, then deducts them.
	///
	/// Concurrent callers are served one at a time in arrival order, so the bucket never
	/// grants more tokens than it holds.
	pub async fn acquire(&self, n: u64) -> Result<(), BucketError> {
		if n == 0 {
			return Ok(());
		}

		let _turn = self.turnstile.lock().await;

		loop {
			let (wait, reconfigured) = match self.try_take(n)? {
				Grant::Taken => return Ok(()),
				Grant::Wait(wait, reconfigured) => (wait, reconfigured),
			};

			tokio::select! {
				_ = time::sleep(wait) => {},
				_ = reconfigured => {},
			}
		}
	}

	/// Drops every stored token and restarts the refill clock.
	pub fn drain(&self) {
		let mut state = self.state.lock();

		state.tokens = 0;
		state.last_refill = Instant::now();
	}

	/// Changes the refill interval.
	///
	/// Tokens earned under the previous interval are credited first. Blocked waiters are
	/// woken so they re-evaluate against the new interval.
	pub fn set_rate(&self, interval: StdDuration) {
		{
			let mut state = self.state.lock();

			state.refill(Instant::now());
			state.interval = interval;
		}

		self.reconfigured.notify_waiters();
	}

	/// Returns the current refill interval.
	pub fn rate(&self) -> StdDuration {
		self.state.lock().interval
	}

	/// Returns the maximum number of stored tokens.
	pub fn capacity(&self) -> u64 {
		self.state.lock().capacity
	}

	/// Returns the number of tokens that could be taken right now.
	pub fn available(&self) -> u64 {
		let mut state = self.state.lock();

		state.refill(Instant::now());

		state.tokens
	}

	fn try_take(&self, n: u64) -> Result<Grant<'_>, BucketError> {
		let mut state = self.state.lock();

		if n > state.capacity {
			return Err(BucketError::ExceedsCapacity { requested: n, capacity: state.capacity });
		}

		let now = Instant::now();

		state.refill(now);

		if state.tokens >= n {
			state.tokens -= n;

			return Ok(Grant::Taken);
		}

		// Registered under the state lock so a concurrent `set_rate` is never missed.
		let reconfigured = self.reconfigured.notified();

		Ok(Grant::Wait(state.wait_for(n, now), reconfigured))
	}
}
impl Debug for TokenBucket {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenBucket")
			.field("interval", &state.interval)
			.field("capacity", &state.capacity)
			.field("tokens", &state.tokens)
			.finish()
	}
}

enum Grant<'a> {
	Taken,
	Wait(StdDuration, Notified<'a>),
}

#[derive(Debug)]
struct BucketState {
	interval: StdDuration,
	capacity: u64,
	tokens: u64,
	last_refill: Instant,
}
impl BucketState {
	fn refill(&mut self, now: Instant) {
		if self.tokens >= self.capacity || self.interval.is_zero() {
			self.tokens = self.capacity;
			self.last_refill = now;

			return;
		}

		let elapsed = now.saturating_duration_since(self.last_refill);
		let produced =
			u64::try_from(elapsed.as_nanos() / self.interval.as_nanos()).unwrap_or(u64::MAX);

		if produced == 0 {
			return;
		}

		let room = self.capacity - self.tokens;

		if produced >= room {
			self.tokens = self.capacity;
			self.last_refill = now;
		} else {
			self.tokens += produced;
			self.last_refill += nanos(self.interval.as_nanos() * u128::from(produced));
		}
	}

	fn wait_for(&self, n: u64, now: Instant) -> StdDuration {
		let missing = n.saturating_sub(self.tokens);
		let ready_at =
			self.last_refill + nanos(self.interval.as_nanos() * u128::from(missing));

		ready_at.saturating_duration_since(now)
	}
}

fn nanos(value: u128) -> StdDuration {
	StdDuration::from_nanos(u64::try_from(value).unwrap_or(u64::MAX))
}
