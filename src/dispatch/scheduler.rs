//! Delayed-retry scheduler keyed by rate-limit reset deadlines.

// std
use std::cmp::{Ordering, Reverse};
// crates.io
use tokio::time::Instant;
// self
use crate::{_prelude::*, dispatch::request::QueryRequest};

/// Min-heap of throttled requests waiting for their server window to reset.
///
/// Requests sharing a deadline come out in the order they were scheduled.
#[derive(Debug, Default)]
pub(crate) struct RetryScheduler {
	heap: BinaryHeap<Reverse<Scheduled>>,
	next_seq: u64,
}
impl RetryScheduler {
	pub(crate) fn schedule(&mut self, due: Instant, request: QueryRequest) {
		let seq = self.next_seq;

		self.next_seq += 1;
		self.heap.push(Reverse(Scheduled { due, seq, request }));
	}

	/// Earliest pending deadline.
	pub(crate) fn next_due(&self) -> Option<Instant> {
		self.heap.peek().map(|Reverse(entry)| entry.due)
	}

	/// Removes every request due at or before `now`, earliest first.
	pub(crate) fn pop_due(&mut self, now: Instant) -> Vec<QueryRequest> {
		let mut due = Vec::new();

		while self.next_due().is_some_and(|deadline| deadline <= now) {
			if let Some(Reverse(entry)) = self.heap.pop() {
				due.push(entry.request);
			}
		}

		due
	}

	pub(crate) fn len(&self) -> usize {
		self.heap.len()
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.heap.is_empty()
	}
}

#[derive(Debug)]
struct Scheduled {
	due: Instant,
	seq: u64,
	request: QueryRequest,
}
impl PartialEq for Scheduled {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}
impl Eq for Scheduled {}
impl PartialOrd for Scheduled {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for Scheduled {
	fn cmp(&self, other: &Self) -> Ordering {
		self.due.cmp(&other.due).then(self.seq.cmp(&other.seq))
	}
}
