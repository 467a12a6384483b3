//! Queue entries and their one-shot reply path.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	http::{Form, Method},
	query,
};

/// One unit of work travelling through the dispatcher.
///
/// A rate-limited request is moved into the retry scheduler and back as the same value;
/// only `attempts` changes between passes.
pub(crate) struct QueryRequest {
	pub(crate) method: Method,
	pub(crate) url: Url,
	pub(crate) form: Form,
	pub(crate) attempts: u32,
	sink: Box<dyn ResponseSink>,
}
impl QueryRequest {
	/// Creates a request whose 200 body is decoded into `R` and sent through `reply`.
	pub(crate) fn new<R>(
		method: Method,
		url: Url,
		form: Form,
		reply: oneshot::Sender<Result<R>>,
	) -> Self
	where
		R: 'static + Send + DeserializeOwned,
	{
		Self { method, url, form, attempts: 0, sink: Box::new(TypedSink { reply }) }
	}

	/// Returns `true` once the caller has dropped its result future.
	pub(crate) fn is_abandoned(&self) -> bool {
		self.sink.is_abandoned()
	}

	/// Decodes `body` and delivers the result; returns whether decoding succeeded.
	pub(crate) fn complete(self, body: Vec<u8>) -> bool {
		self.sink.complete(body)
	}

	/// Delivers a terminal error.
	pub(crate) fn fail(self, error: Error) {
		self.sink.fail(error);
	}
}
impl Debug for QueryRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("QueryRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("attempts", &self.attempts)
			.finish()
	}
}

/// Type-erased delivery target. Every method consumes the sink, so a request can deliver
/// at most one result.
trait ResponseSink
where
	Self: Send + Sync,
{
	fn is_abandoned(&self) -> bool;

	fn complete(self: Box<Self>, body: Vec<u8>) -> bool;

	fn fail(self: Box<Self>, error: Error);
}

struct TypedSink<R> {
	reply: oneshot::Sender<Result<R>>,
}
impl<R> ResponseSink for TypedSink<R>
where
	R: 'static + Send + DeserializeOwned,
{
	fn is_abandoned(&self) -> bool {
		self.reply.is_closed()
	}

	fn complete(self: Box<Self>, body: Vec<u8>) -> bool {
		let decoded = query::decode_body::<R>(&body);
		let ok = decoded.is_ok();

		// The caller may have gone away mid-flight; the result is simply discarded.
		let _ = self.reply.send(decoded);

		ok
	}

	fn fail(self: Box<Self>, error: Error) {
		let _ = self.reply.send(Err(error));
	}
}
