//! Prints the dispatch timeline of a throttled client backed by an in-process transport.
//!
//! The transport answers the third call with `429 Too Many Requests` and a one-second
//! `retry-after`. The output shows the initial burst, token-bucket pacing, the rejected
//! request being parked while its neighbours keep flowing, and its retry once the window
//! resets.

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use color_eyre::Result;
use serde_json::Value;
use tokio::time::Instant;
use url::Url;
// self
use query_throttle::{
	auth::{AccessCredentials, ConsumerCredentials, Credentials},
	client::Client,
	config::ClientConfig,
	http::{Form, RawResponse, SignedTransport, TransportFuture},
};

struct TimelineTransport {
	started: Instant,
	calls: AtomicUsize,
}
impl TimelineTransport {
	fn respond(&self, verb: &str, url: &Url) -> TransportFuture<'_> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		let at = self.started.elapsed().as_millis();
		let response = if call == 3 {
			RawResponse::new(429, "{\"errors\":[{\"code\":88,\"message\":\"Rate limit exceeded\"}]}")
				.with_header("retry-after", "1")
		} else {
			RawResponse::new(200, format!("{{\"call\":{call}}}"))
		};

		println!("{at:>5} ms  call #{call:<2} {verb} {} -> {}", url.path(), response.status);

		Box::pin(async move { Ok(response) })
	}
}
impl SignedTransport for TimelineTransport {
	fn signed_get<'a>(
		&'a self,
		_credentials: &'a Credentials,
		url: &'a Url,
		_form: &'a Form,
	) -> TransportFuture<'a> {
		self.respond("GET ", url)
	}

	fn signed_post<'a>(
		&'a self,
		_credentials: &'a Credentials,
		url: &'a Url,
		_form: &'a Form,
	) -> TransportFuture<'a> {
		self.respond("POST", url)
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = Arc::new(TimelineTransport { started: Instant::now(), calls: AtomicUsize::new(0) });
	let config = ClientConfig::builder(ConsumerCredentials::new("demo-consumer", "demo-secret"))
		.rate_limit(Duration::from_millis(250), 2)
		.build()?;
	let client = Client::with_transport::<TimelineTransport>(
		config,
		AccessCredentials::new("demo-token", "demo-token-secret"),
		transport,
	)?;
	let base = Url::parse("https://api.example.com/1.1/")?;
	let mut pending = Vec::new();

	for i in 1..=6 {
		let url = base.join(&format!("statuses/{i}.json"))?;

		pending.push(match i % 2 {
			0 => client.post::<Value>(url, Form::new().with("status", format!("update {i}"))),
			_ => client.get::<Value>(url, Form::new()),
		});
	}

	for (i, query) in pending.into_iter().enumerate() {
		println!("request {} resolved: {}", i + 1, query.await?);
	}

	let metrics = client.metrics();

	println!(
		"executed={} successes={} rate_limited={} failures={}",
		metrics.executed(),
		metrics.successes(),
		metrics.rate_limited(),
		metrics.failures()
	);

	Ok(())
}
