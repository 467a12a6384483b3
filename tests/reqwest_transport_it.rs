#![cfg(feature = "reqwest")]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
// self
use query_throttle::{
	auth::{AccessCredentials, ConsumerCredentials, Credentials},
	client::Client,
	config::ClientConfig,
	error::{Error, TransportError},
	ext::{RequestSigner, SigningInput},
	http::{Form, Method, ReqwestTransport},
	reqwest,
	url::Url,
};

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Status {
	id: u64,
	text: String,
}

/// Records what each request was signed with and tags it with a consumer header.
#[derive(Clone, Default)]
struct RecordingSigner {
	seen: Arc<Mutex<Vec<(Method, String, Option<String>)>>>,
}
impl RequestSigner for RecordingSigner {
	fn sign(
		&self,
		request: reqwest::RequestBuilder,
		input: SigningInput<'_>,
		credentials: &Credentials,
	) -> Result<reqwest::RequestBuilder, TransportError> {
		self.seen.lock().push((
			input.method,
			input.url.path().to_owned(),
			input.form.get("status").map(str::to_owned),
		));

		Ok(request.header("x-consumer-key", credentials.consumer.key.as_str()))
	}
}

fn config() -> ClientConfig {
	ClientConfig::builder(ConsumerCredentials::new("consumer-key", "consumer-secret"))
		.rate_limit(Duration::from_millis(50), 5)
		.build()
		.expect("Config should build.")
}

fn client(access: AccessCredentials) -> Client {
	Client::new(config(), access).expect("Client should build inside the test runtime.")
}

fn endpoint(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint should parse.")
}

#[tokio::test]
async fn get_sends_form_as_query_with_bearer_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/1.1/statuses/show.json")
				.query_param("id", "20")
				.header("authorization", "Bearer access-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":20,\"text\":\"just setting up\"}");
		})
		.await;
	let client = client(AccessCredentials::new("access-token", "access-secret"));
	let status = client
		.get::<Status>(endpoint(&server, "/1.1/statuses/show.json"), Form::new().with("id", "20"))
		.await
		.expect("GET should succeed.");

	assert_eq!(status, Status { id: 20, text: "just setting up".into() });

	mock.assert_async().await;
}

#[tokio::test]
async fn post_sends_form_as_urlencoded_body() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/1.1/statuses/update.json")
				.header("content-type", "application/x-www-form-urlencoded")
				.body("status=hello");
			then.status(200).body("{\"id\":21,\"text\":\"hello\"}");
		})
		.await;
	let client = client(AccessCredentials::new("access-token", "access-secret"));
	let status = client
		.post::<Status>(
			endpoint(&server, "/1.1/statuses/update.json"),
			Form::new().with("status", "hello"),
		)
		.await
		.expect("POST should succeed.");

	assert_eq!(status.id, 21);

	mock.assert_async().await;
}

#[tokio::test]
async fn throttled_response_is_retried_against_the_live_server() {
	let server = MockServer::start_async().await;
	let throttled = server
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/home.json");
			then.status(429)
				.header("retry-after", "1")
				.body("{\"errors\":[{\"code\":88,\"message\":\"Rate limit exceeded\"}]}");
		})
		.await;
	let client = client(AccessCredentials::new("access-token", "access-secret"));
	let pending = client.get::<Value>(endpoint(&server, "/1.1/home.json"), Form::new());

	tokio::time::sleep(Duration::from_millis(400)).await;
	throttled.assert_calls_async(1).await;
	throttled.delete_async().await;

	let recovered = server
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/home.json");
			then.status(200).body("[]");
		})
		.await;
	let value = pending.await.expect("Retried GET should succeed.");

	assert_eq!(value, Value::Array(Vec::new()));

	recovered.assert_calls_async(1).await;

	assert_eq!(client.metrics().rate_limited(), 1);
	assert_eq!(client.metrics().successes(), 1);
}

#[tokio::test]
async fn empty_access_token_fails_before_sending() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/account.json");
			then.status(200).body("{}");
		})
		.await;
	let client = client(AccessCredentials::new("", "access-secret"));
	let err = client
		.get::<Value>(endpoint(&server, "/1.1/account.json"), Form::new())
		.await
		.expect_err("Signing must fail.");

	assert!(matches!(err, Error::Transport(TransportError::Signing { .. })));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn custom_signer_sees_the_method_and_form_of_each_call() {
	let server = MockServer::start_async().await;
	let get = server
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/timeline.json").header("x-consumer-key", "consumer-key");
			then.status(200).body("[]");
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/1.1/statuses/update.json")
				.header("x-consumer-key", "consumer-key")
				.body("status=signed");
			then.status(200).body("{\"id\":7,\"text\":\"signed\"}");
		})
		.await;
	let signer = RecordingSigner::default();
	let transport = ReqwestTransport::with_client(reqwest::Client::new(), signer.clone());
	let client = Client::with_transport::<ReqwestTransport<RecordingSigner>>(
		config(),
		AccessCredentials::new("access-token", "access-secret"),
		transport,
	)
	.expect("Client should build inside the test runtime.");

	client
		.get::<Value>(endpoint(&server, "/1.1/timeline.json"), Form::new())
		.await
		.expect("GET should succeed.");

	let status = client
		.post::<Status>(
			endpoint(&server, "/1.1/statuses/update.json"),
			Form::new().with("status", "signed"),
		)
		.await
		.expect("POST should succeed.");

	assert_eq!(status.id, 7);
	assert_eq!(
		*signer.seen.lock(),
		[
			(Method::Get, "/1.1/timeline.json".to_owned(), None),
			(Method::Post, "/1.1/statuses/update.json".to_owned(), Some("signed".to_owned())),
		]
	);

	get.assert_async().await;
	post.assert_async().await;
}
