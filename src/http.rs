//! Transport primitives for signed API calls.
//!
//! The module exposes [`SignedTransport`], the crate's only dependency on an HTTP stack,
//! together with the [`Form`] and [`RawResponse`] values that cross that boundary. The
//! dispatcher never inspects transport internals: it hands credentials, a URL, and form
//! parameters to the transport and receives a status, headers, and body back.

// self
use crate::{_prelude::*, auth::Credentials, error::TransportError};
#[cfg(feature = "reqwest")]
use crate::{
	error::ConfigError,
	ext::{BearerSigner, RequestSigner, SigningInput},
};

/// Boxed future returned by [`SignedTransport`] calls.
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Performs authenticated HTTP calls on behalf of a client.
///
/// Implementations must attach valid signing material derived from [`Credentials`] and
/// report network or signing failures as [`TransportError`]. Non-200 statuses are NOT
/// errors at this layer; they are returned as ordinary [`RawResponse`] values.
pub trait SignedTransport
where
	Self: 'static + Send + Sync,
{
	/// Issues a signed GET request with `form` encoded as the query string.
	fn signed_get<'a>(
		&'a self,
		credentials: &'a Credentials,
		url: &'a Url,
		form: &'a Form,
	) -> TransportFuture<'a>;

	/// Issues a signed POST request with `form` encoded as the request body.
	fn signed_post<'a>(
		&'a self,
		credentials: &'a Credentials,
		url: &'a Url,
		form: &'a Form,
	) -> TransportFuture<'a>;
}

/// HTTP method tag carried by every query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// Read request.
	Get,
	/// Write request.
	Post,
	/// Not dispatched by the executor.
	Put,
	/// Not dispatched by the executor.
	Delete,
}
impl Method {
	/// Returns the canonical upper-case method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Form parameters sent with a query. Key order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Form(BTreeMap<String, String>);
impl Form {
	/// Creates an empty form.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `key` to `value`, replacing any previous value.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
		self.0.insert(key.into(), value.into());

		self
	}

	/// Builder-style variant of [`Form::set`].
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.set(key, value);

		self
	}

	/// Returns the value stored for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Iterates over `(key, value)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for Form
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Status, headers, and body returned by a [`SignedTransport`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lower-cased name.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Creates a response without headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds a header; the name is stored lower-cased.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.insert(name.as_ref().to_ascii_lowercase(), value.into());

		self
	}

	/// Looks up a header by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}
}

/// Reqwest-backed [`SignedTransport`] that delegates credential attachment to a
/// [`RequestSigner`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport<S = BearerSigner> {
	client: ReqwestClient,
	signer: S,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport<BearerSigner> {
	/// Builds a transport with a fresh reqwest client and the bearer signer.
	pub fn new() -> Result<Self, ConfigError> {
		Ok(Self::with_client(ReqwestClient::builder().build()?, BearerSigner))
	}
}
#[cfg(feature = "reqwest")]
impl<S> ReqwestTransport<S>
where
	S: RequestSigner,
{
	/// Wraps an existing reqwest [`ReqwestClient`] and signer.
	pub fn with_client(client: ReqwestClient, signer: S) -> Self {
		Self { client, signer }
	}

	async fn send(
		&self,
		request: reqwest::RequestBuilder,
		input: SigningInput<'_>,
		credentials: &Credentials,
	) -> Result<RawResponse, TransportError> {
		let request = self.signer.sign(request, input, credentials)?;
		let response = request.send().await?;
		let status = response.status().as_u16();
		let headers = response
			.headers()
			.iter()
			.filter_map(|(name, value)| {
				value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
			})
			.collect();
		let body = response.bytes().await?.to_vec();

		Ok(RawResponse { status, headers, body })
	}
}
#[cfg(feature = "reqwest")]
impl<S> SignedTransport for ReqwestTransport<S>
where
	S: 'static + RequestSigner,
{
	fn signed_get<'a>(
		&'a self,
		credentials: &'a Credentials,
		url: &'a Url,
		form: &'a Form,
	) -> TransportFuture<'a> {
		let request = self.client.get(url.clone()).query(form);

		Box::pin(self.send(request, SigningInput { method: Method::Get, url, form }, credentials))
	}

	fn signed_post<'a>(
		&'a self,
		credentials: &'a Credentials,
		url: &'a Url,
		form: &'a Form,
	) -> TransportFuture<'a> {
		let request = self.client.post(url.clone()).form(form);

		Box::pin(self.send(request, SigningInput { method: Method::Post, url, form }, credentials))
	}
}
