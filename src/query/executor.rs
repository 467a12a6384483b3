//! One signed call per invocation, with status classification and JSON decoding.

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	http::{Form, Method, SignedTransport},
	query::ApiError,
};

/// HTTP status treated as success.
pub const STATUS_OK: u16 = 200;

/// Performs a single signed call and sorts the response into success or [`Error`].
///
/// The executor never retries: transport failures, unsupported methods, and non-200
/// responses are all returned to the caller, which decides whether a rejection is worth
/// another attempt.
pub struct QueryExecutor<T>
where
	T: ?Sized + SignedTransport,
{
	transport: Arc<T>,
}
impl<T> QueryExecutor<T>
where
	T: ?Sized + SignedTransport,
{
	/// Wraps a shared transport.
	pub fn new(transport: impl Into<Arc<T>>) -> Self {
		Self { transport: transport.into() }
	}

	/// Executes one call and returns the body of a 200 response.
	///
	/// Non-200 responses become [`Error::Api`]; methods other than GET and POST fail with
	/// [`Error::UnsupportedMethod`] before the transport is touched.
	pub async fn execute(
		&self,
		credentials: &Credentials,
		method: Method,
		url: &Url,
		form: &Form,
	) -> Result<Vec<u8>> {
		let response = match method {
			Method::Get => self.transport.signed_get(credentials, url, form).await?,
			Method::Post => self.transport.signed_post(credentials, url, form).await?,
			method => return Err(Error::UnsupportedMethod { method }),
		};

		if response.status != STATUS_OK {
			return Err(ApiError::from_response(&response, OffsetDateTime::now_utc()).into());
		}

		Ok(response.body)
	}
}
impl<T> Clone for QueryExecutor<T>
where
	T: ?Sized + SignedTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone() }
	}
}
impl<T> Debug for QueryExecutor<T>
where
	T: ?Sized + SignedTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("QueryExecutor(..)")
	}
}

/// Decodes a 200 response body into `R`, reporting the failing JSON path on error.
pub fn decode_body<R>(body: &[u8]) -> Result<R>
where
	R: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { status: STATUS_OK, source })
}
