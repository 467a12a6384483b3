//! Request signing contracts that attach client credentials to outbound reqwest requests.

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	http::{Form, Method},
};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

/// Request attributes a signer may need to compute a signature.
#[derive(Clone, Copy, Debug)]
pub struct SigningInput<'a> {
	/// HTTP method of the request being signed.
	pub method: Method,
	/// Target URL without the form-encoded query string.
	pub url: &'a Url,
	/// Form parameters included in the signature base.
	pub form: &'a Form,
}

/// Attaches authorization state derived from [`Credentials`] to a request.
///
/// Implementations receive the fully built request alongside the [`SigningInput`] it was
/// built from, so schemes that sign the method, URL, and parameters can do so without
/// re-parsing the request.
#[cfg(feature = "reqwest")]
pub trait RequestSigner
where
	Self: Send + Sync,
{
	/// Decorates `request` with credentials, or fails with [`TransportError::Signing`].
	fn sign(
		&self,
		request: reqwest::RequestBuilder,
		input: SigningInput<'_>,
		credentials: &Credentials,
	) -> Result<reqwest::RequestBuilder, TransportError>;
}

/// Signer that sends the access token as an `Authorization: Bearer` header.
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
#[cfg(feature = "reqwest")]
impl RequestSigner for BearerSigner {
	fn sign(
		&self,
		request: reqwest::RequestBuilder,
		_input: SigningInput<'_>,
		credentials: &Credentials,
	) -> Result<reqwest::RequestBuilder, TransportError> {
		let token = &credentials.access.token;

		if token.is_empty() {
			return Err(TransportError::signing("access token is empty"));
		}

		Ok(request.bearer_auth(token.expose()))
	}
}
