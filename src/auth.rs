//! Credential types handed to the signing transport on every call.

pub mod secret;

pub use secret::*;

// self
use crate::_prelude::*;

/// Application-level credentials issued by the API provider (consumer key + secret).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsumerCredentials {
	/// Consumer key identifying the application.
	pub key: String,
	/// Consumer secret paired with the key.
	pub secret: Secret,
}
impl ConsumerCredentials {
	/// Creates a consumer credential pair.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { key: key.into(), secret: Secret::new(secret) }
	}
}

/// User-level credentials (access token + secret) bound to a single client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessCredentials {
	/// Access token.
	pub token: Secret,
	/// Access token secret.
	pub secret: Secret,
}
impl AccessCredentials {
	/// Creates an access credential pair.
	pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { token: Secret::new(token), secret: Secret::new(secret) }
	}
}

/// Full signing material passed to [`SignedTransport`](crate::http::SignedTransport) calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// Application credentials shared by every client built from the same config.
	pub consumer: ConsumerCredentials,
	/// Credentials of the user this client acts for.
	pub access: AccessCredentials,
}
impl Credentials {
	/// Combines consumer and access credentials.
	pub fn new(consumer: ConsumerCredentials, access: AccessCredentials) -> Self {
		Self { consumer, access }
	}
}
