//! Credential strings that stay out of logs and are wiped when dropped.

// crates.io
use zeroize::{Zeroize, ZeroizeOnDrop};
// self
use crate::_prelude::*;

/// Consumer or access secret.
///
/// Formatting never reveals the value, and the backing buffer is zeroed on drop so rotated
/// credentials (see [`Client::set_credentials`](crate::client::Client::set_credentials)) do
/// not linger in memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps a credential string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw value for signing. Never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when no credential was supplied.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.is_empty() {
			true => f.write_str("Secret(<empty>)"),
			false => f.write_str("Secret(<redacted>)"),
		}
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatting_hides_the_value_but_flags_missing_credentials() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(<redacted>)");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "super-secret");
		assert_eq!(format!("{:?}", Secret::new("")), "Secret(<empty>)");
	}

	#[test]
	fn zeroize_wipes_the_value() {
		let mut secret = Secret::new("rotated-away");

		secret.zeroize();

		assert!(secret.is_empty());
	}

	#[test]
	fn serializes_as_a_bare_string() {
		let secret: Secret =
			serde_json::from_str("\"token\"").expect("Secret should deserialize from a string.");

		assert_eq!(secret.expose(), "token");
		assert_eq!(serde_json::to_string(&secret).expect("Secret should serialize."), "\"token\"");
	}
}
