//! Public extension contracts for the reqwest-backed transport.
//!
//! Signing protocols differ between API providers, so [`ReqwestTransport`](crate::http::ReqwestTransport)
//! delegates credential attachment to a [`RequestSigner`] instead of hard-coding one scheme.

pub mod request_signer;

pub use request_signer::*;
