//! Single-call execution: signed transport calls, response classification, and decoding.

pub mod api_error;
pub mod classify;
pub mod executor;

pub use api_error::*;
pub use classify::*;
pub use executor::*;
