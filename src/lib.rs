//! Throttled, self-retrying query dispatcher for signed HTTP APIs.
//!
//! Every [`Client`](client::Client) owns a single dispatcher task. All requests issued through
//! the client pass through that task in order, wait on an optional token bucket, and are
//! transparently re-submitted when the server rejects them with a rate-limit response.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod bucket;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ext;
pub mod http;
pub mod obs;
pub mod query;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BinaryHeap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
