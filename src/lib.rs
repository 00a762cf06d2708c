//! Service-to-service OAuth 2.0 credentials for outbound calls: a client-credentials token cache
//! with refresh-stampede protection, plus a deterministic pipeline that composes the resulting
//! `Authorization` header with filtered user cookies and static metadata.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod acquirer;
pub mod config;
pub mod cookie;
pub mod credential;
pub mod error;
pub mod headers;
pub mod http;
pub mod obs;
pub mod secret;
pub mod store;
pub mod token;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::{Duration, Instant},
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
