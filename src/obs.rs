//! Optional observability helpers for relay operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_relay.operation` with the
//!   `operation`, `stage`, and `key` (cache-key fingerprint) fields, plus debug events for cache hits, coalesced refreshes,
//!   acquisitions, and cache clears.
//! - Enable `metrics` to increment the `oauth2_relay_operation_total` counter for every
//!   attempt/hit/success/failure, labeled by `operation` + `outcome`, and to record token
//!   endpoint latency in the `oauth2_relay_exchange_duration_seconds` histogram.
//!
//! Events identify cache entries by [`CacheKey::fingerprint`](crate::credential::CacheKey::fingerprint)
//! and never carry secrets or tokens.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Relay operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Cache lookup through [`TokenStore`](crate::store::TokenStore).
	GetToken,
	/// Credential exchange with the token endpoint.
	Acquire,
	/// Outbound header composition.
	Compose,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::GetToken => "get_token",
			Operation::Acquire => "acquire",
			Operation::Compose => "compose",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a relay operation.
	Attempt,
	/// Served from the cache without a network exchange.
	Hit,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Hit => "hit",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits a `tracing` debug event when the feature is enabled; expands to nothing otherwise.
macro_rules! debug_event {
	($($arg:tt)*) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::debug!($($arg)*);
		}
	};
}
pub(crate) use debug_event;
