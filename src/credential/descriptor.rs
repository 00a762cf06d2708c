//! Client-credentials descriptor shared by the acquirer and the token store.
//!
//! A descriptor is immutable once built. Its endpoint, client id, and secret may still hold
//! `${KEY}` placeholders; those are only resolved right before a token exchange.

/// Builder API for assembling credential descriptors.
pub mod builder;
/// Grant identifiers carried by descriptors.
pub mod grant;

pub use builder::*;
pub use grant::*;

// self
use crate::{_prelude::*, credential::CacheKey, error::ConfigError, secret::Secret};

/// Immutable OAuth 2.0 client-credentials configuration for one token endpoint.
///
/// Field names on the wire follow the configuration schema (`token_url`, `timeout`,
/// `token_cache_ttl`); durations are expressed in seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialDescriptor {
	/// Token endpoint URL or a `${KEY}` placeholder resolving to one.
	#[serde(rename = "token_url")]
	pub token_endpoint: String,
	/// OAuth 2.0 client identifier or a placeholder.
	pub client_id: String,
	/// Client secret or a placeholder.
	pub client_secret: Secret,
	/// Grant used for the exchange.
	#[serde(default)]
	pub grant_type: GrantType,
	/// Space-delimited scopes to request.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Upper bound for one HTTP exchange with the token endpoint.
	#[serde(rename = "timeout", default = "default_request_timeout", with = "float_secs")]
	pub request_timeout: Duration,
	/// Token lifetime assumed when the response omits `expires_in`.
	#[serde(rename = "token_cache_ttl", default = "default_ttl", with = "whole_secs")]
	pub default_ttl: Duration,
}
impl CredentialDescriptor {
	/// Default bound for one token exchange.
	pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
	/// Default lifetime when the token endpoint omits `expires_in`.
	pub const DEFAULT_TTL: Duration = Duration::from_secs(3_600);

	/// Creates an empty builder.
	pub fn builder() -> CredentialDescriptorBuilder {
		CredentialDescriptorBuilder::default()
	}

	/// Cache identity for this descriptor; secrets and timeouts do not participate.
	pub fn cache_key(&self) -> CacheKey {
		CacheKey::new(&self.token_endpoint, &self.client_id, self.scope.as_deref())
	}

	/// Checks that every required field is present and durations are positive.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.token_endpoint.trim().is_empty() {
			return Err(ConfigError::MissingField { field: "token_url" });
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingField { field: "client_id" });
		}
		if self.client_secret.is_blank() {
			return Err(ConfigError::MissingField { field: "client_secret" });
		}
		if self.request_timeout.is_zero() {
			return Err(ConfigError::NonPositiveDuration { field: "timeout" });
		}
		if self.default_ttl.is_zero() {
			return Err(ConfigError::NonPositiveDuration { field: "token_cache_ttl" });
		}

		Ok(())
	}
}

fn default_request_timeout() -> Duration {
	CredentialDescriptor::DEFAULT_REQUEST_TIMEOUT
}

fn default_ttl() -> Duration {
	CredentialDescriptor::DEFAULT_TTL
}

mod float_secs {
	// crates.io
	use serde::{Deserializer, Serializer, de::Error as DeError};
	// self
	use crate::_prelude::*;

	pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_f64(value.as_secs_f64())
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = f64::deserialize(deserializer)?;

		Duration::try_from_secs_f64(secs).map_err(DeError::custom)
	}
}

mod whole_secs {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(value.as_secs())
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(Duration::from_secs)
	}
}
