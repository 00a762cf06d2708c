//! Immutable token records, lifecycle helpers, and builders.
//!
//! Expiry arithmetic runs on the monotonic clock ([`Instant`]) so wall-clock adjustments never
//! make a cached token look fresher or staler than it is. The wall-clock projection
//! ([`TokenRecord::expires_at_utc`]) is kept for diagnostics only.

// self
use crate::{_prelude::*, secret::Secret};

/// Lifecycle status for a token record relative to an expiry buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is valid beyond the expiry buffer.
	Active,
	/// Token is still valid but falls inside the expiry buffer; it should be refreshed.
	Stale,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no (or an empty) access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no lifetime was configured.
	#[error("Token lifetime must be supplied via expires_in.")]
	MissingExpiry,
	/// Expiry must be strictly after the acquisition instant.
	#[error("Token lifetime must be positive.")]
	NonPositiveLifetime,
	/// Lifetime cannot be represented on the clocks in use.
	#[error("Token lifetime exceeds the supported range.")]
	LifetimeOutOfRange,
}

/// Immutable record describing an issued access token.
///
/// Records are replaced, never mutated, when refreshed.
#[derive(Clone, Debug)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Token type used as the `Authorization` scheme (defaults to `Bearer`).
	pub token_type: String,
	/// Scope granted by the token endpoint, or the requested scope when not echoed.
	pub scope: Option<String>,
	/// Monotonic instant at which the exchange completed.
	pub acquired_at: Instant,
	/// Wall-clock instant matching `acquired_at`.
	pub issued_at: OffsetDateTime,
	/// Monotonic expiry instant; always strictly after `acquired_at`.
	pub expires_at: Instant,
	/// Wall-clock projection of `expires_at`.
	pub expires_at_utc: OffsetDateTime,
}
impl TokenRecord {
	/// Token type assumed when the token endpoint omits `token_type`.
	pub const DEFAULT_TOKEN_TYPE: &'static str = "Bearer";

	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Computes the lifecycle status at `now`, treating tokens inside `buffer` as stale.
	pub fn status_at(&self, now: Instant, buffer: Duration) -> TokenStatus {
		if now >= self.expires_at {
			return TokenStatus::Expired;
		}

		match now.checked_add(buffer) {
			Some(horizon) if horizon < self.expires_at => TokenStatus::Active,
			_ => TokenStatus::Stale,
		}
	}

	/// Returns `true` when the token is expired or inside the expiry buffer at `now`.
	pub fn is_expired_at(&self, now: Instant, buffer: Duration) -> bool {
		!matches!(self.status_at(now, buffer), TokenStatus::Active)
	}

	/// Buffer-aware expiry check against the current monotonic clock.
	pub fn is_expired(&self, buffer: Duration) -> bool {
		self.is_expired_at(Instant::now(), buffer)
	}

	/// Remaining lifetime at `now`, saturating at zero.
	pub fn remaining_at(&self, now: Instant) -> Duration {
		self.expires_at.saturating_duration_since(now)
	}

	/// Value for the `Authorization` header: `<token_type> <access_token>`.
	pub fn authorization_value(&self) -> String {
		format!("{} {}", self.token_type, self.access_token.expose())
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<Secret>,
	token_type: Option<String>,
	scope: Option<String>,
	acquired_at: Option<Instant>,
	issued_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Sets the token type; blank values fall back to `Bearer`.
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the granted scope.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the monotonic acquisition instant (defaults to now).
	pub fn acquired_at(mut self, instant: Instant) -> Self {
		self.acquired_at = Some(instant);

		self
	}

	/// Sets the wall-clock acquisition instant (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets the lifetime relative to the acquisition instant.
	pub fn expires_in(mut self, lifetime: Duration) -> Self {
		self.expires_in = Some(lifetime);

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_blank())
			.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let lifetime = self.expires_in.ok_or(TokenRecordBuilderError::MissingExpiry)?;

		if lifetime.is_zero() {
			return Err(TokenRecordBuilderError::NonPositiveLifetime);
		}

		let acquired_at = self.acquired_at.unwrap_or_else(Instant::now);
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = acquired_at
			.checked_add(lifetime)
			.ok_or(TokenRecordBuilderError::LifetimeOutOfRange)?;
		// Diagnostic projection only; clamps at the calendar limit.
		let expires_at_utc = issued_at
			.saturating_add(time::Duration::try_from(lifetime).unwrap_or(time::Duration::MAX));
		let token_type = self
			.token_type
			.filter(|value| !value.trim().is_empty())
			.unwrap_or_else(|| TokenRecord::DEFAULT_TOKEN_TYPE.to_owned());

		Ok(TokenRecord {
			access_token,
			token_type,
			scope: self.scope,
			acquired_at,
			issued_at,
			expires_at,
			expires_at_utc,
		})
	}
}
