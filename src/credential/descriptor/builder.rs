// self
use crate::{
	_prelude::*,
	credential::{CredentialDescriptor, GrantType},
	error::ConfigError,
	secret::Secret,
};

/// Builder for [`CredentialDescriptor`] values.
#[derive(Debug, Default)]
pub struct CredentialDescriptorBuilder {
	/// Token endpoint URL or placeholder.
	pub token_endpoint: Option<String>,
	/// Client identifier or placeholder.
	pub client_id: Option<String>,
	/// Client secret or placeholder.
	pub client_secret: Option<Secret>,
	/// Scopes to request.
	pub scope: Option<String>,
	/// Exchange timeout override.
	pub request_timeout: Option<Duration>,
	/// Fallback token lifetime override.
	pub default_ttl: Option<Duration>,
}
impl CredentialDescriptorBuilder {
	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.token_endpoint = Some(endpoint.into());

		self
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<Secret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the space-delimited scopes to request.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Overrides the exchange timeout (defaults to 30 seconds).
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Overrides the lifetime assumed when `expires_in` is absent (defaults to one hour).
	pub fn default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = Some(ttl);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<CredentialDescriptor, ConfigError> {
		let descriptor = CredentialDescriptor {
			token_endpoint: self
				.token_endpoint
				.ok_or(ConfigError::MissingField { field: "token_url" })?,
			client_id: self.client_id.ok_or(ConfigError::MissingField { field: "client_id" })?,
			client_secret: self
				.client_secret
				.ok_or(ConfigError::MissingField { field: "client_secret" })?,
			grant_type: GrantType::ClientCredentials,
			scope: self.scope.filter(|scope| !scope.trim().is_empty()),
			request_timeout: self
				.request_timeout
				.unwrap_or(CredentialDescriptor::DEFAULT_REQUEST_TIMEOUT),
			default_ttl: self.default_ttl.unwrap_or(CredentialDescriptor::DEFAULT_TTL),
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}
