//! Secret-placeholder resolution.
//!
//! Configuration may reference secrets as `${KEY}`. A [`CredentialResolver`] looks keys up in
//! a backend (process environment, secret manager, in-memory map) and
//! [`CredentialDescriptor::resolve`] runs the single resolution pass that turns a descriptor
//! into [`ResolvedCredentials`] before a token exchange.

// self
use crate::{
	_prelude::*, credential::CredentialDescriptor, error::TokenRequestError, secret::Secret,
};

/// Failures reported by a credential backend.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialError {
	/// Backend could not serve the lookup.
	#[error("Credential backend failed for `{key}`: {message}.")]
	Backend {
		/// Key being looked up.
		key: String,
		/// Human-readable failure.
		message: String,
	},
}

/// Lookup contract for secret backends.
pub trait CredentialResolver
where
	Self: Send + Sync,
{
	/// Returns the secret stored under `key`, or `None` when the backend does not know it.
	fn lookup(&self, key: &str) -> Result<Option<String>, CredentialError>;

	/// Resolves one configuration value.
	///
	/// A value of the exact form `${KEY}` is replaced by the looked-up secret; when the backend
	/// does not know the key, the value is returned unchanged. Any other value is returned as is.
	fn resolve(&self, value: &str) -> Result<String, CredentialError> {
		match placeholder_key(value) {
			Some(key) => Ok(self.lookup(key)?.unwrap_or_else(|| value.to_owned())),
			None => Ok(value.to_owned()),
		}
	}
}

/// Extracts `KEY` from a `${KEY}` placeholder.
pub fn placeholder_key(value: &str) -> Option<&str> {
	value.strip_prefix("${")?.strip_suffix('}').filter(|key| !key.is_empty())
}

/// Resolves placeholders from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvCredentialResolver;
impl CredentialResolver for EnvCredentialResolver {
	fn lookup(&self, key: &str) -> Result<Option<String>, CredentialError> {
		match std::env::var(key) {
			Ok(value) => Ok(Some(value)),
			Err(std::env::VarError::NotPresent) => Ok(None),
			Err(e @ std::env::VarError::NotUnicode(_)) =>
				Err(CredentialError::Backend { key: key.to_owned(), message: e.to_string() }),
		}
	}
}

/// Resolves placeholders from an in-memory map.
#[derive(Clone, Default)]
pub struct StaticCredentialResolver(HashMap<String, String>);
impl StaticCredentialResolver {
	/// Adds or replaces one secret.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.0.insert(key.into(), value.into());

		self
	}
}
impl CredentialResolver for StaticCredentialResolver {
	fn lookup(&self, key: &str) -> Result<Option<String>, CredentialError> {
		Ok(self.0.get(key).cloned())
	}
}
impl<K, V> FromIterator<(K, V)> for StaticCredentialResolver
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
	}
}
impl Debug for StaticCredentialResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StaticCredentialResolver")
			.field("keys", &self.0.keys().collect::<BTreeSet<_>>())
			.finish()
	}
}

/// Descriptor values with every placeholder replaced, ready for the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCredentials {
	/// Parsed token endpoint.
	pub token_endpoint: Url,
	/// Client identifier.
	pub client_id: String,
	/// Client secret.
	pub client_secret: Secret,
}

impl CredentialDescriptor {
	/// Runs the resolution pass over the endpoint, client id, and client secret.
	///
	/// Values that are still placeholders afterwards are rejected, since sending them would
	/// only produce an unusable request.
	pub fn resolve(
		&self,
		resolver: &dyn CredentialResolver,
	) -> Result<ResolvedCredentials, TokenRequestError> {
		let resolve_field = |field: &'static str, value: &str| -> Result<String, TokenRequestError> {
			let resolved = resolver
				.resolve(value)
				.map_err(|source| TokenRequestError::Credential { field, source })?;

			if placeholder_key(&resolved).is_some() {
				return Err(TokenRequestError::UnresolvedCredential { field });
			}

			Ok(resolved)
		};
		let endpoint = resolve_field("token_url", &self.token_endpoint)?;
		let token_endpoint = Url::parse(endpoint.trim())
			.map_err(|source| TokenRequestError::InvalidEndpoint { source })?;

		Ok(ResolvedCredentials {
			token_endpoint,
			client_id: resolve_field("client_id", &self.client_id)?,
			client_secret: Secret::new(resolve_field(
				"client_secret",
				self.client_secret.expose(),
			)?),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	struct FailingResolver;
	impl CredentialResolver for FailingResolver {
		fn lookup(&self, key: &str) -> Result<Option<String>, CredentialError> {
			Err(CredentialError::Backend { key: key.into(), message: "vault sealed".into() })
		}
	}

	fn descriptor(endpoint: &str, client_id: &str, secret: &str) -> CredentialDescriptor {
		CredentialDescriptor::builder()
			.token_endpoint(endpoint)
			.client_id(client_id)
			.client_secret(secret)
			.build()
			.expect("Descriptor fixture should build.")
	}

	#[test]
	fn placeholder_key_requires_exact_form() {
		assert_eq!(placeholder_key("${SECRET}"), Some("SECRET"));
		assert_eq!(placeholder_key("${}"), None);
		assert_eq!(placeholder_key("prefix-${SECRET}"), None);
		assert_eq!(placeholder_key("plain"), None);
	}

	#[test]
	fn resolve_replaces_known_keys_and_keeps_unknown_ones() {
		let resolver = StaticCredentialResolver::default().with("SECRET", "s3cr3t");

		assert_eq!(resolver.resolve("${SECRET}").expect("Lookup should succeed."), "s3cr3t");
		assert_eq!(resolver.resolve("${OTHER}").expect("Lookup should succeed."), "${OTHER}");
		assert_eq!(resolver.resolve("literal").expect("Lookup should succeed."), "literal");
	}

	#[test]
	fn descriptor_resolution_produces_wire_values() {
		let resolver: StaticCredentialResolver = [
			("TOKEN_URL", "https://auth.example.com/oauth2/token"),
			("CLIENT_ID", "relay"),
			("CLIENT_SECRET", "s3cr3t"),
		]
		.into_iter()
		.collect();
		let resolved = descriptor("${TOKEN_URL}", "${CLIENT_ID}", "${CLIENT_SECRET}")
			.resolve(&resolver)
			.expect("Every placeholder should resolve.");

		assert_eq!(resolved.token_endpoint.as_str(), "https://auth.example.com/oauth2/token");
		assert_eq!(resolved.client_id, "relay");
		assert_eq!(resolved.client_secret.expose(), "s3cr3t");
	}

	#[test]
	fn unresolved_placeholders_are_rejected() {
		let err = descriptor("https://auth.example.com/token", "relay", "${MISSING}")
			.resolve(&StaticCredentialResolver::default())
			.expect_err("An unresolved secret should not reach the wire.");

		assert!(matches!(err, TokenRequestError::UnresolvedCredential { field: "client_secret" }));

		let err = descriptor("not a url", "relay", "secret")
			.resolve(&StaticCredentialResolver::default())
			.expect_err("A malformed endpoint should be rejected.");

		assert!(matches!(err, TokenRequestError::InvalidEndpoint { .. }));
	}

	#[test]
	fn backend_failures_surface_as_token_request_errors() {
		let err = descriptor("https://auth.example.com/token", "${CLIENT_ID}", "secret")
			.resolve(&FailingResolver)
			.expect_err("Backend failures should propagate.");

		assert!(matches!(err, TokenRequestError::Credential { field: "client_id", .. }));
	}

	#[test]
	fn env_resolver_reports_missing_variables_as_unknown() {
		let resolver = EnvCredentialResolver;

		assert_eq!(
			resolver
				.lookup("OAUTH2_RELAY_TEST_VARIABLE_THAT_DOES_NOT_EXIST")
				.expect("Missing variables should not be an error."),
			None,
		);
	}
}
