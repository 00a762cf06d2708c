//! Cache identity derived from a credential descriptor.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Identity of a cached token: token endpoint, client id, and normalized scope.
///
/// Scopes are split on whitespace, deduplicated, and sorted, so `"b a"` and `"a b"` share one
/// entry. Secrets, timeouts, and TTLs never participate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
	/// Token endpoint exactly as configured (placeholders unresolved).
	pub token_endpoint: String,
	/// Client identifier exactly as configured.
	pub client_id: String,
	/// Normalized scope, or `None` when no scope is requested.
	pub scope: Option<String>,
}
impl CacheKey {
	/// Builds a key from its three components.
	pub fn new(token_endpoint: &str, client_id: &str, scope: Option<&str>) -> Self {
		Self {
			token_endpoint: token_endpoint.to_owned(),
			client_id: client_id.to_owned(),
			scope: scope.and_then(normalize_scope),
		}
	}

	/// Stable, non-reversible identifier safe for log and metric fields.
	///
	/// The value is the URL-safe base64 (no padding) encoding of a SHA-256 digest over the
	/// key components.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.token_endpoint.as_bytes());
		hasher.update([0]);
		hasher.update(self.client_id.as_bytes());
		hasher.update([0]);

		if let Some(scope) = &self.scope {
			hasher.update(scope.as_bytes());
		}

		URL_SAFE_NO_PAD.encode(hasher.finalize())
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"{}:{}:{}",
			self.token_endpoint,
			self.client_id,
			self.scope.as_deref().unwrap_or_default()
		)
	}
}

fn normalize_scope(scope: &str) -> Option<String> {
	let scopes = scope.split_whitespace().collect::<BTreeSet<_>>();

	if scopes.is_empty() {
		return None;
	}

	Some(scopes.into_iter().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::credential::CredentialDescriptor;

	fn descriptor(secret: &str, timeout: Duration, scope: Option<&str>) -> CredentialDescriptor {
		let mut builder = CredentialDescriptor::builder()
			.token_endpoint("https://auth.example.com/token")
			.client_id("relay")
			.client_secret(secret)
			.request_timeout(timeout);

		if let Some(scope) = scope {
			builder = builder.scope(scope);
		}

		builder.build().expect("Descriptor fixture should build.")
	}

	#[test]
	fn key_ignores_secret_and_timeout() {
		let a = descriptor("secret-a", Duration::from_secs(5), Some("read write"));
		let b = descriptor("secret-b", Duration::from_secs(60), Some("read write"));

		assert_eq!(a.cache_key(), b.cache_key());
		assert_eq!(a.cache_key().fingerprint(), b.cache_key().fingerprint());
	}

	#[test]
	fn key_normalizes_scope_order_and_separates_scopes() {
		let a = descriptor("s", Duration::from_secs(5), Some("write  read read"));
		let b = descriptor("s", Duration::from_secs(5), Some("read write"));
		let c = descriptor("s", Duration::from_secs(5), Some("read"));
		let d = descriptor("s", Duration::from_secs(5), None);

		assert_eq!(a.cache_key(), b.cache_key());
		assert_ne!(b.cache_key(), c.cache_key());
		assert_ne!(c.cache_key(), d.cache_key());
		assert_ne!(c.cache_key().fingerprint(), d.cache_key().fingerprint());
	}

	#[test]
	fn display_matches_endpoint_client_scope_triple() {
		let key = CacheKey::new("https://a/token", "relay", Some("mcp:write mcp:read"));

		assert_eq!(key.to_string(), "https://a/token:relay:mcp:read mcp:write");
		assert_eq!(
			CacheKey::new("https://a/token", "relay", None).to_string(),
			"https://a/token:relay:",
		);
	}
}
