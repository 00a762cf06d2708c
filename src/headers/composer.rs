// self
use crate::{
	_prelude::*,
	cookie::{self, CookieFilterRule},
	credential::CredentialDescriptor,
	headers::HeaderSet,
	obs::{self, Operation, OperationSpan, Outcome},
	store::TokenStore,
};

/// Inputs for one [`HeaderComposer::compose`] call; every source is optional.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderRequest<'a> {
	/// Descriptor whose token becomes the `Authorization` header.
	pub credential: Option<&'a CredentialDescriptor>,
	/// Raw `Cookie` header received from the caller.
	pub cookies: Option<&'a str>,
	/// Rule applied to `cookies`; forwards everything when absent.
	pub cookie_rule: Option<&'a CookieFilterRule>,
	/// Static headers from configuration.
	pub static_headers: Option<&'a HeaderSet>,
}
impl<'a> HeaderRequest<'a> {
	/// Creates a request with no sources.
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests an `Authorization` header for `descriptor`.
	pub fn with_credential(mut self, descriptor: &'a CredentialDescriptor) -> Self {
		self.credential = Some(descriptor);

		self
	}

	/// Supplies the raw `Cookie` header to filter.
	pub fn with_cookies(mut self, raw: &'a str) -> Self {
		self.cookies = Some(raw);

		self
	}

	/// Supplies the cookie filter rule.
	pub fn with_cookie_rule(mut self, rule: &'a CookieFilterRule) -> Self {
		self.cookie_rule = Some(rule);

		self
	}

	/// Supplies static headers.
	pub fn with_static_headers(mut self, headers: &'a HeaderSet) -> Self {
		self.static_headers = Some(headers);

		self
	}
}

/// Merges base, static, cookie, and authorization headers into one [`HeaderSet`].
///
/// Composition is fail-closed: when a credential is requested and the token cannot be
/// obtained, the error is returned and no headers are produced.
#[derive(Clone, Debug)]
pub struct HeaderComposer {
	store: TokenStore,
	base: HeaderSet,
}
impl HeaderComposer {
	/// Creates a composer backed by `store` with [`HeaderSet::base`] as base headers.
	pub fn new(store: TokenStore) -> Self {
		Self { store, base: HeaderSet::base() }
	}

	/// Replaces the base headers.
	pub fn with_base_headers(mut self, base: HeaderSet) -> Self {
		self.base = base;

		self
	}

	/// Token store used for `Authorization` headers.
	pub fn store(&self) -> &TokenStore {
		&self.store
	}

	/// Composes the outbound headers for `request`.
	pub async fn compose(&self, request: HeaderRequest<'_>) -> Result<HeaderSet> {
		const OPERATION: Operation = Operation::Compose;

		let mut span = OperationSpan::new(OPERATION, "compose");

		if let Some(descriptor) = request.credential {
			span = span.with_key(&descriptor.cache_key());
		}

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result = span.instrument(self.compose_inner(request)).await;

		match &result {
			Ok(_) => obs::record_outcome(OPERATION, Outcome::Success),
			Err(_) => obs::record_outcome(OPERATION, Outcome::Failure),
		}

		result
	}

	async fn compose_inner(&self, request: HeaderRequest<'_>) -> Result<HeaderSet> {
		let authorization = match request.credential {
			Some(descriptor) => {
				let record = self.store.get_record(descriptor).await?;

				Some(record.authorization_value())
			},
			None => None,
		};
		let cookie_header = request.cookies.and_then(|raw| match request.cookie_rule {
			Some(rule) => cookie::filter_cookies(raw, rule),
			None => cookie::filter_cookies(raw, &CookieFilterRule::PASS_THROUGH),
		});
		let mut headers = self.base.clone();

		if let Some(static_headers) = request.static_headers {
			headers.merge(static_headers);
		}
		if let Some(cookie_header) = cookie_header {
			headers.insert("Cookie", cookie_header);
		}
		if let Some(authorization) = authorization {
			headers.insert("Authorization", authorization);
		}

		Ok(headers)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		acquirer::{AcquireFuture, TokenAcquirer},
		error::InvalidTokenResponseError,
		token::TokenRecord,
	};

	#[derive(Default)]
	struct FixedAcquirer(AtomicUsize);
	impl TokenAcquirer for FixedAcquirer {
		fn acquire<'a>(&'a self, _: &'a CredentialDescriptor) -> AcquireFuture<'a> {
			Box::pin(async move {
				self.0.fetch_add(1, Ordering::SeqCst);

				Ok(TokenRecord::builder()
					.access_token("T")
					.expires_in(Duration::from_secs(3_600))
					.build()
					.expect("Test token record should build."))
			})
		}
	}

	struct BrokenAcquirer;
	impl TokenAcquirer for BrokenAcquirer {
		fn acquire<'a>(&'a self, _: &'a CredentialDescriptor) -> AcquireFuture<'a> {
			Box::pin(async { Err(InvalidTokenResponseError::MissingAccessToken.into()) })
		}
	}

	fn descriptor() -> CredentialDescriptor {
		CredentialDescriptor::builder()
			.token_endpoint("https://auth.example.com/token")
			.client_id("relay")
			.client_secret("secret")
			.build()
			.expect("Descriptor fixture should build.")
	}

	#[tokio::test]
	async fn sources_merge_in_precedence_order() {
		let composer = HeaderComposer::new(TokenStore::new(Arc::new(FixedAcquirer::default())));
		let descriptor = descriptor();
		let static_headers = HeaderSet::new()
			.with("accept", "application/xml")
			.with("X-Team", "core")
			.with("Authorization", "Basic overridden");
		let rule = CookieFilterRule::names(["s"]);
		let headers = composer
			.compose(
				HeaderRequest::new()
					.with_credential(&descriptor)
					.with_cookies("s=1; tracking=2")
					.with_cookie_rule(&rule)
					.with_static_headers(&static_headers),
			)
			.await
			.expect("Composition should succeed.");

		assert_eq!(headers.get("Accept"), Some("application/xml"));
		assert_eq!(headers.get("X-Team"), Some("core"));
		assert_eq!(headers.get("Cookie"), Some("s=1"));
		assert_eq!(headers.get("Authorization"), Some("Bearer T"));
		assert_eq!(headers.len(), 5);
	}

	#[tokio::test]
	async fn absent_sources_leave_only_base_headers() {
		let acquirer = Arc::new(FixedAcquirer::default());
		let composer = HeaderComposer::new(TokenStore::new(acquirer.clone()))
			.with_base_headers(HeaderSet::new().with("User-Agent", "tests"));
		let rule = CookieFilterRule::names(["q"]);
		let headers = composer
			.compose(HeaderRequest::new().with_cookies("z=9").with_cookie_rule(&rule))
			.await
			.expect("Composition without credentials should succeed.");

		assert_eq!(headers, HeaderSet::new().with("User-Agent", "tests"));
		assert_eq!(acquirer.0.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn missing_rule_forwards_cookies_unchanged() {
		let composer = HeaderComposer::new(TokenStore::new(Arc::new(FixedAcquirer::default())));
		let headers = composer
			.compose(HeaderRequest::new().with_cookies("a=1; b=2"))
			.await
			.expect("Composition should succeed.");

		assert_eq!(headers.get("cookie"), Some("a=1; b=2"));
	}

	#[tokio::test]
	async fn acquisition_failure_aborts_composition() {
		let composer = HeaderComposer::new(TokenStore::new(Arc::new(BrokenAcquirer)));
		let descriptor = descriptor();
		let err = composer
			.compose(HeaderRequest::new().with_credential(&descriptor).with_cookies("s=1"))
			.await
			.expect_err("Composition must fail closed.");

		assert!(matches!(
			err,
			Error::InvalidTokenResponse(InvalidTokenResponseError::MissingAccessToken)
		));
	}
}
