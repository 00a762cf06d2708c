// self
use crate::{
	_prelude::*,
	config::AuthProfile,
	headers::{HeaderComposer, HeaderRequest, HeaderSet},
};

/// Boxed future returned by [`HeaderProvider::headers`].
pub type HeaderFuture<'a> = Pin<Box<dyn Future<Output = Result<HeaderSet>> + 'a + Send>>;

/// Capability that supplies outbound headers for one downstream target.
///
/// Outbound clients depend on this trait instead of the relay's internals; production wiring
/// uses [`ProfileHeaderProvider`] and tests can use [`StaticHeaderProvider`] or their own stub.
pub trait HeaderProvider
where
	Self: Send + Sync,
{
	/// Produces the headers for a request made on behalf of `context`.
	fn headers<'a>(&'a self, context: &'a RequestContext) -> HeaderFuture<'a>;
}

/// Caller-side context forwarded to a [`HeaderProvider`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	/// Raw `Cookie` header of the inbound user request, if any.
	pub cookies: Option<String>,
}
impl RequestContext {
	/// Context carrying the inbound `Cookie` header.
	pub fn with_cookies(cookies: impl Into<String>) -> Self {
		Self { cookies: Some(cookies.into()) }
	}
}

/// [`HeaderProvider`] that composes headers from an [`AuthProfile`].
///
/// Cookies are forwarded only when the profile carries an enabled `cookie_passthrough` rule.
#[derive(Clone, Debug)]
pub struct ProfileHeaderProvider {
	composer: HeaderComposer,
	profile: AuthProfile,
}
impl ProfileHeaderProvider {
	/// Binds `profile` to `composer`.
	pub fn new(composer: HeaderComposer, profile: AuthProfile) -> Self {
		Self { composer, profile }
	}

	/// Profile driving composition.
	pub fn profile(&self) -> &AuthProfile {
		&self.profile
	}
}
impl HeaderProvider for ProfileHeaderProvider {
	fn headers<'a>(&'a self, context: &'a RequestContext) -> HeaderFuture<'a> {
		Box::pin(async move {
			let mut request = HeaderRequest::new();

			if let Some(descriptor) = self.profile.oauth2.as_ref() {
				request = request.with_credential(descriptor);
			}
			if let Some(static_headers) = self.profile.static_headers.as_ref() {
				request = request.with_static_headers(static_headers);
			}
			if let (Some(rule), Some(cookies)) =
				(self.profile.cookie_rule(), context.cookies.as_deref())
			{
				request = request.with_cookies(cookies).with_cookie_rule(rule);
			}

			self.composer.compose(request).await
		})
	}
}

/// [`HeaderProvider`] that always returns the same headers.
#[derive(Clone, Debug, Default)]
pub struct StaticHeaderProvider(pub HeaderSet);
impl HeaderProvider for StaticHeaderProvider {
	fn headers<'a>(&'a self, _: &'a RequestContext) -> HeaderFuture<'a> {
		let headers = self.0.clone();

		Box::pin(async move { Ok(headers) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		acquirer::{AcquireFuture, TokenAcquirer},
		cookie::CookieFilterRule,
		credential::CredentialDescriptor,
		store::TokenStore,
		token::TokenRecord,
	};

	struct FixedAcquirer;
	impl TokenAcquirer for FixedAcquirer {
		fn acquire<'a>(&'a self, _: &'a CredentialDescriptor) -> AcquireFuture<'a> {
			Box::pin(async {
				Ok(TokenRecord::builder()
					.access_token("T")
					.expires_in(Duration::from_secs(3_600))
					.build()
					.expect("Test token record should build."))
			})
		}
	}

	fn composer() -> HeaderComposer {
		HeaderComposer::new(TokenStore::new(Arc::new(FixedAcquirer)))
	}

	fn profile(cookie_passthrough: Option<CookieFilterRule>) -> AuthProfile {
		AuthProfile {
			oauth2: Some(
				CredentialDescriptor::builder()
					.token_endpoint("https://auth.example.com/token")
					.client_id("relay")
					.client_secret("secret")
					.build()
					.expect("Descriptor fixture should build."),
			),
			cookie_passthrough,
			static_headers: Some(HeaderSet::new().with("X-Team", "core")),
		}
	}

	#[tokio::test]
	async fn profile_provider_forwards_cookies_only_when_enabled() {
		let context = RequestContext::with_cookies("app_sid=1; other=2");
		let enabled =
			ProfileHeaderProvider::new(composer(), profile(Some(CookieFilterRule::prefix("app_"))));
		let headers = enabled.headers(&context).await.expect("Composition should succeed.");

		assert_eq!(headers.get("Cookie"), Some("app_sid=1"));
		assert_eq!(headers.get("Authorization"), Some("Bearer T"));
		assert_eq!(headers.get("X-Team"), Some("core"));

		let disabled = ProfileHeaderProvider::new(
			composer(),
			profile(Some(CookieFilterRule::PASS_THROUGH.with_enabled(false))),
		);
		let headers = disabled.headers(&context).await.expect("Composition should succeed.");

		assert!(!headers.contains("Cookie"));

		let absent = ProfileHeaderProvider::new(composer(), profile(None));
		let headers = absent.headers(&context).await.expect("Composition should succeed.");

		assert!(!headers.contains("Cookie"));
	}

	#[tokio::test]
	async fn static_provider_is_a_drop_in_stub() {
		let provider: Box<dyn HeaderProvider> =
			Box::new(StaticHeaderProvider(HeaderSet::new().with("Authorization", "Bearer stub")));
		let headers = provider
			.headers(&RequestContext::default())
			.await
			.expect("Static providers never fail.");

		assert_eq!(headers.get("authorization"), Some("Bearer stub"));
	}
}
